use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::color::ColorString;
use crate::error::{BuckifyError, Result};

/// Marker opening the serial test block.
pub const TESTS_MARKER: &str = "TESTS =";
/// Marker opening the block of tests run with parallel semantics.
pub const PARALLEL_TESTS_MARKER: &str = "PARALLEL_TEST =";

const CONTINUATION: char = '\\';

/// Make directives that can directly follow a test block.
const MAKE_KEYWORDS: &[&str] = &["else", "endif", "ifdef", "ifeq", "ifndef", "ifneq"];

/// Test names declared in the Makefile with their parallel flag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestRegistry {
    tests: BTreeMap<String, bool>,
}

impl TestRegistry {
    pub fn parse(content: &str) -> Self {
        let mut tests = BTreeMap::new();

        for name in scan_block(content, TESTS_MARKER) {
            tests.insert(name, false);
        }
        // Parallel block runs second so its flag wins for names in both blocks.
        for name in scan_block(content, PARALLEL_TESTS_MARKER) {
            tests.insert(name, true);
        }

        Self { tests }
    }

    /// `Some(is_parallel)` for a registered test
    pub fn get(&self, name: &str) -> Option<bool> {
        self.tests.get(name).copied()
    }

    /// Tests in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.tests.iter().map(|(name, parallel)| (name.as_str(), *parallel))
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

/// Names from the continuation block that follows `marker`.
fn scan_block(content: &str, marker: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut lines = content
        .lines()
        .map(str::trim)
        .skip_while(|line| !line.starts_with(marker));

    if lines.next().is_none() {
        debug!("no '{}' block found", marker);
        return names;
    }

    for line in lines {
        match line.strip_suffix(CONTINUATION) {
            Some(name) => {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                if name.contains('=') {
                    // Another assignment started without a blank line.
                    break;
                }
                if !is_bare_name(name) {
                    let message = format!("Ignoring '{}' in the {} block", name, marker);
                    debug!("{}", message);
                    println!("{}", ColorString::warning(&message));
                    continue;
                }
                names.push(name.to_string());
            }
            None => {
                if is_bare_name(line) {
                    names.push(line.to_string());
                }
                break;
            }
        }
    }

    names
}

fn is_bare_name(line: &str) -> bool {
    !line.is_empty()
        && !MAKE_KEYWORDS.contains(&line)
        && !line
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '=' | ':' | '#' | '$'))
}

pub fn parse_tests(path: &Path) -> Result<TestRegistry> {
    let content = fs::read_to_string(path).map_err(|source| BuckifyError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let registry = TestRegistry::parse(&content);
    debug!("found {} tests in {}", registry.len(), path.display());
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAKEFILE: &str = "\
# Makefile for RocksDB

TESTS = \\
\tdb_basic_test \\
\tdb_test \\
\tenv_basic_test \\

PARALLEL_TEST = \\
\tdb_test \\

# the rest of the Makefile
all: $(LIBRARY)
";

    #[test]
    fn test_parallel_block_wins() {
        let registry = TestRegistry::parse(
            "TESTS = \n  foo_test \\\n  bar_test\nPARALLEL_TEST = \n  bar_test\n",
        );
        assert_eq!(registry.get("foo_test"), Some(false));
        assert_eq!(registry.get("bar_test"), Some(true));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_blocks_terminated_by_blank_line() {
        let registry = TestRegistry::parse(MAKEFILE);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("db_basic_test"), Some(false));
        assert_eq!(registry.get("db_test"), Some(true));
        assert_eq!(registry.get("env_basic_test"), Some(false));
        assert_eq!(registry.get("all"), None);
    }

    #[test]
    fn test_iter_is_sorted() {
        let registry = TestRegistry::parse("TESTS = \\\n  zeta_test \\\n  alpha_test \\\n\n");
        let names: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["alpha_test", "zeta_test"]);
    }

    #[test]
    fn test_block_stops_at_next_assignment() {
        let registry =
            TestRegistry::parse("TESTS = \\\n  a_test \\\nPARALLEL_TEST = \\\n  b_test \\\n\n");
        assert_eq!(registry.get("a_test"), Some(false));
        assert_eq!(registry.get("b_test"), Some(true));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_variable_references_are_skipped() {
        let registry = TestRegistry::parse(
            "TESTS = \\\n\ta_test \\\n\t$(EXTRA_TESTS) \\\n\tb_test \\\n\tc_test \\\n\n",
        );
        let names: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["a_test", "b_test", "c_test"]);
    }

    #[test]
    fn test_make_keywords_end_block_without_registering() {
        let registry = TestRegistry::parse(
            "ifdef ROCKSDB_LITE\nTESTS = \\\n\ta_test \\\nendif\nPARALLEL_TEST = \\\n\tb_test \\\nelse\n",
        );
        let names: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["a_test", "b_test"]);
        assert_eq!(registry.get("endif"), None);
        assert_eq!(registry.get("else"), None);
    }

    #[test]
    fn test_missing_markers() {
        let registry = TestRegistry::parse("all:\n\tmake\n");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_parse_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_tests(&dir.path().join("Makefile")).unwrap_err();
        assert!(matches!(err, BuckifyError::Read { .. }));
    }
}
