use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{BuckifyError, Result};
use crate::targets_cfg;

const LIST_INDENT: usize = 8;

/// Accumulates TARGETS declarations in the order they are added.
///
/// Libraries and binaries are rendered as they are added. Tests are buffered
/// by [`register_test`](Self::register_test) and rendered as exactly one
/// table at the end of the document; [`flush_tests`](Self::flush_tests)
/// closes that table.
#[derive(Debug)]
pub struct TargetsBuilder {
    document: String,
    tests_cfg: String,
    tests_flushed: bool,
    pub total_lib: usize,
    pub total_bin: usize,
    pub total_test: usize,
}

impl TargetsBuilder {
    pub fn new() -> Self {
        Self {
            document: targets_cfg::TARGETS_HEADER.to_string(),
            tests_cfg: String::new(),
            tests_flushed: false,
            total_lib: 0,
            total_bin: 0,
            total_test: 0,
        }
    }

    pub fn add_library(&mut self, name: &str, srcs: &[String], deps: &[String]) {
        self.document.push_str(&targets_cfg::library_block(
            &escape(name),
            &pretty_list(srcs, LIST_INDENT),
            &pretty_list(deps, LIST_INDENT),
        ));
        self.total_lib += 1;
    }

    pub fn add_binary(&mut self, name: &str, srcs: &[String], deps: &[String]) {
        self.document.push_str(&targets_cfg::binary_block(
            &escape(name),
            &pretty_list(srcs, LIST_INDENT),
            &pretty_list(deps, LIST_INDENT),
        ));
        self.total_bin += 1;
    }

    pub fn register_test(
        &mut self,
        test_name: &str,
        src: &str,
        is_parallel: bool,
        extra_deps: &[String],
        extra_compiler_flags: &[String],
    ) {
        if self.tests_flushed {
            warn!("test '{}' registered after the test table was flushed, ignoring", test_name);
            return;
        }
        let exec_mode = if is_parallel { "parallel" } else { "serial" };
        self.tests_cfg.push_str(&targets_cfg::test_row(
            &escape(test_name),
            &escape(src),
            exec_mode,
            &inline_list(extra_deps),
            &inline_list(extra_compiler_flags),
        ));
        self.total_test += 1;
    }

    /// Closes the test table. Calling it again changes nothing.
    pub fn flush_tests(&mut self) {
        self.tests_flushed = true;
    }

    /// Full document text, the test table included.
    pub fn render(&self) -> String {
        let mut text = self.document.clone();
        text.push_str(&targets_cfg::unittests_block(&self.tests_cfg));
        text
    }

    /// Writes the document to `path`, replacing any existing file.
    ///
    /// The content goes to a temporary file next to `path` first, so a
    /// failed write never leaves a truncated TARGETS behind.
    pub fn write(&self, path: &Path) -> Result<()> {
        let write_err = |source| BuckifyError::Write {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(self.render().as_bytes()).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl Default for TargetsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Sorted string list for `srcs`/`deps`: one item inline, several items one
/// per line.
fn pretty_list(items: &[String], indent: usize) -> String {
    let mut sorted: Vec<String> = items.iter().map(|item| escape(item)).collect();
    sorted.sort();

    match sorted.as_slice() {
        [] => String::new(),
        [single] => format!("\"{}\"", single),
        _ => {
            let pad = " ".repeat(indent);
            let separator = format!("\",\n{}\"", pad);
            format!(
                "\n{}\"{}\",\n{}",
                pad,
                sorted.join(&separator),
                " ".repeat(indent.saturating_sub(4))
            )
        }
    }
}

/// `["a", "b"]` in argument order.
fn inline_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("\"{}\"", escape(item))).collect();
    format!("[{}]", quoted.join(", "))
}
