use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::color::ColorString;
use crate::deps::{test_target_name, DependencyOverrides};
use crate::error::Result;
use crate::file_tree::{FileTreeScanner, DEFAULT_EXCLUDED_DIR, SOURCE_EXTENSIONS};
use crate::library_layout::{
    is_exported_test_lib, local_dep, MAIN_BINARIES, STANDING_LIBRARIES, TEST_LIB,
};
use crate::makefile::parse_tests;
use crate::src_mk::parse_src_mk;
use crate::targets_builder::TargetsBuilder;

pub const SRC_MK_FILE: &str = "src.mk";
pub const MAKEFILE: &str = "Makefile";
pub const TARGETS_FILE: &str = "TARGETS";

/// Why a test got no rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoSource,
    Ambiguous(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTest {
    pub test: String,
    pub alias: String,
    pub reason: SkipReason,
}

/// Counts reported after a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub libraries: usize,
    pub binaries: usize,
    pub tests: usize,
    pub skipped: Vec<SkippedTest>,
    pub targets_path: PathBuf,
}

/// Generates `<repo>/TARGETS` from `src.mk`, the `Makefile` and the source tree
pub struct TargetsGenerator {
    repo_path: PathBuf,
    excluded_dir: String,
}

impl TargetsGenerator {
    pub fn new(repo_path: impl AsRef<Path>) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
            excluded_dir: DEFAULT_EXCLUDED_DIR.to_string(),
        }
    }

    pub fn excluded_dir(mut self, name: impl Into<String>) -> Self {
        self.excluded_dir = name.into();
        self
    }

    pub fn targets_path(&self) -> PathBuf {
        self.repo_path.join(TARGETS_FILE)
    }

    /// Runs the whole pipeline and writes the TARGETS file.
    ///
    /// Nothing is written unless every input was read successfully.
    pub fn generate(&self, deps: &DependencyOverrides) -> Result<GenerationSummary> {
        println!("{}", ColorString::info("Generating TARGETS"));

        let (builder, skipped) = self.assemble(deps)?;
        let targets_path = self.targets_path();
        builder.write(&targets_path)?;

        let summary = GenerationSummary {
            libraries: builder.total_lib,
            binaries: builder.total_bin,
            tests: builder.total_test,
            skipped,
            targets_path,
        };

        println!("{}", ColorString::info("Generated TARGETS Summary:"));
        println!("{}", ColorString::info(&format!("- {} libs", summary.libraries)));
        println!("{}", ColorString::info(&format!("- {} binarys", summary.binaries)));
        println!("{}", ColorString::info(&format!("- {} tests", summary.tests)));

        Ok(summary)
    }

    /// Builds the full document in memory without touching the filesystem.
    pub fn assemble(
        &self,
        deps: &DependencyOverrides,
    ) -> Result<(TargetsBuilder, Vec<SkippedTest>)> {
        let src_mk = parse_src_mk(&self.repo_path.join(SRC_MK_FILE))?;
        let cc_files = FileTreeScanner::new(&self.repo_path)
            .excluded_dir(self.excluded_dir.clone())
            .scan()?;
        let tests = parse_tests(&self.repo_path.join(MAKEFILE))?;

        if tests.is_empty() {
            let message = format!("No tests found in {}", self.repo_path.join(MAKEFILE).display());
            debug!("{}", message);
            println!("{}", ColorString::warning(&message));
        }

        let mut builder = TargetsBuilder::new();

        for library in STANDING_LIBRARIES {
            let srcs = library.collect_sources(&src_mk)?;
            builder.add_library(library.name, &srcs, &library.dep_list());
        }

        for binary in MAIN_BINARIES {
            if let Some(srcs) = binary.collect_sources(&src_mk) {
                builder.add_binary(binary.name, &srcs, &binary.dep_list());
            } else {
                debug!("no sources for binary {}, skipping", binary.name);
            }
        }

        println!("Extra dependencies:\n{}", deps);

        let mut skipped = Vec::new();
        for (alias, alias_deps) in deps.iter() {
            for (test, is_parallel) in tests.iter() {
                let matches = find_test_sources(test, &cc_files);
                let src = match matches.as_slice() {
                    [src] => *src,
                    [] => {
                        let message = format!("Cannot find .cc file for {}", test);
                        debug!("{}", message);
                        println!("{}", ColorString::warning(&message));
                        skipped.push(SkippedTest {
                            test: test.to_string(),
                            alias: alias.to_string(),
                            reason: SkipReason::NoSource,
                        });
                        continue;
                    }
                    _ => {
                        let message = format!("Found more than one .cc for {}", test);
                        debug!("{}: {:?}", message, matches);
                        println!("{}", ColorString::warning(&message));
                        println!("{:?}", matches);
                        skipped.push(SkippedTest {
                            test: test.to_string(),
                            alias: alias.to_string(),
                            reason: SkipReason::Ambiguous(
                                matches.iter().map(|m| m.to_string()).collect(),
                            ),
                        });
                        continue;
                    }
                };

                let target_name = test_target_name(test, alias);
                builder.register_test(
                    &target_name,
                    src,
                    is_parallel,
                    &alias_deps.extra_deps,
                    &alias_deps.extra_compiler_flags,
                );

                if is_exported_test_lib(test) {
                    builder.add_library(
                        &format!("{}_lib", target_name),
                        &[src.to_string()],
                        &[local_dep(TEST_LIB)],
                    );
                }
            }
        }

        builder.flush_tests();
        Ok((builder, skipped))
    }
}

/// Scanned files named exactly `<test>.cc` or `<test>.c`, in path order
pub fn find_test_sources<'a>(test: &str, cc_files: &'a BTreeSet<String>) -> Vec<&'a str> {
    cc_files
        .iter()
        .map(String::as_str)
        .filter(|path| {
            let file_name = path.rsplit_once('/').map_or(*path, |(_, name)| name);
            file_name
                .strip_prefix(test)
                .and_then(|rest| rest.strip_prefix('.'))
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
        })
        .collect()
}

/// Repository root for a binary at `<repo>/<tool dir>/<binary>`
pub fn repo_path_from_program(program: &Path) -> Option<PathBuf> {
    let program = if program.is_absolute() {
        program.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(program)
    };
    let script_dir = program.parent()?;
    let repo = script_dir.parent()?;
    Some(repo.canonicalize().unwrap_or_else(|_| repo.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SRC_MK: &str = "\
LIB_SOURCES = \\
  db/db_impl.cc \\
  env/env.cc \\

TOOL_LIB_SOURCES = \\
  tools/ldb_cmd.cc \\

TEST_LIB_SOURCES = \\
  test_util/testharness.cc \\
";

    const MAKEFILE_TEXT: &str = "\
TESTS = \\
\tdb_test \\
\tenv_basic_test \\
\tmissing_test \\
\ttwin_test \\

PARALLEL_TEST = \\
\tdb_test \\

";

    fn repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for file in [
            "db/db_impl.cc",
            "db/db_test.cc",
            "env/env.cc",
            "env/env_basic_test.cc",
            "tools/ldb_cmd.cc",
            "test_util/testharness.cc",
            "a/twin_test.cc",
            "b/twin_test.cc",
            "java/rocksjni/db_test.cc",
        ] {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        fs::write(root.join(SRC_MK_FILE), SRC_MK).unwrap();
        fs::write(root.join(MAKEFILE), MAKEFILE_TEXT).unwrap();
        dir
    }

    fn files(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_find_exact_file_name() {
        let cc_files = files(&[
            "db/db_test.cc",
            "db/db_test2.cc",
            "db/my_db_test.cc",
            "db/db_test.h.cc",
            "c_test.c",
        ]);
        assert_eq!(find_test_sources("db_test", &cc_files), ["db/db_test.cc"]);
        assert_eq!(find_test_sources("c_test", &cc_files), ["c_test.c"]);
        assert!(find_test_sources("nothing_test", &cc_files).is_empty());
    }

    #[test]
    fn test_find_reports_every_match() {
        let cc_files = files(&["a/twin_test.cc", "b/twin_test.c"]);
        assert_eq!(
            find_test_sources("twin_test", &cc_files),
            ["a/twin_test.cc", "b/twin_test.c"]
        );
    }

    #[test]
    fn test_assemble_registers_matched_tests() {
        let repo = repo();
        let (builder, skipped) = TargetsGenerator::new(repo.path())
            .assemble(&DependencyOverrides::default())
            .unwrap();

        assert_eq!(builder.total_test, 2);
        // three standing libraries plus env_basic_test_lib
        assert_eq!(builder.total_lib, 4);
        assert_eq!(builder.total_bin, 0);

        let text = builder.render();
        assert!(text.contains("        \"db_test\",\n        \"db/db_test.cc\",\n        \"parallel\",\n"));
        assert!(text.contains("        \"env_basic_test\",\n        \"env/env_basic_test.cc\",\n        \"serial\",\n"));
        assert!(text.contains("    name = \"env_basic_test_lib\",\n    srcs = [\"env/env_basic_test.cc\"],\n"));
        assert!(!text.contains("java/"));

        assert_eq!(
            skipped,
            [
                SkippedTest {
                    test: "missing_test".to_string(),
                    alias: String::new(),
                    reason: SkipReason::NoSource,
                },
                SkippedTest {
                    test: "twin_test".to_string(),
                    alias: String::new(),
                    reason: SkipReason::Ambiguous(vec![
                        "a/twin_test.cc".to_string(),
                        "b/twin_test.cc".to_string(),
                    ]),
                },
            ]
        );
    }

    #[test]
    fn test_aliases_get_their_own_targets() {
        let repo = repo();
        let deps = DependencyOverrides::parse(Some(
            r#"{"fake": {"extra_deps": [":test_dep"], "extra_compiler_flags": ["-Os"]}}"#,
        ))
        .unwrap();
        let (builder, skipped) = TargetsGenerator::new(repo.path()).assemble(&deps).unwrap();

        assert_eq!(builder.total_test, 4);
        assert_eq!(builder.total_lib, 5);
        assert_eq!(skipped.len(), 4);

        let text = builder.render();
        assert!(text.contains("        \"db_test\",\n        \"db/db_test.cc\",\n        \"parallel\",\n        [],\n        [],\n"));
        assert!(text.contains(
            "        \"db_test_fake\",\n        \"db/db_test.cc\",\n        \"parallel\",\n        [\":test_dep\"],\n        [\"-Os\"],\n"
        ));
        assert!(text.contains("    name = \"env_basic_test_fake_lib\",\n"));
    }

    #[test]
    fn test_binary_declared_when_sources_listed() {
        let repo = repo();
        let src_mk = format!("{}\nBENCH_MAIN_SOURCES = \\\n  tools/db_bench.cc \\\n", SRC_MK);
        fs::write(repo.path().join(SRC_MK_FILE), src_mk).unwrap();

        let (builder, _) = TargetsGenerator::new(repo.path())
            .assemble(&DependencyOverrides::default())
            .unwrap();
        assert_eq!(builder.total_bin, 1);
        assert!(builder.render().contains("cpp_binary(\n    name = \"db_bench\",\n"));
    }

    #[test]
    fn test_generate_is_idempotent() {
        let repo = repo();
        let generator = TargetsGenerator::new(repo.path());
        let deps = DependencyOverrides::default();

        let summary = generator.generate(&deps).unwrap();
        let first = fs::read(&summary.targets_path).unwrap();
        generator.generate(&deps).unwrap();
        let second = fs::read(&summary.targets_path).unwrap();

        assert_eq!(first, second);
        assert_eq!(summary.libraries, 4);
        assert_eq!(summary.tests, 2);
    }

    #[test]
    fn test_missing_makefile_writes_nothing() {
        let repo = repo();
        fs::remove_file(repo.path().join(MAKEFILE)).unwrap();

        let generator = TargetsGenerator::new(repo.path());
        assert!(generator.generate(&DependencyOverrides::default()).is_err());
        assert!(!generator.targets_path().exists());
    }

    #[test]
    fn test_no_tests_still_generates() {
        let repo = repo();
        fs::write(repo.path().join(MAKEFILE), "all:\n").unwrap();

        let summary = TargetsGenerator::new(repo.path())
            .generate(&DependencyOverrides::default())
            .unwrap();
        assert_eq!(summary.tests, 0);
        assert!(summary.skipped.is_empty());
        assert!(summary.targets_path.exists());
    }

    #[test]
    fn test_repo_path_from_program() {
        let dir = tempfile::tempdir().unwrap();
        let tool_dir = dir.path().join("buckifier");
        fs::create_dir_all(&tool_dir).unwrap();

        let repo = repo_path_from_program(&tool_dir.join("buckify")).unwrap();
        assert_eq!(repo, dir.path().canonicalize().unwrap());
    }
}
