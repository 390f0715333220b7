use crate::error::{BuckifyError, Result};
use crate::src_mk::SourceManifest;

/// Library every other target links against.
pub const CORE_LIB: &str = "rocksdb_lib";
/// Library carrying mocks and test utilities.
pub const TEST_LIB: &str = "rocksdb_test_lib";
/// Library carrying benchmark and analyzer support code.
pub const TOOLS_LIB: &str = "rocksdb_tools_lib";

/// Tests additionally exported as `<target>_lib` libraries for other projects.
pub const EXPORTED_TEST_LIBS: &[&str] = &["env_basic_test"];

/// A src.mk variable feeding a target
#[derive(Debug, Clone, Copy)]
pub enum SourceKey {
    Required(&'static str),
    Optional(&'static str),
}

#[derive(Debug)]
pub struct LibrarySpec {
    pub name: &'static str,
    pub sources: &'static [SourceKey],
    pub extra_srcs: &'static [&'static str],
    pub deps: &'static [&'static str],
}

#[derive(Debug)]
pub struct BinarySpec {
    pub name: &'static str,
    pub source_key: &'static str,
    pub deps: &'static [&'static str],
}

pub const STANDING_LIBRARIES: &[LibrarySpec] = &[
    LibrarySpec {
        name: CORE_LIB,
        sources: &[
            SourceKey::Required("LIB_SOURCES"),
            SourceKey::Required("TOOL_LIB_SOURCES"),
        ],
        extra_srcs: &[],
        deps: &[],
    },
    LibrarySpec {
        name: TEST_LIB,
        sources: &[
            SourceKey::Optional("MOCK_LIB_SOURCES"),
            SourceKey::Optional("TEST_LIB_SOURCES"),
            SourceKey::Optional("EXP_LIB_SOURCES"),
            SourceKey::Optional("ANALYZER_LIB_SOURCES"),
        ],
        extra_srcs: &[],
        deps: &[":rocksdb_lib"],
    },
    LibrarySpec {
        name: TOOLS_LIB,
        sources: &[
            SourceKey::Optional("BENCH_LIB_SOURCES"),
            SourceKey::Optional("ANALYZER_LIB_SOURCES"),
        ],
        extra_srcs: &["test_util/testutil.cc"],
        deps: &[":rocksdb_lib"],
    },
];

/// Binaries declared only when their src.mk variable lists sources.
pub const MAIN_BINARIES: &[BinarySpec] = &[BinarySpec {
    name: "db_bench",
    source_key: "BENCH_MAIN_SOURCES",
    deps: &[":rocksdb_tools_lib"],
}];

impl LibrarySpec {
    /// Sources in table order, followed by the fixed extras
    pub fn collect_sources(&self, manifest: &SourceManifest) -> Result<Vec<String>> {
        let mut srcs = Vec::new();

        for key in self.sources {
            match *key {
                SourceKey::Required(name) if !manifest.contains(name) => {
                    return Err(BuckifyError::MissingVariable {
                        name: name.to_string(),
                        library: self.name.to_string(),
                    });
                }
                SourceKey::Required(name) | SourceKey::Optional(name) => {
                    srcs.extend_from_slice(manifest.get(name));
                }
            }
        }

        srcs.extend(self.extra_srcs.iter().map(|src| src.to_string()));
        Ok(srcs)
    }

    pub fn dep_list(&self) -> Vec<String> {
        to_strings(self.deps)
    }
}

impl BinarySpec {
    /// `None` when the variable is absent or empty
    pub fn collect_sources(&self, manifest: &SourceManifest) -> Option<Vec<String>> {
        let srcs = manifest.get(self.source_key);
        if srcs.is_empty() {
            None
        } else {
            Some(srcs.to_vec())
        }
    }

    pub fn dep_list(&self) -> Vec<String> {
        to_strings(self.deps)
    }
}

pub fn is_exported_test_lib(test: &str) -> bool {
    EXPORTED_TEST_LIBS.contains(&test)
}

/// Dependency label of a library declared in the same TARGETS file
pub fn local_dep(name: &str) -> String {
    format!(":{}", name)
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
