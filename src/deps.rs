use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

/// Alias of the unsuffixed test targets.
pub const DEFAULT_ALIAS: &str = "";

/// Extra dependencies and compiler flags applied to every test of one alias
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasDeps {
    #[serde(default)]
    pub extra_deps: Vec<String>,
    #[serde(default)]
    pub extra_compiler_flags: Vec<String>,
}

/// Per-alias dependency overrides passed on the command line.
///
/// The default alias is always present. Aliases iterate in sorted order, so
/// the default alias comes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyOverrides {
    aliases: BTreeMap<String, AliasDeps>,
}

impl DependencyOverrides {
    /// Decodes the optional JSON argument, e.g.
    /// `{"fake": {"extra_deps": [":test_dep"], "extra_compiler_flags": ["-Os"]}}`.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let mut overrides = Self::default();

        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(overrides);
        };

        let decoded: BTreeMap<String, AliasDeps> = serde_json::from_str(raw)?;
        overrides.aliases.extend(decoded);
        Ok(overrides)
    }

    pub fn get(&self, alias: &str) -> Option<&AliasDeps> {
        self.aliases.get(alias)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AliasDeps)> {
        self.aliases.iter().map(|(alias, deps)| (alias.as_str(), deps))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for DependencyOverrides {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert(DEFAULT_ALIAS.to_string(), AliasDeps::default());
        Self { aliases }
    }
}

impl fmt::Display for DependencyOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (alias, deps) in self.iter() {
            writeln!(
                f,
                "  '{}': extra_deps={:?} extra_compiler_flags={:?}",
                alias, deps.extra_deps, deps.extra_compiler_flags
            )?;
        }
        Ok(())
    }
}

/// Target name for `test` under `alias`
pub fn test_target_name(test: &str, alias: &str) -> String {
    if alias.is_empty() {
        test.to_string()
    } else {
        format!("{}_{}", test, alias)
    }
}
