use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{BuckifyError, Result};

/// Suffixes of the compiled files listed in src.mk.
const SOURCE_SUFFIXES: &[&str] = &[".cc", ".c"];

/// Variables from src.mk, each holding its source files in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceManifest {
    variables: BTreeMap<String, Vec<String>>,
}

impl SourceManifest {
    pub fn parse(content: &str) -> Self {
        let mut variables: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((lhs, _)) = line.split_once('=') {
                let appends = lhs.ends_with('+');
                let name = lhs
                    .trim_end_matches(['+', ':', '?'])
                    .trim()
                    .to_string();
                if appends {
                    variables.entry(name.clone()).or_default();
                } else {
                    variables.insert(name.clone(), Vec::new());
                }
                current = Some(name);
            } else if let Some(src) = source_entry(line) {
                match current.as_ref().and_then(|name| variables.get_mut(name)) {
                    Some(files) => files.push(src),
                    None => debug!("ignoring source line outside of any variable: {}", line),
                }
            }
        }

        Self { variables }
    }

    /// Files listed under `name`, empty when the variable is absent
    pub fn get(&self, name: &str) -> &[String] {
        self.variables.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// First token of a list line when it names a `.cc` or `.c` file
fn source_entry(line: &str) -> Option<String> {
    line.split_whitespace()
        .next()
        .map(|token| token.trim_end_matches('\\'))
        .filter(|token| SOURCE_SUFFIXES.iter().any(|suffix| token.ends_with(*suffix)))
        .map(str::to_string)
}

pub fn parse_src_mk(path: &Path) -> Result<SourceManifest> {
    let content = fs::read_to_string(path).map_err(|source| BuckifyError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let manifest = SourceManifest::parse(&content);
    debug!("parsed {} variables from {}", manifest.len(), path.display());
    Ok(manifest)
}
