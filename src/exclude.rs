// Exclusion rules: pages whose path matches are skipped entirely.

use crate::errors::ConfigError;
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled set of exclusion globs, matched against page paths relative to
/// the docs directory (`/`-separated). `*` also matches across `/`, the way
/// shell-style `fnmatch` does; a trailing `/` excludes a whole directory.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    patterns: Vec<String>,
    set: GlobSet,
}

impl ExclusionRules {
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            let normalized = normalize(pattern);
            let glob = match normalized.strip_suffix('/') {
                Some(dir) => format!("{dir}/**"),
                None => normalized,
            };
            let compiled = Glob::new(&glob).map_err(|e| ConfigError::InvalidGlob {
                pattern: pattern.to_string(),
                source: e,
            })?;
            builder.add(compiled);
            kept.push(pattern.to_string());
        }
        let set = builder.build().map_err(|e| ConfigError::InvalidGlob {
            pattern: kept.join(", "),
            source: e,
        })?;
        Ok(ExclusionRules {
            patterns: kept,
            set,
        })
    }

    pub fn empty() -> Self {
        ExclusionRules {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        !self.is_empty() && self.set.is_match(normalize(path))
    }
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for ExclusionRules {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut rest = path.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}
