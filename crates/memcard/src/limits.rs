use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Upper bounds on traversal of possibly corrupt images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Limits {
    /// Most clusters followed while reading or freeing a single chain.
    #[serde(default = "Limits::default_max_chain_clusters")]
    pub max_chain_clusters: usize,
    /// Exclusive upper bound on the cluster index the allocator will hand out.
    ///
    /// The search starts at the first data cluster, so any value at or below it
    /// leaves nothing to allocate.
    #[serde(default = "Limits::default_max_scan_clusters")]
    pub max_scan_clusters: usize,
}

impl Limits {
    pub const DEFAULT_CAP: usize = 10_000;

    fn default_max_chain_clusters() -> usize {
        Self::DEFAULT_CAP
    }

    fn default_max_scan_clusters() -> usize {
        Self::DEFAULT_CAP
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file =
            toml::from_str::<LimitsFile>(s).map_err(|e| Error::ConfigError(e.to_string()))?;
        Ok(file.limits)
    }

    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(&LimitsFile { limits: *self })
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_chain_clusters: Self::default_max_chain_clusters(),
            max_scan_clusters: Self::default_max_scan_clusters(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct LimitsFile {
    #[serde(default)]
    limits: Limits,
}

pub fn load_limits(path: &Path) -> Result<Limits> {
    let str = std::fs::read_to_string(path)?;
    Limits::from_toml_str(&str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let limits = Limits::from_toml_str("[limits]\nmax_chain_clusters = 4\n").unwrap();
        assert_eq!(limits.max_chain_clusters, 4);
        assert_eq!(limits.max_scan_clusters, Limits::DEFAULT_CAP);

        let empty = Limits::from_toml_str("").unwrap();
        assert_eq!(empty, Limits::default());
    }

    #[test]
    fn rejects_malformed_config() {
        let err = Limits::from_toml_str("[limits]\nmax_chain_clusters = \"lots\"\n").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn survives_serialization() {
        let limits = Limits {
            max_chain_clusters: 12,
            max_scan_clusters: 34,
        };
        let text = limits.to_toml_string().unwrap();
        assert_eq!(Limits::from_toml_str(&text).unwrap(), limits);
    }
}
