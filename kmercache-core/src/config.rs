//! Configuration for a kmer cache file.

use crate::{CacheResult, ConfigError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default SQLite busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Where the cache lives and how it is opened.
///
/// `path` is required. Everything else has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache file. Created (with schema) on first use.
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// When set, every batch must contain kmers of exactly this length.
    #[serde(default)]
    pub kmer_length: Option<usize>,
    #[serde(default)]
    pub verbose: bool,
}

impl CacheConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            kmer_length: None,
            verbose: false,
        }
    }

    pub fn with_kmer_length(mut self, length: usize) -> Self {
        self.kmer_length = Some(length);
        self
    }

    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    pub fn from_toml_str(source: &str) -> CacheResult<Self> {
        let config: CacheConfig = toml::from_str(source).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> CacheResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - path is not empty
    /// - busy_timeout_ms > 0
    /// - kmer_length, when set, > 0
    pub fn validate(&self) -> CacheResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "path",
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "busy_timeout_ms",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        if self.kmer_length == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "kmer_length",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KmerCacheError;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config = CacheConfig::from_toml_str(r#"path = "/tmp/HNF4A/cache.db""#).unwrap();
        assert_eq!(config.path, PathBuf::from("/tmp/HNF4A/cache.db"));
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert_eq!(config.kmer_length, None);
        assert!(!config.verbose);
    }

    #[test]
    fn test_full_toml() {
        let config = CacheConfig::from_toml_str(
            r#"
            path = "cache.db"
            busy_timeout_ms = 250
            kmer_length = 10
            verbose = true
            "#,
        )
        .unwrap();
        assert_eq!(config.busy_timeout(), Duration::from_millis(250));
        assert_eq!(config.kmer_length, Some(10));
        assert!(config.verbose);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = CacheConfig::from_toml_str("path = \"c.db\"\nthreads = 4").unwrap_err();
        assert!(matches!(err, KmerCacheError::Config(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = CacheConfig::from_toml_str("path = \"c.db\"\nbusy_timeout_ms = 0").unwrap_err();
        assert_eq!(
            err,
            KmerCacheError::Config(ConfigError::InvalidValue {
                field: "busy_timeout_ms",
                reason: "must be greater than zero".to_string(),
            })
        );
    }

    #[test]
    fn test_zero_kmer_length_rejected() {
        let config = CacheConfig::new("c.db").with_kmer_length(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_path_rejected() {
        assert!(CacheConfig::new("").validate().is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::TempDir::new().expect("TempDir creation should succeed");
        let err = CacheConfig::from_path(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, KmerCacheError::Config(ConfigError::Io { .. })));
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::TempDir::new().expect("TempDir creation should succeed");
        let file = dir.path().join("kmercache.toml");
        std::fs::write(&file, "path = \"cache.db\"\nkmer_length = 8\n").unwrap();
        let config = CacheConfig::from_path(&file).unwrap();
        assert_eq!(config.kmer_length, Some(8));
    }
}
