//! Cache configuration persistence.
//!
//! A [`MetaCacheConfig`] is stored as JSON (usually `meta-cache.json` next to
//! the collection manifest). Every field has a default, so a partial or missing
//! file is usable.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Settings for building and recomputing a collection's meta cache.
///
/// # JSON format
///
/// ```json
/// {
///   "version": 1,
///   "gameDataDir": "/games/ffxiv/extracted",
///   "enableGlobalRules": true,
///   "logConflicts": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetaCacheConfig {
    /// Schema version (current: `1`).
    pub version: u32,

    /// Directory with extracted game files, laid out by game path. Read by
    /// [`FsDefaultFiles`](crate::files::FsDefaultFiles).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_data_dir: Option<Utf8PathBuf>,

    /// When `false`, global EQP rules are skipped during recompute.
    pub enable_global_rules: bool,

    /// Log every superseded override at `info` level.
    pub log_conflicts: bool,
}

impl MetaCacheConfig {
    pub const VERSION: u32 = 1;

    /// Load a config file. Returns `Ok(None)` if the file doesn't exist.
    pub fn load(path: &Utf8Path) -> Result<Option<Self>> {
        if !path.as_std_path().exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path.as_std_path())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Save the config, creating parent directories if needed.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_std_path(), contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != Self::VERSION {
            return Err(Error::InvalidConfig(format!(
                "unsupported version {} (expected {})",
                self.version,
                Self::VERSION
            )));
        }
        if let Some(dir) = &self.game_data_dir {
            if dir.as_str().is_empty() {
                return Err(Error::InvalidConfig("gameDataDir is empty".to_string()));
            }
        }
        Ok(())
    }
}

impl Default for MetaCacheConfig {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            game_data_dir: None,
            enable_global_rules: true,
            log_conflicts: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_default_config() {
        let config = MetaCacheConfig::default();
        assert_eq!(config.version, 1);
        assert!(config.enable_global_rules);
        assert!(!config.log_conflicts);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let path = root.join("nested/meta-cache.json");

        let config = MetaCacheConfig {
            game_data_dir: Some(Utf8PathBuf::from("/games/extracted")),
            log_conflicts: true,
            ..MetaCacheConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = MetaCacheConfig::load(&path).unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_nonexistent() {
        let dir = tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("missing.json");
        assert!(MetaCacheConfig::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(br#"{ "logConflicts": true }"#).unwrap();
        temp.flush().unwrap();

        let path = Utf8Path::from_path(temp.path()).unwrap();
        let loaded = MetaCacheConfig::load(path).unwrap().unwrap();
        assert!(loaded.log_conflicts);
        assert!(loaded.enable_global_rules);
        assert_eq!(loaded.game_data_dir, None);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(br#"{ "version": 7 }"#).unwrap();
        temp.flush().unwrap();

        let path = Utf8Path::from_path(temp.path()).unwrap();
        assert!(matches!(
            MetaCacheConfig::load(path),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"{ invalid json }").unwrap();
        temp.flush().unwrap();

        let path = Utf8Path::from_path(temp.path()).unwrap();
        assert!(matches!(MetaCacheConfig::load(path), Err(Error::Json(_))));
    }

    #[test]
    fn test_serialization_format() {
        let json = serde_json::to_string(&MetaCacheConfig::default()).unwrap();
        assert!(json.contains("\"version\":1"));
        assert!(json.contains("\"enableGlobalRules\":true"));
        assert!(!json.contains("gameDataDir"));
    }
}
