//! Fieldbook configuration.
//!
//! Loaded from `~/.fieldbook/config.toml`. Every key is optional; a missing
//! file means defaults.
//!
//! ```toml
//! supervisory-chats = [-4949670947]
//! time-zone = "America/Lima"
//! public-base-url = "https://files.example/fieldbook"
//! data-dir = "/var/lib/fieldbook"
//! default-user = 1001
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use jiff::tz::TimeZone;
use serde::Deserialize;

use crate::model::ChatId;

pub const DEFAULT_TIME_ZONE: &str = "America/Lima";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Chats that receive a copy of every saved record. Updates from
    /// them are ignored.
    pub supervisory_chats: Vec<i64>,

    /// IANA zone used to stamp saved records.
    pub time_zone: String,

    /// Prefix for public photo URIs.
    pub public_base_url: Option<String>,

    /// Where the ledger and photos live. Defaults to `~/.fieldbook`.
    pub data_dir: Option<PathBuf>,

    /// Technician id used by `console` when no other is given.
    pub default_user: Option<i64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supervisory_chats: Vec::new(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            public_base_url: None,
            data_dir: None,
            default_user: None,
        }
    }
}

impl Config {
    /// Load config from `~/.fieldbook/config.toml`.
    pub fn load() -> Result<Self, String> {
        let path = Self::path().ok_or("could not determine home directory")?;
        Self::load_from(&path)
    }

    /// Load config from a file. A missing file yields defaults; an
    /// unreadable or invalid one is an error.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if config.time_zone.is_empty() {
            return Err(format!("time-zone is empty in {}", path.display()));
        }

        Ok(config)
    }

    /// The config file path: `~/.fieldbook/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".fieldbook").join("config.toml"))
    }

    /// Resolves `time-zone` against the system time zone database.
    pub fn time_zone(&self) -> Result<TimeZone, String> {
        TimeZone::get(&self.time_zone)
            .map_err(|e| format!("unknown time-zone {:?}: {e}", self.time_zone))
    }

    pub fn supervisors(&self) -> Vec<ChatId> {
        self.supervisory_chats.iter().copied().map(ChatId).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.time_zone, "America/Lima");
    }

    #[test]
    fn reads_kebab_case_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "supervisory-chats = [-4949670947, -100]\n\
             time-zone = \"UTC\"\n\
             public-base-url = \"https://files.example/shots\"\n\
             default-user = 1001\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.supervisors(), [ChatId(-4_949_670_947), ChatId(-100)]);
        assert_eq!(config.time_zone, "UTC");
        assert_eq!(
            config.public_base_url.as_deref(),
            Some("https://files.example/shots")
        );
        assert_eq!(config.default_user, Some(1001));
        assert_eq!(config.data_dir, None);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        fs::write(&path, "supervisory-chats = \"everyone\"\n").unwrap();
        assert!(Config::load_from(&path).unwrap_err().contains("invalid config"));

        fs::write(&path, "favourite-colour = \"blue\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        fs::write(&path, "time-zone = \"\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn unknown_time_zone_is_rejected() {
        let config = Config {
            time_zone: "Nowhere/Special".into(),
            ..Config::default()
        };
        assert!(config.time_zone().is_err());
    }
}
