// Configuration persistence: the Pinry host and API token, stored as a
// flat JSON object in the user's home directory (or an explicit path).

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{PinryError, Result};

/// File name used when no explicit config path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".pinry-cli.config.json";

/// Host and credential for a single Pinry instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub token: String,
    pub pinry_url: String,
}

impl Config {
    /// Build a config from user input, trimming whitespace and checking
    /// that both values are usable.
    pub fn new(pinry_url: &str, token: &str) -> Result<Self> {
        let config = Config {
            pinry_url: pinry_url.trim().to_string(),
            token: token.trim().to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// `$HOME/.pinry-cli.config.json`, or the current directory when the
    /// home directory cannot be determined.
    pub fn default_path() -> PathBuf {
        let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.join(DEFAULT_CONFIG_FILE)
    }

    /// Check that the token is non-empty and the url is an absolute
    /// http(s) url.
    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(PinryError::InvalidToken("token is empty".into()));
        }
        parse_host(&self.pinry_url)?;
        Ok(())
    }

    /// Load the config at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist or when either key
    /// is missing or empty. Unreadable or malformed files are errors.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found");
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let raw: serde_json::Value = serde_json::from_str(&content)?;
        let Some(fields) = raw.as_object() else {
            debug!(path = %path.display(), "config file is not a json object");
            return Ok(None);
        };

        let token = fields.get("token").and_then(|v| v.as_str());
        let pinry_url = fields.get("pinry_url").and_then(|v| v.as_str());
        let (Some(token), Some(pinry_url)) = (token, pinry_url) else {
            debug!(path = %path.display(), "config file is missing keys");
            return Ok(None);
        };
        if token.is_empty() || pinry_url.is_empty() {
            debug!(path = %path.display(), "config file has empty values");
            return Ok(None);
        }
        Ok(Some(Config {
            token: token.to_string(),
            pinry_url: pinry_url.to_string(),
        }))
    }

    /// Write the config to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string(self)?;
        let mut file = open_private(path)?;
        file.write_all(content.as_bytes())?;
        debug!(path = %path.display(), "config saved");
        Ok(())
    }
}

/// Open `path` for writing, truncating it. The file holds the API token, so
/// on unix it is readable by the owner only.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten files written by older versions.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Parse a host string into a base url for the API.
pub fn parse_host(pinry_url: &str) -> Result<Url> {
    let url = Url::parse(pinry_url).map_err(|e| PinryError::InvalidUrl {
        url: pinry_url.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PinryError::InvalidUrl {
            url: pinry_url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinry.json");
        let config = Config::new("https://pin.example.com", "abc123").unwrap();

        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded, Some(config));
    }

    #[test]
    fn save_writes_flat_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinry.json");
        Config::new("https://pin.example.com", "abc123")
            .unwrap()
            .save(&path)
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["token"], "abc123");
        assert_eq!(value["pinry_url"], "https://pin.example.com");
    }

    #[test]
    fn save_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinry.json");
        Config::new("https://old.example.com", "old").unwrap().save(&path).unwrap();
        Config::new("https://new.example.com", "new").unwrap().save(&path).unwrap();

        let loaded = Config::load(&path).unwrap().unwrap();
        assert_eq!(loaded.token, "new");
        assert_eq!(loaded.pinry_url, "https://new.example.com");
    }

    #[test]
    fn missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::load(&dir.path().join("nope.json")).unwrap(), None);
    }

    #[test]
    fn missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinry.json");
        fs::write(&path, r#"{"token": "abc"}"#).unwrap();
        assert_eq!(Config::load(&path).unwrap(), None);

        fs::write(&path, r#"{"pinry_url": "https://pin.example.com"}"#).unwrap();
        assert_eq!(Config::load(&path).unwrap(), None);
    }

    #[test]
    fn non_object_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinry.json");
        fs::write(&path, r#"["tok", "https://pin.example.com"]"#).unwrap();
        assert_eq!(Config::load(&path).unwrap(), None);

        fs::write(&path, r#""tok""#).unwrap();
        assert_eq!(Config::load(&path).unwrap(), None);
    }

    #[test]
    fn non_string_value_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinry.json");
        fs::write(&path, r#"{"token": 5, "pinry_url": "https://pin.example.com"}"#).unwrap();
        assert_eq!(Config::load(&path).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinry.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        Config::new("https://pin.example.com", "tok").unwrap().save(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(Config::load(&path).unwrap().is_some());
    }

    #[test]
    fn empty_value_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinry.json");
        fs::write(&path, r#"{"token": "", "pinry_url": "https://pin.example.com"}"#).unwrap();
        assert_eq!(Config::load(&path).unwrap(), None);
    }

    #[test]
    fn malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinry.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::load(&path), Err(PinryError::Json(_))));
    }

    #[test]
    fn new_trims_and_validates() {
        let config = Config::new("  https://pin.example.com/ ", " tok \n").unwrap();
        assert_eq!(config.pinry_url, "https://pin.example.com/");
        assert_eq!(config.token, "tok");

        assert!(matches!(
            Config::new("https://pin.example.com", "   "),
            Err(PinryError::InvalidToken(_))
        ));
        assert!(matches!(
            Config::new("pin.example.com", "tok"),
            Err(PinryError::InvalidUrl { .. })
        ));
        assert!(matches!(
            Config::new("ftp://pin.example.com", "tok"),
            Err(PinryError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn default_path_uses_dotfile() {
        let path = Config::default_path();
        assert_eq!(path.file_name().unwrap(), DEFAULT_CONFIG_FILE);
    }
}
