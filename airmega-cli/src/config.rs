use std::path::{Path, PathBuf};

use airmega::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// On-disk CLI configuration (TOML).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Where issued tokens are cached between runs.
    pub token_cache: Option<PathBuf>,
    /// Overrides for the vendor endpoints and login behavior.
    pub client: ClientConfig,
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("airmega")
            .join("config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn reset(path: Option<&Path>) -> Result<()> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(&Self::default())?)?;
        Ok(())
    }

    pub fn token_cache_path(&self) -> PathBuf {
        self.token_cache.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("airmega")
                .join("tokens.json")
        })
    }

    /// Printable form with the password masked.
    pub fn show(&self) -> Result<String> {
        let mut masked = self.clone();
        if masked.password.is_some() {
            masked.password = Some("********".to_string());
        }
        Ok(toml::to_string_pretty(&masked)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_with_client_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
username = "user@example.com"
password = "hunter2"

[client]
legacy_password_cipher = true
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.username.as_deref(), Some("user@example.com"));
        assert!(config.client.legacy_password_cipher);
        assert_eq!(config.client.base_uri, ClientConfig::default().base_uri);
    }

    #[test]
    fn test_show_masks_password() {
        let config = AppConfig {
            password: Some("hunter2".into()),
            ..AppConfig::default()
        };
        let shown = config.show().unwrap();
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn test_reset_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        AppConfig::reset(Some(&path)).unwrap();
        assert_eq!(AppConfig::load(Some(&path)).unwrap(), AppConfig::default());
    }
}
