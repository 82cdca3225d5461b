use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::musicbrainz::client::{MusicBrainzSettings, RetryPolicy};
use crate::musicbrainz::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::plex_rs::parse_server_url;

const REMAPPER_FILE_NAME: &str = "plex-date-remapper.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub plex: PlexConfig,
    pub musicbrainz: MusicBrainzConfig,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlexConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Where `plex-mapping-*.json` and the manifest live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_directory: Option<String>,
    /// Remapper file, defaults to `plex-date-remapper.json` in the mapping directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remapper: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicBrainzConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_interval_ms: u64,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_interval_ms: 1500,
            max_retries: 3,
            retry_base_delay_ms: 2000,
        }
    }
}

/// `plex-config.json` as written by the web frontend's setup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyPlexConfig {
    server_url: Option<String>,
    token: Option<String>,
}

impl Config {
    /// Load config from a TOML file, or a legacy `plex-config.json`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            let legacy: LegacyPlexConfig = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(Config {
                plex: PlexConfig {
                    server_url: legacy.server_url,
                    token: legacy.token,
                    mapping_directory: path
                        .parent()
                        .map(|dir| dir.to_string_lossy().into_owned()),
                    remapper: None,
                },
                musicbrainz: MusicBrainzConfig::default(),
            });
        }

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("songseeker").join("config.toml"))
    }

    /// Load the default config file, falling back to defaults when it does
    /// not exist. Server and token can still come from the command line.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Write a default config file, unless one exists already.
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_else(|| eyre!("No config directory found"))?;
        Self::default().write_new(&path)?;
        Ok(path)
    }

    fn write_new(&self, path: &Path) -> Result<()> {
        if path.exists() {
            log::info!("Config already exists at {}", path.display());
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).wrap_err("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Expand ~ to home directory
    fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Server URL and token, command line values taking precedence.
    pub fn plex_credentials(&self, server: Option<&str>, token: Option<&str>) -> Result<(Url, String)> {
        let server = server
            .or(self.plex.server_url.as_deref())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                eyre!("No Plex server configured. Provide --server or set plex.server_url in the config")
            })?;
        let token = token
            .or(self.plex.token.as_deref())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                eyre!("No Plex token configured. Provide --token or set plex.token in the config")
            })?;
        Ok((parse_server_url(server)?, token.to_string()))
    }

    pub fn mapping_directory(&self) -> PathBuf {
        self.plex
            .mapping_directory
            .as_deref()
            .map(Self::expand_path)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve `--mapping`: an existing path is used as is, a bare name such
    /// as `de-at-2026` becomes `plex-mapping-de-at-2026.json` in the mapping
    /// directory.
    pub fn resolve_mapping_path(&self, mapping: &str) -> PathBuf {
        let as_path = Self::expand_path(mapping);
        if as_path.exists() || as_path.components().count() > 1 {
            return as_path;
        }
        if mapping.ends_with(".json") {
            return self.mapping_directory().join(mapping);
        }
        self.mapping_directory()
            .join(format!("plex-mapping-{}.json", mapping))
    }

    pub fn remapper_path(&self) -> PathBuf {
        self.plex
            .remapper
            .as_deref()
            .map(Self::expand_path)
            .unwrap_or_else(|| self.mapping_directory().join(REMAPPER_FILE_NAME))
    }

    pub fn musicbrainz_settings(&self) -> Result<MusicBrainzSettings> {
        let mb = &self.musicbrainz;
        let base_url = Url::parse(&mb.base_url)
            .with_context(|| format!("Invalid MusicBrainz URL: {}", mb.base_url))?;
        Ok(MusicBrainzSettings {
            base_url,
            user_agent: mb.user_agent.clone(),
            request_interval: Duration::from_millis(mb.request_interval_ms),
            retry: RetryPolicy {
                max_attempts: mb.max_retries.max(1),
                base_delay: Duration::from_millis(mb.retry_base_delay_ms),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[plex]
server_url = "http://plex.local:32400"
token = "abc"
mapping_directory = "/srv/songseeker"

[musicbrainz]
request_interval_ms = 2000
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.mapping_directory(), PathBuf::from("/srv/songseeker"));
        assert_eq!(
            config.remapper_path(),
            PathBuf::from("/srv/songseeker/plex-date-remapper.json")
        );

        let settings = config.musicbrainz_settings().unwrap();
        assert_eq!(settings.request_interval, Duration::from_millis(2000));
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_legacy_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plex-config.json");
        std::fs::write(&path, r#"{"serverUrl": "http://plex.local:32400/", "token": "abc"}"#)
            .unwrap();

        let config = Config::from_file(&path).unwrap();
        let (url, token) = config.plex_credentials(None, None).unwrap();
        assert_eq!(url.as_str(), "http://plex.local:32400/");
        assert_eq!(token, "abc");
        assert_eq!(config.mapping_directory(), dir.path());
    }

    #[test]
    fn test_cli_credentials_override_config() {
        let config = Config {
            plex: PlexConfig {
                server_url: Some("http://config:32400".into()),
                token: Some("config-token".into()),
                ..PlexConfig::default()
            },
            ..Config::default()
        };

        let (url, token) = config
            .plex_credentials(Some("http://cli:32400/plex"), Some("cli-token"))
            .unwrap();
        assert_eq!(url.as_str(), "http://cli:32400/plex/");
        assert_eq!(token, "cli-token");
    }

    #[test]
    fn test_missing_credentials() {
        let err = Config::default().plex_credentials(None, None).unwrap_err();
        assert!(err.to_string().contains("No Plex server configured"));

        let err = Config::default()
            .plex_credentials(Some("http://plex:32400"), None)
            .unwrap_err();
        assert!(err.to_string().contains("No Plex token configured"));
    }

    #[test]
    fn test_resolve_mapping_path() {
        let config = Config {
            plex: PlexConfig {
                mapping_directory: Some("/srv/songseeker".into()),
                ..PlexConfig::default()
            },
            ..Config::default()
        };

        assert_eq!(
            config.resolve_mapping_path("de-at-2026"),
            PathBuf::from("/srv/songseeker/plex-mapping-de-at-2026.json")
        );
        assert_eq!(
            config.resolve_mapping_path("plex-mapping-de.json"),
            PathBuf::from("/srv/songseeker/plex-mapping-de.json")
        );
        assert_eq!(
            config.resolve_mapping_path("../plex-mapping-de.json"),
            PathBuf::from("../plex-mapping-de.json")
        );
    }

    #[test]
    fn test_write_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("songseeker").join("config.toml");

        Config::default().write_new(&path).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.musicbrainz.request_interval_ms, 1500);
        assert!(config.plex.server_url.is_none());
    }
}
