//! Local config file for registry settings.
//!
//! Reads the registry URL and upload token from a hand-edited
//! `$HOME/.motd-dist/config.toml` so they do not have to be supplied on
//! every invocation. The path is a hardcoded `$HOME/.motd-dist` base on all
//! platforms to keep it predictable across environments.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Hardcoded default URL of the motd package registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.motd-cli.dev";

/// Environment variable overriding the registry URL.
const REGISTRY_URL_ENV_VAR: &str = "MOTD_REGISTRY_URL";

/// Environment variable supplying the upload token.
const TOKEN_ENV_VAR: &str = "MOTD_REGISTRY_TOKEN";

/// Config directory under `$HOME/`.
const CONFIG_DIR_NAME: &str = ".motd-dist";

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Result of resolving the effective registry URL through the layered
/// config system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRegistryUrl {
    /// The resolved URL value.
    pub url: String,
    /// Whether the resolved URL uses a non-HTTPS scheme (caller should warn).
    pub is_non_https: bool,
}

/// Persisted CLI configuration.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Base URL of the package registry.
    pub registry_url: Option<String>,
    /// Upload token for authenticated publishing.
    pub token: Option<String>,
}

impl CliConfig {
    /// Resolve the config file path: `$HOME/.motd-dist/config.toml`.
    ///
    /// Returns `None` if `$HOME` cannot be determined.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_path_with_home(home_dir()?.as_path())
    }

    fn config_path_with_home(home: &Path) -> Option<PathBuf> {
        Some(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load config from disk. Returns defaults if the config file does not
    /// exist. Parse errors and I/O errors other than file-not-found are
    /// surfaced as hard failures to avoid silently operating on corrupted
    /// state.
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Some(p) => p,
            None => return Ok(Self::default()),
        };
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse config file at {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => {
                Err(e).with_context(|| format!("failed to read config file at {}", path.display()))
            }
        }
    }

    /// Resolve the effective registry URL using layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. `cli_override`, the `--registry` flag value for this invocation
    /// 2. `MOTD_REGISTRY_URL` environment variable
    /// 3. `registry_url` from the persisted config file
    /// 4. Hardcoded default
    ///
    /// Empty or whitespace-only values at any layer are treated as absent
    /// and fall through to the next layer.
    pub fn resolve_registry_url(&self, cli_override: Option<&str>) -> ResolvedRegistryUrl {
        self.resolve_registry_url_with_env(cli_override, std::env::var(REGISTRY_URL_ENV_VAR).ok())
    }

    fn resolve_registry_url_with_env(
        &self,
        cli_override: Option<&str>,
        env_value: Option<String>,
    ) -> ResolvedRegistryUrl {
        let url = non_empty_trimmed(cli_override.map(|s| s.to_string()))
            .or_else(|| non_empty_trimmed(env_value))
            .or_else(|| non_empty_trimmed(self.registry_url.clone()))
            .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());

        let is_non_https = !url.starts_with("https://");
        ResolvedRegistryUrl { url, is_non_https }
    }

    /// Resolve the upload token using layered precedence.
    ///
    /// Priority (highest wins): positional argument, then the
    /// `MOTD_REGISTRY_TOKEN` environment variable, then the config file.
    /// Returns `None` when no layer supplies a non-empty value.
    pub fn resolve_token(&self, positional: Option<&str>) -> Option<String> {
        self.resolve_token_with_env(positional, std::env::var(TOKEN_ENV_VAR).ok())
    }

    fn resolve_token_with_env(
        &self,
        positional: Option<&str>,
        env_value: Option<String>,
    ) -> Option<String> {
        non_empty_trimmed(positional.map(|s| s.to_string()))
            .or_else(|| non_empty_trimmed(env_value))
            .or_else(|| non_empty_trimmed(self.token.clone()))
    }
}

/// Return the trimmed value if non-empty after trimming, otherwise `None`.
fn non_empty_trimmed(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    })
}

/// Resolve the user's home directory from the `HOME` environment variable.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn config_path_layout() {
        let path = CliConfig::config_path_with_home(Path::new("/home/u")).unwrap();
        assert_eq!(path, PathBuf::from("/home/u/.motd-dist/config.toml"));
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = CliConfig::load_from(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn load_malformed_file_is_hard_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "registry_url = [not toml").unwrap();
        let err = CliConfig::load_from(&path).unwrap_err();
        assert!(format!("{err}").contains("failed to parse config file"));
    }

    #[test]
    fn load_parses_both_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "registry_url = \"https://registry.example.com\"\ntoken = \"tok_123\"\n",
        )
        .unwrap();

        let loaded = CliConfig::load_from(&path).unwrap();
        assert_eq!(
            loaded,
            CliConfig {
                registry_url: Some("https://registry.example.com".to_string()),
                token: Some("tok_123".to_string()),
            }
        );
    }

    #[test]
    fn registry_url_cli_flag_wins() {
        let config = CliConfig {
            registry_url: Some("https://from-file.example.com".to_string()),
            token: None,
        };
        let resolved = config.resolve_registry_url_with_env(
            Some("https://from-flag.example.com"),
            Some("https://from-env.example.com".to_string()),
        );
        assert_eq!(resolved.url, "https://from-flag.example.com");
        assert!(!resolved.is_non_https);
    }

    #[test]
    fn registry_url_env_beats_file() {
        let config = CliConfig {
            registry_url: Some("https://from-file.example.com".to_string()),
            token: None,
        };
        let resolved = config
            .resolve_registry_url_with_env(None, Some("https://from-env.example.com".to_string()));
        assert_eq!(resolved.url, "https://from-env.example.com");
    }

    #[test]
    fn registry_url_falls_back_to_default() {
        let resolved = CliConfig::default().resolve_registry_url_with_env(None, None);
        assert_eq!(resolved.url, DEFAULT_REGISTRY_URL);
        assert!(!resolved.is_non_https);
    }

    #[test]
    fn registry_url_blank_layers_fall_through() {
        let config = CliConfig {
            registry_url: Some("   ".to_string()),
            token: None,
        };
        let resolved = config.resolve_registry_url_with_env(Some(""), Some("  ".to_string()));
        assert_eq!(resolved.url, DEFAULT_REGISTRY_URL);
    }

    #[test]
    fn registry_url_flags_non_https() {
        let resolved = CliConfig::default()
            .resolve_registry_url_with_env(Some("http://127.0.0.1:8080"), None);
        assert!(resolved.is_non_https);
    }

    #[test]
    fn token_positional_wins() {
        let config = CliConfig {
            registry_url: None,
            token: Some("tok_file".to_string()),
        };
        let token =
            config.resolve_token_with_env(Some("tok_pos"), Some("tok_env".to_string()));
        assert_eq!(token.as_deref(), Some("tok_pos"));
    }

    #[test]
    fn token_env_beats_file() {
        let config = CliConfig {
            registry_url: None,
            token: Some("tok_file".to_string()),
        };
        let token = config.resolve_token_with_env(None, Some("tok_env".to_string()));
        assert_eq!(token.as_deref(), Some("tok_env"));
    }

    #[test]
    #[serial]
    fn registry_url_reads_process_env() {
        std::env::set_var("MOTD_REGISTRY_URL", "https://env.example.com");
        let resolved = CliConfig::default().resolve_registry_url(None);
        std::env::remove_var("MOTD_REGISTRY_URL");
        assert_eq!(resolved.url, "https://env.example.com");
    }

    #[test]
    #[serial]
    fn token_reads_process_env() {
        std::env::set_var("MOTD_REGISTRY_TOKEN", "tok_env");
        let token = CliConfig::default().resolve_token(None);
        std::env::remove_var("MOTD_REGISTRY_TOKEN");
        assert_eq!(token.as_deref(), Some("tok_env"));
    }

    #[test]
    fn token_absent_everywhere_is_none() {
        let token = CliConfig::default().resolve_token_with_env(None, Some("  ".to_string()));
        assert!(token.is_none());
    }
}
