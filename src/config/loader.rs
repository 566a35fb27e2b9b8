//! Configuration loader with 3-tier precedence
//!
//! Priority order (highest to lowest):
//! 1. Environment variables (`NOTION_API_KEY`, `NOTION_PAGE_ID`,
//!    `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID`, `AGENT_MEMORY_PATH`,
//!    `NOTION_API_BASE_URL`, `TELEGRAM_API_BASE_URL`)
//! 2. User config (./.engram.toml, $ENGRAM_CONFIG or ~/.config/engram/config.toml)
//! 3. Built-in defaults

use crate::config::{
    Config, TelegramCredentials, UserConfig, DEFAULT_NOTION_BASE_URL, DEFAULT_TELEGRAM_BASE_URL,
};
use crate::types::{EngramError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

const MEMORY_FILE_NAME: &str = "agent_memory.db";

pub struct ConfigLoader {
    user_config: Option<UserConfig>,
    home_dir: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader, reading the first user config file that exists.
    pub fn new() -> Result<Self> {
        let user_config = Self::load_user_config()?;
        if user_config.is_some() {
            info!("Loaded user configuration");
        }

        Ok(Self {
            user_config,
            home_dir: dirs::home_dir(),
        })
    }

    /// Create a loader from an already parsed user config.
    pub fn with_user_config(user_config: Option<UserConfig>, home_dir: Option<PathBuf>) -> Self {
        Self {
            user_config,
            home_dir,
        }
    }

    /// Load a `.env` file into the process environment.
    ///
    /// An explicit path must exist; the implicit `./.env` is optional.
    pub fn load_env_file(path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| EngramError::ConfigFile {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                info!("Loaded environment from {}", path.display());
            }
            None => match dotenvy::dotenv() {
                Ok(path) => info!("Loaded environment from {}", path.display()),
                Err(e) if e.not_found() => debug!("No .env file found"),
                Err(e) => warn!("Failed to load .env file: {}", e),
            },
        }
        Ok(())
    }

    fn load_user_config() -> Result<Option<UserConfig>> {
        let candidates = Self::user_config_candidates(
            std::env::current_dir().ok(),
            std::env::var("ENGRAM_CONFIG").ok(),
            dirs::config_dir(),
        );
        Self::first_user_config(&candidates)
    }

    /// Config file locations in lookup order.
    fn user_config_candidates(
        cwd: Option<PathBuf>,
        env_path: Option<String>,
        config_dir: Option<PathBuf>,
    ) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(cwd) = cwd {
            candidates.push(cwd.join(".engram.toml"));
        }

        if let Some(config_path) = env_path.filter(|p| !p.trim().is_empty()) {
            candidates.push(PathBuf::from(config_path));
        }

        if let Some(config_dir) = config_dir {
            candidates.push(config_dir.join("engram").join("config.toml"));
        }

        candidates
    }

    fn first_user_config(candidates: &[PathBuf]) -> Result<Option<UserConfig>> {
        for path in candidates {
            if path.exists() {
                debug!("Loading user config from: {}", path.display());
                return Self::read_user_config(path).map(Some);
            }
        }

        debug!("No user config file found");
        Ok(None)
    }

    fn read_user_config(path: &Path) -> Result<UserConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| EngramError::ConfigFile {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| EngramError::ConfigFile {
            path: path.to_path_buf(),
            message: format!("Failed to parse config: {}", e),
        })
    }

    /// Build the configuration from the process environment.
    pub fn load(&self) -> Result<Config> {
        self.load_from(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn load_from<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = self.user_config.clone().unwrap_or_default();
        let var = |key: &str| lookup(key).and_then(non_empty);

        let notion_api_key = var("NOTION_API_KEY").or(file.notion.api_key.and_then(non_empty));
        let notion_page_id = var("NOTION_PAGE_ID").or(file.notion.page_id.and_then(non_empty));

        let bot_token =
            var("TELEGRAM_BOT_TOKEN").or(file.telegram.bot_token.and_then(non_empty));
        let chat_id = var("TELEGRAM_CHAT_ID").or(file.telegram.chat_id.and_then(non_empty));
        let telegram = match (bot_token, chat_id) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramCredentials { bot_token, chat_id }),
            (None, None) => None,
            _ => {
                warn!("Only one of TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID is set; alerts disabled");
                None
            }
        };

        let notion_base_url = parse_base_url(
            var("NOTION_API_BASE_URL")
                .or(file.notion.base_url)
                .as_deref()
                .unwrap_or(DEFAULT_NOTION_BASE_URL),
        )?;
        let telegram_base_url = parse_base_url(
            var("TELEGRAM_API_BASE_URL")
                .or(file.telegram.base_url)
                .as_deref()
                .unwrap_or(DEFAULT_TELEGRAM_BASE_URL),
        )?;

        let requested = var("AGENT_MEMORY_PATH").or(file.memory.path.and_then(non_empty));
        let memory_path = prepare_memory_path(requested, self.home_dir.as_deref());

        Ok(Config {
            notion_api_key,
            notion_page_id,
            telegram,
            memory_path,
            notion_base_url,
            telegram_base_url,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a base URL, forcing a trailing slash so relative joins keep the path.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Platform default location of the fact log under `home`.
pub fn default_memory_path(home: &Path) -> PathBuf {
    let base = if cfg!(target_os = "macos") {
        home.join("Library").join(".engram").join("data")
    } else {
        home.join(".engram").join("data")
    };
    base.join(MEMORY_FILE_NAME)
}

fn expand_home(raw: &str, home: Option<&Path>) -> PathBuf {
    match (raw.strip_prefix('~'), home) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches(['/', '\\'])),
        _ => PathBuf::from(raw),
    }
}

/// Resolve the fact-log path and make sure its directory exists.
///
/// Falls back to `agent_memory.db` in the working directory when the
/// directory cannot be created.
fn prepare_memory_path(requested: Option<String>, home: Option<&Path>) -> PathBuf {
    let path = match (requested, home) {
        (Some(raw), _) => expand_home(&raw, home),
        (None, Some(home)) => default_memory_path(home),
        (None, None) => return PathBuf::from(MEMORY_FILE_NAME),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(
                "Could not create database directory {}: {}; using ./{}",
                parent.display(),
                e,
                MEMORY_FILE_NAME
            );
            return PathBuf::from(MEMORY_FILE_NAME);
        }
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_values_are_read() {
        let home = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::with_user_config(None, Some(home.path().to_path_buf()));

        let config = loader
            .load_from(lookup(&[
                ("NOTION_API_KEY", "secret_abc"),
                ("NOTION_PAGE_ID", "page-123"),
                ("TELEGRAM_BOT_TOKEN", "42:token"),
                ("TELEGRAM_CHAT_ID", "1001"),
            ]))
            .unwrap();

        assert_eq!(config.notion_api_key.as_deref(), Some("secret_abc"));
        assert_eq!(config.notion_page_id.as_deref(), Some("page-123"));
        let telegram = config.telegram.unwrap();
        assert_eq!(telegram.bot_token, "42:token");
        assert_eq!(telegram.chat_id, "1001");
        assert_eq!(config.notion_base_url.as_str(), DEFAULT_NOTION_BASE_URL);
    }

    #[test]
    fn test_default_memory_path_is_created_under_home() {
        let home = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::with_user_config(None, Some(home.path().to_path_buf()));

        let config = loader.load_from(lookup(&[])).unwrap();

        assert_eq!(config.memory_path, default_memory_path(home.path()));
        assert!(config.memory_path.parent().unwrap().is_dir());
        assert!(config.notion_api_key.is_none());
        assert!(config.telegram.is_none());
    }

    #[test]
    fn test_memory_path_tilde_expansion() {
        let home = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::with_user_config(None, Some(home.path().to_path_buf()));

        let config = loader
            .load_from(lookup(&[("AGENT_MEMORY_PATH", "~/notes/memory.db")]))
            .unwrap();

        assert_eq!(config.memory_path, home.path().join("notes").join("memory.db"));
    }

    #[test]
    fn test_unwritable_directory_falls_back_to_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let requested = blocker.join("sub").join("memory.db");

        let loader = ConfigLoader::with_user_config(None, None);
        let config = loader
            .load_from(lookup(&[(
                "AGENT_MEMORY_PATH",
                requested.to_str().unwrap(),
            )]))
            .unwrap();

        assert_eq!(config.memory_path, PathBuf::from("agent_memory.db"));
    }

    #[test]
    fn test_partial_telegram_credentials_disable_alerts() {
        let home = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::with_user_config(None, Some(home.path().to_path_buf()));

        let config = loader
            .load_from(lookup(&[("TELEGRAM_BOT_TOKEN", "42:token")]))
            .unwrap();

        assert!(config.telegram.is_none());
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let home = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::with_user_config(None, Some(home.path().to_path_buf()));

        let config = loader
            .load_from(lookup(&[("NOTION_PAGE_ID", "   ")]))
            .unwrap();

        assert!(config.notion_page_id.is_none());
    }

    #[test]
    fn test_env_overrides_user_config() {
        let home = tempfile::tempdir().unwrap();
        let user: UserConfig = toml::from_str(
            r#"
            [notion]
            api_key = "from-file"
            page_id = "file-page"
            base_url = "http://localhost:9000/v1"

            [telegram]
            bot_token = "file-token"
            chat_id = "file-chat"
            "#,
        )
        .unwrap();
        let loader = ConfigLoader::with_user_config(Some(user), Some(home.path().to_path_buf()));

        let config = loader
            .load_from(lookup(&[("NOTION_PAGE_ID", "env-page")]))
            .unwrap();

        assert_eq!(config.notion_api_key.as_deref(), Some("from-file"));
        assert_eq!(config.notion_page_id.as_deref(), Some("env-page"));
        assert_eq!(config.notion_base_url.as_str(), "http://localhost:9000/v1/");
        assert_eq!(config.telegram.unwrap().chat_id, "file-chat");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let loader = ConfigLoader::with_user_config(None, None);
        let result = loader.load_from(lookup(&[
            ("NOTION_API_BASE_URL", "not a url"),
            ("AGENT_MEMORY_PATH", "memory.db"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_user_config_read_from_env_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("engram.toml");
        std::fs::write(
            &file,
            "[notion]\napi_key = \"file-key\"\npage_id = \"file-page\"\n\n[memory]\npath = \"facts.db\"\n",
        )
        .unwrap();

        let candidates = ConfigLoader::user_config_candidates(
            Some(dir.path().join("cwd")),
            Some(file.to_string_lossy().into_owned()),
            Some(dir.path().join("config")),
        );
        assert_eq!(candidates[1], file);

        let user = ConfigLoader::first_user_config(&candidates).unwrap();
        let loader = ConfigLoader::with_user_config(user, Some(dir.path().to_path_buf()));
        let config = loader
            .load_from(lookup(&[("NOTION_PAGE_ID", "env-page")]))
            .unwrap();

        assert_eq!(config.notion_api_key.as_deref(), Some("file-key"));
        assert_eq!(config.notion_page_id.as_deref(), Some("env-page"));
        assert_eq!(config.memory_path, PathBuf::from("facts.db"));
    }

    #[test]
    fn test_cwd_config_wins_over_env_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".engram.toml"), "[notion]\npage_id = \"cwd\"\n").unwrap();
        let other = dir.path().join("other.toml");
        std::fs::write(&other, "[notion]\npage_id = \"env\"\n").unwrap();

        let candidates = ConfigLoader::user_config_candidates(
            Some(dir.path().to_path_buf()),
            Some(other.to_string_lossy().into_owned()),
            None,
        );
        let user = ConfigLoader::first_user_config(&candidates).unwrap().unwrap();
        assert_eq!(user.notion.page_id.as_deref(), Some("cwd"));
    }

    #[test]
    fn test_missing_or_broken_user_config() {
        let dir = tempfile::tempdir().unwrap();
        let missing = vec![dir.path().join("nope.toml")];
        assert!(ConfigLoader::first_user_config(&missing).unwrap().is_none());

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[notion\n").unwrap();
        let err = ConfigLoader::first_user_config(&[broken]).unwrap_err();
        assert!(matches!(err, EngramError::ConfigFile { .. }));
    }
}
