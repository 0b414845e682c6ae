use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{errors::Error, security::DEFAULT_REFRESH_INTERVAL, Result};

pub const DEFAULT_CONFIG_FILE: &str = "bryx.json";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Typed configuration.
///
/// Sources, lowest precedence first: the optional JSON file, `.env`, the
/// process environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    pub crm_api_url: String,
    /// Loaded for visibility only; authorization consults the CRM directory.
    pub allowed_users: Vec<String>,
    pub users_refresh_interval: Duration,
    pub crm_request_timeout: Duration,
}

/// On-disk shape of the JSON config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    bot_token: Option<String>,
    crm_api_url: Option<String>,
    allowed_users: Option<Vec<String>>,
    users_refresh_interval_secs: Option<u64>,
    crm_request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let path = env_path("BRYX_CONFIG_FILE").unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let file = read_file_config(&path)?;

        let cfg = Self::resolve(file)?;
        cfg.warn_missing();
        Ok(cfg)
    }

    /// Load from an explicit JSON file plus the environment (no `.env`).
    pub fn load_from(path: &Path) -> Result<Self> {
        let cfg = Self::resolve(read_file_config(path)?)?;
        cfg.warn_missing();
        Ok(cfg)
    }

    fn resolve(file: FileConfig) -> Result<Self> {
        let bot_token = env_str("BOT_TOKEN")
            .and_then(non_empty)
            .or(file.bot_token)
            .unwrap_or_default();

        let crm_api_url = env_str("CRM_API_URL")
            .and_then(non_empty)
            .or(file.crm_api_url)
            .unwrap_or_default();

        let allowed_users = match env_str("ALLOWED_USERS").and_then(non_empty) {
            Some(csv) => parse_csv(&csv),
            None => file.allowed_users.unwrap_or_default(),
        };

        let users_refresh_interval = env_secs("USERS_REFRESH_INTERVAL_SECS")?
            .or(file.users_refresh_interval_secs.map(Duration::from_secs))
            .unwrap_or(DEFAULT_REFRESH_INTERVAL);

        let crm_request_timeout = env_secs("CRM_REQUEST_TIMEOUT_SECS")?
            .or(file.crm_request_timeout_secs.map(Duration::from_secs))
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Ok(Self {
            bot_token,
            crm_api_url,
            allowed_users,
            users_refresh_interval,
            crm_request_timeout,
        })
    }

    // None of these are fatal: the bot starts, and calls fail until fixed.
    fn warn_missing(&self) {
        if self.bot_token.trim().is_empty() {
            warn!("BOT_TOKEN is not set");
        }
        if self.crm_api_url.trim().is_empty() {
            warn!("CRM_API_URL is not set");
        } else {
            info!(url = %self.crm_api_url, "CRM API URL configured");
        }
        if self.allowed_users.is_empty() {
            warn!("ALLOWED_USERS is not set; access is governed by the CRM user directory only");
        } else {
            info!(users = %self.allowed_users.join(", "), "ALLOWED_USERS loaded");
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(e) => return Err(Error::Io(e)),
    };
    serde_json::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn env_secs(key: &str) -> Result<Option<Duration>> {
    let Some(raw) = env_str(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(|s| Some(Duration::from_secs(s)))
        .map_err(|e| Error::Config(format!("{key}: {e}")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_csv(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
