use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::NodeInfo;

pub const DEFAULT_CONFIG_FILE: &str = "admin.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub session: Option<String>,
    pub language: String,
    pub request_timeout_secs: u64,
    pub log_filter: String,
    pub node_info: NodeInfo,
    pub strings: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8082".into(),
            session: None,
            language: "en".into(),
            request_timeout_secs: 30,
            log_filter: "info".into(),
            node_info: NodeInfo::default(),
            strings: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Defaults, then the config file, then environment overrides.
///
/// An explicitly requested file must exist; the default `admin.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let mut settings = match fs::read_to_string(&path) {
        Ok(raw) => parse_settings(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => Settings::default(),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str(raw)?)
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = first(&lookup, &["APP__SERVER_URL", "ADMIN_SERVER_URL"]) {
        settings.server_url = v;
    }
    if let Some(v) = first(&lookup, &["APP__SESSION", "ADMIN_SESSION"]) {
        settings.session = Some(v);
    }
    if let Some(v) = first(&lookup, &["APP__LANGUAGE", "ADMIN_LANGUAGE"]) {
        settings.language = v;
    }
    if let Some(v) = first(&lookup, &["APP__REQUEST_TIMEOUT_SECS"]) {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
    if let Some(v) = first(&lookup, &["APP__LOG_FILTER"]) {
        settings.log_filter = v;
    }
}

fn first(lookup: &impl Fn(&str) -> Option<String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| lookup(*key))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
