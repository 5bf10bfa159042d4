use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_media_base_url")]
    pub media_base_url: String,
    #[serde(default = "default_tick_rate")]
    pub tick_rate_fps: f64,
    #[serde(default = "default_signup_redirect_secs")]
    pub signup_redirect_secs: u64,
    #[serde(default)]
    pub default_view: DefaultView,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultView {
    #[default]
    Feed,
    Profile,
}

fn default_api_base_url() -> String {
    "https://linkedin-backend-kzfo.onrender.com".to_string()
}

fn default_media_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_tick_rate() -> f64 {
    30.0
}

fn default_signup_redirect_secs() -> u64 {
    2
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            media_base_url: default_media_base_url(),
            tick_rate_fps: default_tick_rate(),
            signup_redirect_secs: default_signup_redirect_secs(),
            default_view: DefaultView::default(),
        }
    }
}

/// Directory holding config.toml, .env and the persisted session.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/linktui"))
}

fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Load .env files so `LINKTUI_*` overrides are visible.
///
/// dotenvy never overwrites variables that are already set, so the real
/// environment wins over ~/.config/linktui/.env, which wins over ./.env.
fn load_env_files() {
    let mut paths = Vec::new();
    if let Some(dir) = config_dir() {
        paths.push(dir.join(".env"));
    }
    paths.push(PathBuf::from(".env"));

    for path in paths {
        if path.exists()
            && let Err(e) = dotenvy::from_path(&path)
        {
            tracing::warn!(path = %path.display(), "failed to load env file: {e}");
        }
    }
}

pub fn load_config() -> AppConfig {
    load_env_files();

    let mut config = config_path()
        .and_then(|path| fs::read_to_string(path).ok())
        .map(|contents| parse_config(&contents))
        .unwrap_or_default();

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

fn parse_config(contents: &str) -> AppConfig {
    toml::from_str(contents).unwrap_or_else(|e| {
        tracing::warn!("invalid config.toml, using defaults: {e}");
        AppConfig::default()
    })
}

fn apply_env_overrides(config: &mut AppConfig, get: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| get(name).filter(|v| !v.is_empty());

    if let Some(url) = get("LINKTUI_API_URL") {
        config.api_base_url = url;
    }
    if let Some(url) = get("LINKTUI_MEDIA_URL") {
        config.media_base_url = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("");
        assert_eq!(config.api_base_url, default_api_base_url());
        assert_eq!(config.signup_redirect_secs, 2);
        assert_eq!(config.default_view, DefaultView::Feed);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse_config(
            r#"
            api_base_url = "http://127.0.0.1:5000"
            default_view = "profile"
            "#,
        );
        assert_eq!(config.api_base_url, "http://127.0.0.1:5000");
        assert_eq!(config.media_base_url, default_media_base_url());
        assert_eq!(config.default_view, DefaultView::Profile);
    }

    #[test]
    fn invalid_file_falls_back() {
        let config = parse_config("tick_rate_fps = \"fast\"");
        assert_eq!(config.tick_rate_fps, 30.0);
    }

    #[test]
    fn env_overrides_apply_and_ignore_empty() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |name| match name {
            "LINKTUI_API_URL" => Some("http://api.local".into()),
            "LINKTUI_MEDIA_URL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "http://api.local");
        assert_eq!(config.media_base_url, default_media_base_url());
    }
}
