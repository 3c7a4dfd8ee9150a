//! Settings loader — reads `~/.switchboard/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Settings::default()`)
//! 2. JSON file at `~/.switchboard/config.json` (or an explicit path)
//! 3. Environment variables (override JSON)
//!
//! Provider keys use the conventional vendor variable names
//! (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `GOOGLE_API_KEY`,
//! `OPENAI_ORGANIZATION_ID`); server fields use `SWITCHBOARD_SERVER__*`.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::schema::Settings;

/// Default config file path (`~/.switchboard/config.json`).
pub fn get_config_path() -> PathBuf {
    let home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".switchboard").join("config.json")
}

/// Load settings from the default path + env vars.
///
/// Falls back to `Settings::default()` if the file doesn't exist or can't be
/// parsed.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    load_from_path(&config_path)
}

/// Load settings from a specific file path.
fn load_from_path(path: &Path) -> Settings {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Settings::default());
    }

    debug!("Loading settings from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Settings::default());
        }
    };

    let settings: Settings = match serde_json::from_str(&content) {
        Ok(s) => s,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Settings::default());
        }
    };

    apply_env_overrides(settings)
}

/// Apply environment variable overrides on top of loaded settings.
fn apply_env_overrides(mut settings: Settings) -> Settings {
    // Server
    if let Ok(val) = std::env::var("SWITCHBOARD_SERVER__HOST") {
        settings.server.host = val;
    }
    if let Ok(val) = std::env::var("SWITCHBOARD_SERVER__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            settings.server.port = p;
        }
    }
    if let Ok(val) = std::env::var("SWITCHBOARD_SERVER__DEBUG") {
        settings.server.debug = val == "true" || val == "1";
    }

    // Provider credentials (conventional vendor variable names)
    if let Ok(val) = std::env::var("OPENAI_API_KEY") {
        settings.providers.openai.api_key = val;
    }
    if let Ok(val) = std::env::var("OPENAI_ORGANIZATION_ID") {
        settings.providers.openai.organization_id = Some(val);
    }
    if let Ok(val) = std::env::var("ANTHROPIC_API_KEY") {
        settings.providers.anthropic.api_key = val;
    }
    if let Ok(val) = std::env::var("GOOGLE_API_KEY") {
        settings.providers.google.api_key = val;
    }

    settings
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
