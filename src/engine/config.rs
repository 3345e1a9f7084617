// Wardsim Engine — Service Configuration
//
// A single TOML file (default `wardsim.toml` next to the binary) with env
// overrides for the deployment-specific bits. The Gemini API key is never
// read from the file, only from GEMINI_API_KEY.

use crate::atoms::constants::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_PERSONA_PROMPT,
    DEFAULT_PROVIDER_TIMEOUT_SECS,
};
use crate::atoms::error::EngineResult;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Provider settings ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Populated from the environment, never serialized.
    #[serde(skip)]
    pub api_key: String,
    /// End-to-end bound on one generative call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings {
            base_url: default_base_url(),
            model: default_model(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ── Service config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address to bind — "127.0.0.1" (local only) or "0.0.0.0" (LAN).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// JSON rules file (the canonical learned-response store).
    #[serde(default = "default_rules_path")]
    pub rules_path: PathBuf,
    /// SQLite turn-log database.
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    /// System instruction for the generative collaborator.
    #[serde(default = "default_persona_prompt")]
    pub persona_prompt: String,
    #[serde(default)]
    pub provider: ProviderSettings,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_address: default_bind_address(),
            port: default_port(),
            rules_path: default_rules_path(),
            history_path: default_history_path(),
            persona_prompt: default_persona_prompt(),
            provider: ProviderSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration: TOML file if present, defaults otherwise, env
    /// overrides last. A missing file is normal; a malformed file is an
    /// error (silently ignoring a broken config hides real mistakes).
    pub fn load(path: &Path) -> EngineResult<Config> {
        let mut config = if path.exists() {
            info!("[config] Loading {}", path.display());
            let raw = std::fs::read_to_string(path)?;
            toml::from_str(&raw)
                .map_err(|e| format!("parse {}: {}", path.display(), e))?
        } else {
            info!("[config] {} not found, using defaults", path.display());
            Config::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Environment overrides: WARDSIM_BIND, WARDSIM_PORT, GEMINI_API_KEY.
    fn apply_env(&mut self) {
        if let Ok(bind) = std::env::var("WARDSIM_BIND") {
            self.bind_address = bind;
        }
        if let Ok(port) = std::env::var("WARDSIM_PORT") {
            match port.parse() {
                Ok(p) => self.port = p,
                Err(_) => warn!("[config] Ignoring non-numeric WARDSIM_PORT={}", port),
            }
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.provider.api_key = key;
        }
        if self.provider.api_key.is_empty() {
            warn!("[config] GEMINI_API_KEY not set — fallback turns will degrade to scripted lines");
        }
    }
}

// ── Defaults ───────────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    3000
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wardsim")
}

fn default_rules_path() -> PathBuf {
    data_dir().join("responses.json")
}

fn default_history_path() -> PathBuf {
    data_dir().join("history.db")
}

fn default_persona_prompt() -> String {
    DEFAULT_PERSONA_PROMPT.to_string()
}

fn default_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.into()
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.into()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_SECS
}
