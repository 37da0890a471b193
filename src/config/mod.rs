use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::provider::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::proxy::RelayPolicy;

pub const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "VITE_GEMINI_API_KEY"];

/// Settings shared by `serve` and the wizard. The provider key is not part of
/// this struct: it only ever comes from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: String,
    pub model: String,
    pub api_base: String,
    pub relay: RelayPolicy,
    pub proxy_url: String,
    pub grounding: bool,
    pub expect_json: bool,
    /// Applies to client -> proxy and proxy -> Gemini. `None` keeps reqwest's default.
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".into(),
            model: DEFAULT_MODEL.into(),
            api_base: DEFAULT_API_BASE.into(),
            relay: RelayPolicy::Strict,
            proxy_url: "http://127.0.0.1:8787/recommend".into(),
            grounding: true,
            expect_json: true,
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Defaults, then the optional TOML file, then environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(Path::new(p))?,
            None => Self::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var("GIFT_BIND") {
            self.bind = v;
        }
        if let Some(v) = var("GEMINI_MODEL") {
            self.model = v;
        }
        if let Some(v) = var("GEMINI_API_BASE") {
            self.api_base = v;
        }
        if let Some(v) = var("GIFT_PROXY_URL") {
            self.proxy_url = v;
        }
        if let Some(v) = var("GIFT_RELAY_POLICY") {
            self.relay = <RelayPolicy as clap::ValueEnum>::from_str(&v, true)
                .map_err(|e| anyhow::anyhow!("GIFT_RELAY_POLICY: {e}"))?;
        }
        if let Some(v) = var("GIFT_CLIENT_TIMEOUT_SECS") {
            let secs = v
                .parse()
                .with_context(|| format!("GIFT_CLIENT_TIMEOUT_SECS is not a number: {v}"))?;
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }
}

/// First non-empty key among [`API_KEY_VARS`].
pub fn api_key_from_env() -> Option<String> {
    api_key_from(|k| std::env::var(k).ok())
}

fn api_key_from<F>(var: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS
        .iter()
        .filter_map(|k| var(*k))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
