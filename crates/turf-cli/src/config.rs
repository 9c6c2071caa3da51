//! Server configuration: an optional `turf.toml` plus environment
//! overrides. Everything has a workable default so `turf serve` runs
//! with no file at all.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use turf_core::Tunables;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listen address for `turf serve`.
    pub listen: Option<String>,
    /// Public hostname advertised in the version document.
    pub endpoint: Option<String>,
    /// Admin key gating hotspot installation over HTTP.
    /// `TURF_ADMIN_KEY` wins over this.
    pub admin_key: Option<String>,
    /// Gameplay overrides; omitted fields keep their defaults.
    pub tunables: Tunables,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn listen(&self) -> &str {
        self.listen.as_deref().unwrap_or(DEFAULT_LISTEN)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_LISTEN)
    }
}
