//! Client configuration read from the environment.
//!
//! `main` calls `dotenvy::dotenv()` first, so values may also come from a
//! `.env` file in the working directory.

use reqwest::Url;

use crate::error::{BusTrackerError, Result};

pub const API_KEY_VAR: &str = "CTA_BUS_KEY";
pub const BASE_URL_VAR: &str = "CTA_BUS_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://www.ctabustracker.com/bustime/api/v3/";

#[derive(Clone)]
pub struct BusTrackerConfig {
    api_key: Option<String>,
    pub base_url: Url,
}

impl BusTrackerConfig {
    /// Reads [`API_KEY_VAR`] and [`BASE_URL_VAR`] from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR).filter(|k| !k.trim().is_empty());
        let base_url = lookup(BASE_URL_VAR)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key,
            base_url: parse_base_url(&base_url)?,
        })
    }

    pub fn new(api_key: Option<String>, base_url: &str) -> Result<Self> {
        Ok(Self {
            api_key,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// The configured key.
    ///
    /// # Errors
    ///
    /// [`BusTrackerError::Config`] when [`API_KEY_VAR`] was not set.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| BusTrackerError::Config(format!("{API_KEY_VAR} is not set")))
    }
}

impl std::fmt::Debug for BusTrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusTrackerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

// Endpoint paths are joined onto the base, which needs a trailing slash to keep its last segment.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| BusTrackerError::InvalidUrl(format!("{raw}: {e}")))
}
