use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub mbta_api_key: String,
    pub mbta_base_url: String,
    pub ors_api_key: String,
    pub ors_base_url: String,
    pub bind_addr: String,
    pub upstream_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();
        let upstream_timeout_secs = match env::var("UPSTREAM_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                anyhow::anyhow!(
                    "UPSTREAM_TIMEOUT_SECS must be a whole number of seconds, got {:?}",
                    raw
                )
            })?,
            Err(_) => defaults.upstream_timeout_secs,
        };

        // Missing keys are not fatal: both upstreams accept anonymous, rate-limited traffic.
        Ok(Config {
            mbta_api_key: env::var("MBTA_API_KEY").unwrap_or_default(),
            mbta_base_url: env::var("MBTA_BASE_URL").unwrap_or(defaults.mbta_base_url),
            ors_api_key: env::var("ORS_API_KEY").unwrap_or_default(),
            ors_base_url: env::var("ORS_BASE_URL").unwrap_or(defaults.ors_base_url),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            upstream_timeout_secs,
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mbta_api_key: String::new(),
            mbta_base_url: "https://api-v3.mbta.com".to_string(),
            ors_api_key: String::new(),
            ors_base_url: "https://api.openrouteservice.org".to_string(),
            bind_addr: "0.0.0.0:8080".to_string(),
            upstream_timeout_secs: 10,
        }
    }
}
