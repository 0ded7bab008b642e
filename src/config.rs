//! Environment-based configuration

use std::env;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    #[allow(dead_code)]
    pub cors_origins: Vec<String>,
    pub reap: ReapConfig,
    pub log_level: String,
}

/// Inactive-room reclamation settings
#[derive(Debug, Clone)]
pub struct ReapConfig {
    /// Rooms idle longer than this are deleted
    pub threshold_hours: u64,
    /// Sweep cadence in seconds
    pub sweep_interval_secs: u64,
}

impl ReapConfig {
    pub fn threshold_ms(&self) -> u64 {
        self.threshold_hours * 60 * 60 * 1000
    }
}

impl Config {
    /// Load settings from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .unwrap_or(4000),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            cors_origins: env::var("FRONTEND_URLS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            reap: ReapConfig {
                threshold_hours: env::var("REAP_AFTER_HOURS")
                    .unwrap_or_else(|_| "72".to_string())
                    .parse()
                    .unwrap_or(72),
                sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .unwrap_or(3600),
            },
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}
