//! Configuration module

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Threshold applied until an administrator changes it
pub const DEFAULT_THRESHOLD: f64 = 0.90;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Directory holding the photo slot and the persisted threshold
    pub data_dir: PathBuf,

    /// Threshold used when nothing has been persisted yet
    pub default_threshold: f64,

    /// Upper bound on a single similarity computation
    pub scorer_timeout: Duration,

    /// Maximum accepted request body for uploads
    pub max_upload_bytes: usize,

    /// Built client to serve for non-API routes
    pub static_dir: Option<PathBuf>,

    /// Log output format ("text" or "json")
    pub log_format: String,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default_threshold = env::var("DEFAULT_THRESHOLD")
            .ok()
            .and_then(|t| t.parse::<f64>().ok())
            .filter(|t| (0.0..=1.0).contains(t))
            .unwrap_or(DEFAULT_THRESHOLD);

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),

            default_threshold,

            scorer_timeout: Duration::from_millis(
                env::var("SCORER_TIMEOUT_MS")
                    .ok()
                    .and_then(|ms| ms.parse().ok())
                    .unwrap_or(10_000),
            ),

            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(20 * 1024 * 1024),

            static_dir: env::var("STATIC_DIR").ok().map(PathBuf::from),

            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string()),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Configuration rooted at `data_dir` with every other value at its default
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            port: 8080,
            data_dir: data_dir.into(),
            default_threshold: DEFAULT_THRESHOLD,
            scorer_timeout: Duration::from_secs(10),
            max_upload_bytes: 20 * 1024 * 1024,
            static_dir: None,
            log_format: "text".to_string(),
            environment: "development".to_string(),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether logs should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_data_dir_defaults() {
        let config = Config::with_data_dir("/tmp/photo-match");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/photo-match"));
        assert_eq!(config.default_threshold, DEFAULT_THRESHOLD);
        assert!(config.static_dir.is_none());
        assert!(!config.is_production());
        assert!(!config.json_logs());
    }
}
