use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct TrialgateConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub socket_path: String,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Timing knobs for the demo session lifecycle. All durations are minutes.
#[derive(Debug, Deserialize, Clone)]
pub struct DemoConfig {
    /// Total lifetime granted at creation.
    pub duration_minutes: i64,
    /// Amount added to `expires_at` by a qualifying activity extension.
    pub extension_minutes: i64,
    /// Activity only extends when remaining time is at or below this.
    pub extension_threshold_minutes: i64,
    /// How often the sweeper scans for expired sessions.
    pub sweep_interval_minutes: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            duration_minutes: 45,
            extension_minutes: 5,
            extension_threshold_minutes: 10,
            sweep_interval_minutes: 5,
        }
    }
}

/// Which user-store/seeder backend to wire up at startup.
/// "postgres" for real deployments, "memory" for local development.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "postgres".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8750,
        }
    }
}

impl TrialgateConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_defaults_match_product_constants() {
        let demo = DemoConfig::default();
        assert_eq!(demo.duration_minutes, 45);
        assert_eq!(demo.extension_minutes, 5);
        assert_eq!(demo.extension_threshold_minutes, 10);
        assert_eq!(demo.sweep_interval_minutes, 5);
    }

    #[test]
    fn test_http_defaults() {
        let http = HttpConfig::default();
        assert!(http.enabled);
        assert_eq!(http.port, 8750);
    }
}
