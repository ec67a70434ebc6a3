use config::{Config, Environment};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATA_PATH: &str = "data/state.json";
const DEFAULT_SPORTSDB_URL: &str = "https://www.thesportsdb.com/api/v1/json";
const DEFAULT_SPORTSDB_KEY: &str = "3";
const MAX_SESSION_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub environment: Option<String>,
    pub port: Option<u16>,
    pub app_data_path: Option<String>,
    pub cors_origins: Option<String>,
    pub sportsdb_base_url: Option<String>,
    pub sportsdb_api_key: Option<String>,
    pub sportsdb_enabled: Option<bool>,
    pub session_ttl_days: Option<i64>,
    pub session_sweep_secs: Option<u64>,
}

impl Settings {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(
            self.app_data_path
                .as_deref()
                .filter(|path| !path.trim().is_empty())
                .unwrap_or(DEFAULT_DATA_PATH),
        )
    }

    pub fn is_production(&self) -> bool {
        matches!(
            self.environment.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("production") | Some("prod")
        )
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn sportsdb_base_url(&self) -> String {
        self.sportsdb_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SPORTSDB_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn sportsdb_api_key(&self) -> String {
        self.sportsdb_api_key
            .clone()
            .unwrap_or_else(|| DEFAULT_SPORTSDB_KEY.to_string())
    }

    pub fn sportsdb_enabled(&self) -> bool {
        self.sportsdb_enabled.unwrap_or(true)
    }

    pub fn session_ttl_days(&self) -> i64 {
        self.session_ttl_days
            .filter(|days| (1..=MAX_SESSION_TTL_DAYS).contains(days))
            .unwrap_or(7)
    }

    pub fn session_sweep_secs(&self) -> u64 {
        self.session_sweep_secs.filter(|secs| *secs > 0).unwrap_or(3600)
    }
}

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let settings = Config::builder().add_source(Environment::default());
    settings.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let settings = Settings::default();
        assert_eq!(settings.port(), 8000);
        assert_eq!(settings.data_path(), PathBuf::from("data/state.json"));
        assert!(settings.sportsdb_enabled());
        assert_eq!(settings.session_ttl_days(), 7);
        assert!(!settings.is_production());
        assert!(settings.cors_origins().is_empty());
    }

    #[test]
    fn session_ttl_outside_range_falls_back() {
        for days in [0, -3, i64::MAX] {
            let settings = Settings {
                session_ttl_days: Some(days),
                ..Settings::default()
            };
            assert_eq!(settings.session_ttl_days(), 7);
        }
        let month = Settings {
            session_ttl_days: Some(30),
            ..Settings::default()
        };
        assert_eq!(month.session_ttl_days(), 30);
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let settings = Settings {
            cors_origins: Some(" https://a.example , ,https://b.example".to_string()),
            ..Settings::default()
        };
        assert_eq!(
            settings.cors_origins(),
            vec!["https://a.example", "https://b.example"]
        );
    }
}
