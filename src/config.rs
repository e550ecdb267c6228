use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{CONFIG_PATH_ENV, DEFAULT_CENTER, MIN_SEVERITY_SCORE};
use crate::feeds::{state_code, EarthquakeFeed, UnknownFeed};
use crate::geo::{Coordinate, CoordinateError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("{0} must be at least one second")]
    ZeroInterval(&'static str),
    #[error("alert_states entry '{0}' is not a two-letter state code")]
    AlertState(String),
    #[error(transparent)]
    Feed(#[from] UnknownFeed),
    #[error("invalid default center: {0}")]
    Center(#[from] CoordinateError),
}

/// Defaults, then the TOML file named in `DISASTER_MAP_CONFIG`, then env overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run background feed polling.
    pub poll_enabled: bool,
    pub earthquake_feed: String,
    pub earthquake_poll_secs: u64,
    pub alert_poll_secs: u64,
    /// State codes polled for NWS alerts; empty disables alert polling.
    pub alert_states: Vec<String>,
    /// `[longitude, latitude]` used for geocode misses.
    pub default_center: [f64; 2],
    /// Damage-model floor so zero-impact events stay visible.
    pub min_score: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_enabled: true,
            earthquake_feed: EarthquakeFeed::default().to_string(),
            earthquake_poll_secs: 120,
            alert_poll_secs: 300,
            alert_states: Vec::new(),
            default_center: [DEFAULT_CENTER.0, DEFAULT_CENTER.1],
            min_score: MIN_SEVERITY_SCORE,
        }
    }
}

impl Config {
    /// Loads the config file (if any) and applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies `DISASTER_MAP_*` overrides read through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("DISASTER_MAP_POLL") {
            self.poll_enabled = parse_bool(&v).ok_or(ConfigError::InvalidEnv {
                key: "DISASTER_MAP_POLL",
                value: v,
            })?;
        }
        if let Some(v) = lookup("DISASTER_MAP_EARTHQUAKE_FEED") {
            self.earthquake_feed = v;
        }
        if let Some(v) = lookup("DISASTER_MAP_EARTHQUAKE_POLL_SECS") {
            self.earthquake_poll_secs = parse_secs("DISASTER_MAP_EARTHQUAKE_POLL_SECS", v)?;
        }
        if let Some(v) = lookup("DISASTER_MAP_ALERT_POLL_SECS") {
            self.alert_poll_secs = parse_secs("DISASTER_MAP_ALERT_POLL_SECS", v)?;
        }
        if let Some(v) = lookup("DISASTER_MAP_ALERT_STATES") {
            self.alert_states = v
                .split(',')
                .map(|s| s.trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        Ok(())
    }

    /// Checks every value and upper-cases `alert_states`.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.earthquake_feed()?;
        self.default_center()?;
        for (key, secs) in [
            ("earthquake_poll_secs", self.earthquake_poll_secs),
            ("alert_poll_secs", self.alert_poll_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::ZeroInterval(key));
            }
        }
        self.alert_states = self
            .alert_states
            .iter()
            .map(|s| state_code(s).ok_or_else(|| ConfigError::AlertState(s.clone())))
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    pub fn earthquake_feed(&self) -> Result<EarthquakeFeed, UnknownFeed> {
        self.earthquake_feed.parse()
    }

    pub fn default_center(&self) -> Result<Coordinate, CoordinateError> {
        Coordinate::new(self.default_center[0], self.default_center[1])
    }

    pub fn earthquake_interval(&self) -> Duration {
        Duration::from_secs(self.earthquake_poll_secs.max(1))
    }

    pub fn alert_interval(&self) -> Duration {
        Duration::from_secs(self.alert_poll_secs.max(1))
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_secs(key: &'static str, v: String) -> Result<u64, ConfigError> {
    match v.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidEnv { key, value: v }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let mut config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.earthquake_interval(), Duration::from_secs(120));
        assert_eq!(config.alert_interval(), Duration::from_secs(300));
        assert_eq!(config.min_score, 10.0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            earthquake_feed = "significant_week"
            alert_states = ["NC", "SC"]
            "#,
        )
        .unwrap();
        assert_eq!(config.earthquake_feed().unwrap().to_string(), "significant_week");
        assert_eq!(config.alert_states, ["NC", "SC"]);
        assert_eq!(config.alert_poll_secs, 300);
        assert!(config.poll_enabled);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            Config::from_toml("alert_poll_secs = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DISASTER_MAP_POLL", "off"),
            ("DISASTER_MAP_ALERT_STATES", "nc, fl,,"),
            ("DISASTER_MAP_ALERT_POLL_SECS", "600"),
        ]);
        let mut config = Config::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert!(!config.poll_enabled);
        assert_eq!(config.alert_states, ["NC", "FL"]);
        assert_eq!(config.alert_poll_secs, 600);
    }

    #[test]
    fn bad_env_values_are_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(|k| (k == "DISASTER_MAP_EARTHQUAKE_POLL_SECS").then(|| "0".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                key: "DISASTER_MAP_EARTHQUAKE_POLL_SECS",
                ..
            }
        ));

        let mut config = Config {
            earthquake_feed: "everything".into(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Feed(_))));

        let mut config = Config {
            default_center: [200.0, 0.0],
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Center(_))));
    }

    #[test]
    fn toml_alert_states_are_normalized() {
        let mut config = Config::from_toml(r#"alert_states = [" nc", "Fl"]"#).unwrap();
        config.validate().unwrap();
        assert_eq!(config.alert_states, ["NC", "FL"]);

        let mut config = Config::from_toml(r#"alert_states = ["nc", "North Carolina"]"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AlertState(s)) if s == "North Carolina"
        ));
    }

    #[test]
    fn zero_intervals_from_toml_are_rejected() {
        for text in ["earthquake_poll_secs = 0", "alert_poll_secs = 0"] {
            let mut config = Config::from_toml(text).unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::ZeroInterval(_))),
                "{text}"
            );
        }
    }
}
