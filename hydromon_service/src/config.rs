//! Alert threshold configuration.
//!
//! Every threshold, lookback depth and rule toggle the engine consults is
//! an explicit field here rather than ambient state. Defaults reproduce the
//! thresholds operators have been working with; a TOML file may override
//! any subset of them:
//!
//! ```toml
//! low_battery_volts = 11.0
//!
//! [epan]
//! depth_change_mm = 20.0
//!
//! [level]
//! absolute_bound = true
//! ```

use crate::alert::AlertCategory;
use crate::logging::{self, Component};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// Rule sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EpanConfig {
    /// Prior consecutive days that must match the current depth.
    pub constant_days: u32,
    /// Days searched backward for the depth-change comparison.
    pub lookback_days: u32,
    /// Absolute day-over-day change that fires `DepthChange`.
    pub depth_change_mm: f64,
    /// Depth at or below this fires `WaterDepthThreshold`.
    pub min_depth_mm: f64,
    /// Depth at or above this fires `WaterDepthThreshold`.
    pub max_depth_mm: f64,
}

impl Default for EpanConfig {
    fn default() -> Self {
        Self {
            constant_days: 3,
            lookback_days: 10,
            depth_change_mm: 15.0,
            min_depth_mm: 50.0,
            max_depth_mm: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub heavy_rain_mm: f64,
    pub high_wind: f64,
    pub legacy_rainfall_mm: f64,
    pub high_temperature: f64,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            heavy_rain_mm: 100.0,
            high_wind: 30.0,
            legacy_rainfall_mm: 50.0,
            high_temperature: 40.0,
        }
    }
}

/// River/Dam rules. The two variants are independent: the daily alert view
/// compares against the previous day, the overview map uses absolute bounds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub lookback_diff: bool,
    pub absolute_bound: bool,
    pub lookback_days: u32,
    pub level_change_m: f64,
    pub min_level_m: f64,
    pub max_level_m: f64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            lookback_diff: true,
            absolute_bound: false,
            lookback_days: 10,
            level_change_m: 1.0,
            min_level_m: 0.0,
            max_level_m: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// A gate channel strictly above this opening is reported open.
    pub open_above: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { open_above: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArsConfig {
    pub heavy_rain_mm: f64,
}

impl Default for ArsConfig {
    fn default() -> Self {
        Self { heavy_rain_mm: 100.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReceptionConfig {
    /// Hourly data points expected per day with data.
    pub expected_per_day: u32,
    /// Locations below this percentage are flagged.
    pub alert_below_percent: f64,
}

impl Default for ReceptionConfig {
    fn default() -> Self {
        Self {
            expected_per_day: 24,
            alert_below_percent: 90.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub low_battery_volts: f64,
    /// Categories to evaluate. `None` enables every category.
    pub enabled: Option<Vec<AlertCategory>>,
    pub epan: EpanConfig,
    pub aws: AwsConfig,
    pub level: LevelConfig,
    pub gate: GateConfig,
    pub ars: ArsConfig,
    pub reception: ReceptionConfig,
    /// Maximum rows fetched per station table.
    pub row_limit: u32,
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            low_battery_volts: 10.5,
            enabled: None,
            epan: EpanConfig::default(),
            aws: AwsConfig::default(),
            level: LevelConfig::default(),
            gate: GateConfig::default(),
            ars: ArsConfig::default(),
            reception: ReceptionConfig::default(),
            row_limit: 10_000,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl AlertConfig {
    /// Returns `true` if the category should be evaluated.
    pub fn is_enabled(&self, category: AlertCategory) -> bool {
        self.enabled
            .as_ref()
            .map(|list| list.contains(&category))
            .unwrap_or(true)
    }

    /// Restricts evaluation to the given categories.
    pub fn with_enabled(mut self, categories: &[AlertCategory]) -> Self {
        self.enabled = Some(categories.to_vec());
        self
    }

    /// Checks values that would make rules meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.epan.constant_days == 0 {
            return Err(ConfigError::Invalid("epan.constant_days must be at least 1".into()));
        }
        if self.epan.lookback_days == 0 || self.level.lookback_days == 0 {
            return Err(ConfigError::Invalid("lookback_days must be at least 1".into()));
        }
        if self.epan.min_depth_mm >= self.epan.max_depth_mm {
            return Err(ConfigError::Invalid(
                "epan.min_depth_mm must be below epan.max_depth_mm".into(),
            ));
        }
        if self.level.min_level_m >= self.level.max_level_m {
            return Err(ConfigError::Invalid(
                "level.min_level_m must be below level.max_level_m".into(),
            ));
        }
        if self.reception.expected_per_day == 0 {
            return Err(ConfigError::Invalid("reception.expected_per_day must be at least 1".into()));
        }
        if self.row_limit == 0 {
            return Err(ConfigError::Invalid("row_limit must be at least 1".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Could not read config: {}", e),
            ConfigError::Parse(e) => write!(f, "Could not parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Parses and validates a TOML config document.
pub fn parse_config(text: &str) -> Result<AlertConfig, ConfigError> {
    let config: AlertConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Loads a config file. A missing file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<AlertConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        logging::info(
            Component::Config,
            None,
            &format!("No config at {}, using default thresholds", path.display()),
        );
        return Ok(AlertConfig::default());
    }
    let text = std::fs::read_to_string(path)?;
    let config = parse_config(&text)?;
    logging::info(
        Component::Config,
        None,
        &format!("Loaded config from {}", path.display()),
    );
    if let Some(enabled) = &config.enabled {
        let names: Vec<String> = enabled.iter().map(|c| c.to_string()).collect();
        logging::info(
            Component::Config,
            None,
            &format!("Only these alert categories are enabled: {}", names.join(", ")),
        );
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
