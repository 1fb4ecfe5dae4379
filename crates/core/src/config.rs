//! Simulation configuration
//!
//! Every tunable the partitioner, terrain generator and transition engine
//! read lives here, in one immutable value that is validated once and then
//! shared (by reference or clone) with every worker. Nothing downstream
//! reads a global.
//!
//! Two spread presets exist, one per fire model:
//!
//! | parameter | intensity | owned |
//! | --- | --- | --- |
//! | extinguish probability | 0.10 | 0.08 |
//! | ash probability | 0.05 | 0.02 |
//! | ignition cap | 0.8 | 0.7 |
//! | base probability | 0.10 / 0.20 / 0.35 | 0.30 flat |
//! | initial fires | 2..=5 | 1..=3 |

use crate::error::{SimError, SimResult};
use crate::grid::partition::{partition_all, verify_coverage};
use crate::{FuelAge, Wind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Upper bound on worker count (owner ids are `u16`, threads are real)
pub const MAX_WORKERS: usize = 256;

/// Which fire model the transition engine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FireModel {
    /// Shared fire graded Low/Medium/High; any burning neighbor spreads
    #[default]
    Intensity,
    /// Fire tagged with the igniting worker; spreads only within one owner
    Owned,
}

impl fmt::Display for FireModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intensity => f.write_str("intensity"),
            Self::Owned => f.write_str("owned"),
        }
    }
}

impl FromStr for FireModel {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intensity" | "global" | "shared" => Ok(Self::Intensity),
            "owned" | "owner" | "per-process" => Ok(Self::Owned),
            _ => Err(SimError::InvalidFireModel(s.to_string())),
        }
    }
}

/// Half-open uniform range `[low, high)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformRange {
    pub low: f32,
    pub high: f32,
}

impl UniformRange {
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    /// Draw one value; a degenerate range yields `low`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.high > self.low {
            rng.random_range(self.low..self.high)
        } else {
            self.low
        }
    }

    fn validate(&self, field: &'static str) -> SimResult<()> {
        if !self.low.is_finite() || !self.high.is_finite() || self.high <= self.low {
            return Err(SimError::invalid_config(
                field,
                format!("expected finite low < high, got [{}, {})", self.low, self.high),
            ));
        }
        Ok(())
    }
}

/// Categorical weights of the initial cell states
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelWeights {
    pub young: f32,
    pub mature: f32,
    pub old: f32,
    pub empty: f32,
    pub water: f32,
}

impl Default for FuelWeights {
    fn default() -> Self {
        Self {
            young: 0.30,
            mature: 0.40,
            old: 0.20,
            empty: 0.08,
            water: 0.02,
        }
    }
}

impl FuelWeights {
    pub fn total(&self) -> f32 {
        self.young + self.mature + self.old + self.empty + self.water
    }
}

/// Parameters for the i.i.d. terrain fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub fuel_weights: FuelWeights,
    pub elevation: UniformRange,
    pub humidity: UniformRange,
    /// Degrees Celsius
    pub temperature: UniformRange,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            fuel_weights: FuelWeights::default(),
            elevation: UniformRange::new(0.0, 100.0),
            humidity: UniformRange::new(0.3, 0.9),
            temperature: UniformRange::new(20.0, 35.0),
        }
    }
}

impl TerrainParams {
    /// # Errors
    /// Returns [`SimError::InvalidConfig`] on negative weights or empty ranges
    pub fn validate(&self) -> SimResult<()> {
        let w = &self.fuel_weights;
        if [w.young, w.mature, w.old, w.empty, w.water]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(SimError::invalid_config(
                "terrain.fuel_weights",
                "weights must be finite and non-negative",
            ));
        }
        if w.total() <= 0.0 {
            return Err(SimError::invalid_config(
                "terrain.fuel_weights",
                "weights must not all be zero",
            ));
        }
        self.elevation.validate("terrain.elevation")?;
        self.humidity.validate("terrain.humidity")?;
        if self.humidity.low < 0.0 || self.humidity.high > 1.0 {
            return Err(SimError::invalid_config(
                "terrain.humidity",
                "humidity must stay within [0, 1]",
            ));
        }
        self.temperature.validate("terrain.temperature")
    }
}

/// Base spread probability contributed by one burning neighbor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseProbability {
    pub low: f32,
    pub medium: f32,
    pub high: f32,
    /// Flat value used by the owned model
    pub owned: f32,
}

impl Default for BaseProbability {
    fn default() -> Self {
        Self {
            low: 0.10,
            medium: 0.20,
            high: 0.35,
            owned: 0.30,
        }
    }
}

/// Ignitability multiplier per fuel age
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelFactors {
    pub young: f32,
    pub mature: f32,
    pub old: f32,
}

impl Default for FuelFactors {
    fn default() -> Self {
        Self {
            young: 0.8,
            mature: 1.0,
            old: 1.3,
        }
    }
}

impl FuelFactors {
    pub fn for_age(&self, age: FuelAge) -> f32 {
        match age {
            FuelAge::Young => self.young,
            FuelAge::Mature => self.mature,
            FuelAge::Old => self.old,
        }
    }
}

/// Local conditions that pick the intensity of a new fire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    pub high_temperature: f32,
    pub high_humidity: f32,
    pub medium_temperature: f32,
    pub medium_humidity: f32,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            high_temperature: 30.0,
            high_humidity: 0.4,
            medium_temperature: 25.0,
            medium_humidity: 0.6,
        }
    }
}

/// Inclusive range for the number of fire seeding trials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireCountRange {
    pub min: u32,
    pub max: u32,
}

/// Transition rule parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadParams {
    pub model: FireModel,
    pub extinguish_probability: f32,
    /// Checked against the same draw as extinguishing, after it; has no
    /// effect unless it exceeds `extinguish_probability`
    pub intensify_threshold: f32,
    pub ash_probability: f32,
    pub ignition_cap: f32,
    pub base_probability: BaseProbability,
    pub fuel_factor: FuelFactors,
    pub wind_with_gain: f32,
    pub wind_against_damping: f32,
    pub elevation_factor: f32,
    /// Degrees Celsius at which the temperature multiplier is 1
    pub base_temperature: f32,
    pub temperature_gain: f32,
    pub severity: SeverityThresholds,
    pub initial_fires: FireCountRange,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self::intensity()
    }
}

impl SpreadParams {
    /// Shared-fire preset
    pub fn intensity() -> Self {
        Self {
            model: FireModel::Intensity,
            extinguish_probability: 0.10,
            intensify_threshold: 0.05,
            ash_probability: 0.05,
            ignition_cap: 0.8,
            base_probability: BaseProbability::default(),
            fuel_factor: FuelFactors::default(),
            wind_with_gain: 0.3,
            wind_against_damping: 0.1,
            elevation_factor: 0.1,
            base_temperature: 25.0,
            temperature_gain: 0.02,
            severity: SeverityThresholds::default(),
            initial_fires: FireCountRange { min: 2, max: 5 },
        }
    }

    /// Per-worker fire preset
    pub fn owned() -> Self {
        Self {
            model: FireModel::Owned,
            extinguish_probability: 0.08,
            ash_probability: 0.02,
            ignition_cap: 0.7,
            initial_fires: FireCountRange { min: 1, max: 3 },
            ..Self::intensity()
        }
    }

    /// Preset for a model
    pub fn for_model(model: FireModel) -> Self {
        match model {
            FireModel::Intensity => Self::intensity(),
            FireModel::Owned => Self::owned(),
        }
    }

    /// # Errors
    /// Returns [`SimError::InvalidConfig`] for probabilities outside `[0, 1]`
    /// and other out-of-range values
    pub fn validate(&self) -> SimResult<()> {
        let probabilities = [
            ("spread.extinguish_probability", self.extinguish_probability),
            ("spread.intensify_threshold", self.intensify_threshold),
            ("spread.ash_probability", self.ash_probability),
            ("spread.ignition_cap", self.ignition_cap),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::invalid_config(
                    field,
                    format!("probability must be within [0, 1], got {value}"),
                ));
            }
        }
        let b = &self.base_probability;
        if [b.low, b.medium, b.high, b.owned]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(SimError::invalid_config(
                "spread.base_probability",
                "must be finite and non-negative",
            ));
        }
        let f = &self.fuel_factor;
        if [f.young, f.mature, f.old]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(SimError::invalid_config(
                "spread.fuel_factor",
                "must be finite and non-negative",
            ));
        }
        if self.initial_fires.min > self.initial_fires.max {
            return Err(SimError::invalid_config(
                "spread.initial_fires",
                format!(
                    "min {} exceeds max {}",
                    self.initial_fires.min, self.initial_fires.max
                ),
            ));
        }
        Ok(())
    }
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub rows: usize,
    pub cols: usize,
    pub workers: usize,
    pub max_steps: u64,
    /// Run seed; `None` draws one from the OS at startup
    pub seed: Option<u64>,
    /// Pause between rounds, milliseconds
    pub frame_interval_ms: u64,
    /// How long the coordinator waits for worker reports each round
    pub worker_timeout_ms: u64,
    pub wind: Wind,
    pub terrain: TerrainParams,
    pub spread: SpreadParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rows: 60,
            cols: 80,
            workers: 1,
            max_steps: 500,
            seed: None,
            frame_interval_ms: 100,
            worker_timeout_ms: 5_000,
            wind: Wind::default(),
            terrain: TerrainParams::default(),
            spread: SpreadParams::default(),
        }
    }
}

impl SimulationConfig {
    /// Load a JSON config file; missing keys fall back to defaults
    ///
    /// # Errors
    /// Returns [`SimError::ConfigIo`] or [`SimError::ConfigParse`]
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SimError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SimError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Pretty JSON rendering, suitable for writing a starter config file
    ///
    /// # Errors
    /// Returns the serializer error (cannot happen for this type in practice)
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// The configured seed, or a fresh one from the thread rng
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::rng().random())
    }

    /// Check every value before any worker starts
    ///
    /// # Errors
    /// Returns the first configuration error found
    pub fn validate(&self) -> SimResult<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(SimError::invalid_config(
                "rows/cols",
                format!("grid must be non-empty, got {}x{}", self.rows, self.cols),
            ));
        }
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(SimError::InvalidWorkerCount {
                count: self.workers,
                max: MAX_WORKERS,
            });
        }
        if self.worker_timeout_ms == 0 {
            return Err(SimError::invalid_config(
                "worker_timeout_ms",
                "must be positive",
            ));
        }
        if !self.wind.speed.is_finite() || self.wind.speed < 0.0 {
            return Err(SimError::invalid_config(
                "wind.speed",
                format!("must be finite and non-negative, got {}", self.wind.speed),
            ));
        }
        self.terrain.validate()?;
        self.spread.validate()?;

        let regions = partition_all(self.rows, self.cols, self.workers)?;
        if let Some((index, _)) = regions.iter().enumerate().find(|(_, b)| b.is_empty()) {
            return Err(SimError::invalid_config(
                "workers",
                format!(
                    "{}x{} grid is too small for {} workers (region {index} would be empty)",
                    self.rows, self.cols, self.workers
                ),
            ));
        }
        verify_coverage(self.rows, self.cols, &regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.spread.model, FireModel::Intensity);
    }

    #[test]
    fn test_owned_preset() {
        let spread = SpreadParams::owned();
        assert_eq!(spread.model, FireModel::Owned);
        assert_eq!(spread.initial_fires, FireCountRange { min: 1, max: 3 });
        assert!(spread.ignition_cap < SpreadParams::intensity().ignition_cap);
        assert!(spread.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_workers() {
        let config = SimulationConfig {
            workers: 0,
            ..SimulationConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SimError::InvalidWorkerCount { count: 0, .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rejects_grid_too_small_for_workers() {
        let config = SimulationConfig {
            rows: 3,
            cols: 10,
            workers: 4,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidConfig { field: "workers", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_probability() {
        let mut config = SimulationConfig::default();
        config.spread.ignition_cap = 1.5;
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidConfig {
                field: "spread.ignition_cap",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut config = SimulationConfig::default();
        config.terrain.temperature = UniformRange::new(35.0, 20.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "rows": 20, "workers": 4, "spread": { "model": "owned" } }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.rows, 20);
        assert_eq!(config.cols, 80);
        assert_eq!(config.workers, 4);
        assert_eq!(config.spread.model, FireModel::Owned);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = SimulationConfig {
            seed: Some(7),
            spread: SpreadParams::owned(),
            ..SimulationConfig::default()
        };
        let json = config.to_json_pretty().unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_parse_fire_model() {
        assert_eq!("Owned".parse::<FireModel>().unwrap(), FireModel::Owned);
        assert_eq!("intensity".parse::<FireModel>().unwrap(), FireModel::Intensity);
        assert!("lava".parse::<FireModel>().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = SimulationConfig::from_json_file("/nonexistent/fire.json").unwrap_err();
        assert!(matches!(err, SimError::ConfigIo { .. }));
    }
}
