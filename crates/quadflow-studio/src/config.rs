//! Studio configuration, loaded from TOML.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) runs the stock demo.

use std::path::Path;

use quadflow_engine::batch::{BatcherConfig, ChunkSizes};
use quadflow_engine::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub simulation: SimulationConfig,
    pub batching: BatchingConfig,
    pub logging: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub sprite_count: usize,
    pub frames: u64,

    pub speed_min: f32,
    pub speed_max: f32,
    pub scale_min: f32,
    pub scale_max: f32,

    /// Half the visible height; bounds are `±half_height` by `±half_height * aspect`.
    pub half_height: f32,
    pub aspect: f32,

    /// Fixed seconds per frame; measured (clamped) time when absent.
    pub fixed_delta: Option<f32>,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sprite_count: 1000,
            frames: 600,
            speed_min: 0.05,
            speed_max: 1.0,
            scale_min: 0.5,
            scale_max: 2.0,
            half_height: 5.0,
            aspect: 16.0 / 9.0,
            fixed_delta: Some(1.0 / 60.0),
            seed: None,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    #[default]
    Jobified,
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    pub mode: BatchMode,
    pub update_chunk: usize,
    pub vertex_chunk: usize,
    pub index_chunk: usize,
    pub extended_uv_channels: bool,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            mode: BatchMode::Jobified,
            update_chunk: 64,
            vertex_chunk: ChunkSizes::DEFAULT_VERTEX,
            index_chunk: ChunkSizes::DEFAULT_INDEX,
            extended_uv_channels: false,
        }
    }
}

impl BatchingConfig {
    pub fn chunk_sizes(&self) -> ChunkSizes {
        ChunkSizes {
            vertex: self.vertex_chunk,
            index: self.index_chunk,
        }
    }

    pub fn batcher_config(&self) -> BatcherConfig {
        BatcherConfig {
            extended_uv_channels: self.extended_uv_channels,
            ..BatcherConfig::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `env_logger` filter string; `RUST_LOG` or `info` when absent.
    pub filter: Option<String>,
}

impl LogConfig {
    pub fn to_logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.filter.clone(),
            ..LoggingConfig::default()
        }
    }
}

impl StudioConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if !(sim.speed_min <= sim.speed_max) {
            return Err(ConfigError::Invalid(format!(
                "speed_min {} exceeds speed_max {}",
                sim.speed_min, sim.speed_max
            )));
        }
        if !(sim.scale_min <= sim.scale_max) {
            return Err(ConfigError::Invalid(format!(
                "scale_min {} exceeds scale_max {}",
                sim.scale_min, sim.scale_max
            )));
        }
        if !(sim.half_height > 0.0 && sim.aspect > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "bounds must be positive (half_height {}, aspect {})",
                sim.half_height, sim.aspect
            )));
        }
        if self.batching.update_chunk == 0 || self.batching.vertex_chunk == 0 || self.batching.index_chunk == 0 {
            return Err(ConfigError::Invalid("chunk sizes must be at least 1".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = StudioConfig::from_toml_str("").unwrap();
        assert_eq!(config, StudioConfig::default());
        assert_eq!(config.batching.chunk_sizes(), ChunkSizes::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = StudioConfig::from_toml_str(
            r#"
            [simulation]
            sprite_count = 20000
            seed = 7

            [batching]
            mode = "immediate"
            extended_uv_channels = true

            [logging]
            filter = "quadflow_engine=debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.sprite_count, 20000);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.speed_max, 1.0);
        assert_eq!(config.batching.mode, BatchMode::Immediate);
        assert!(config.batching.batcher_config().extended_uv_channels);
        assert_eq!(config.batching.vertex_chunk, ChunkSizes::DEFAULT_VERTEX);
        assert_eq!(
            config.logging.to_logging_config().env_filter.as_deref(),
            Some("quadflow_engine=debug")
        );
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = StudioConfig::from_toml_str("[simulation\nsprite_count = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = StudioConfig::from_toml_str("[batching]\nmode = \"deferred\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let err = StudioConfig::from_toml_str("[simulation]\nspeed_min = 2.0\nspeed_max = 1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = StudioConfig::from_toml_str("[batching]\nvertex_chunk = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = StudioConfig::load("/nonexistent/quadflow.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
