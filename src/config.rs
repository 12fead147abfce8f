use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use thiserror::Error;

use crate::audio::resampler::Rounding;
use crate::filter::noise_remover::NoiseRemoverParams;

/// Working rate the noise remover is tuned for.
pub const DEFAULT_TARGET_SAMPLE_RATE: u32 = 8000;
/// Appended to the input file stem when no output path is given.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_out";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target sample rate must be positive")]
    ZeroTargetRate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub target_sample_rate: u32,
    pub rounding: Rounding,
    /// Keep adapting the noise model while filtering.
    pub training: bool,
    pub filter: NoiseRemoverParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: DEFAULT_TARGET_SAMPLE_RATE,
            rounding: Rounding::default(),
            training: true,
            filter: NoiseRemoverParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Returns the target rate, rejecting zero.
    pub fn validate(&self) -> Result<NonZeroU32, ConfigError> {
        NonZeroU32::new(self.target_sample_rate).ok_or(ConfigError::ZeroTargetRate)
    }
}
