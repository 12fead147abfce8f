use serde::Serialize;
use thiserror::Error;

use crate::audio::resampler::{AllocationError, ResampleError};
use crate::audio::wav::CodecError;
use crate::config::ConfigError;
use crate::filter::{FilterError, FilterInitError};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("expected mono input, found {0} channels")]
    UnsupportedChannels(u16),
    #[error("input declares a sample rate of 0 Hz")]
    ZeroSampleRate,
    #[error("input contains no samples")]
    Empty,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("short write: {written} of {requested} samples")]
    ShortWrite { written: usize, requested: usize },
}

/// Why a run stopped. Every variant is fatal for the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("buffer allocation failed: {0}")]
    Allocation(#[from] AllocationError),
    #[error("filter initialization failed: {0}")]
    FilterInit(#[from] FilterInitError),
    #[error("filtering failed: {0}")]
    Filter(#[from] FilterError),
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),
}

impl From<ResampleError> for PipelineError {
    fn from(err: ResampleError) -> Self {
        match err {
            ResampleError::Allocation(e) => PipelineError::Allocation(e),
            ResampleError::ZeroRate { .. } => PipelineError::Decode(DecodeError::ZeroSampleRate),
            ResampleError::EmptySource => PipelineError::Decode(DecodeError::Empty),
        }
    }
}

/// Exit code for malformed command lines.
pub const USAGE_EXIT_CODE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Config,
    Decode,
    Allocation,
    FilterInit,
    Filter,
    Encode,
}

impl FailureKind {
    /// Process exit code the command line reports for this kind. `1` and
    /// `USAGE_EXIT_CODE` are reserved for other failures.
    pub fn exit_code(self) -> i32 {
        match self {
            FailureKind::Config => 3,
            FailureKind::Decode => 4,
            FailureKind::Allocation => 5,
            FailureKind::FilterInit => 6,
            FailureKind::Filter => 7,
            FailureKind::Encode => 8,
        }
    }
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Config(_) => FailureKind::Config,
            PipelineError::Decode(_) => FailureKind::Decode,
            PipelineError::Allocation(_) => FailureKind::Allocation,
            PipelineError::FilterInit(_) => FailureKind::FilterInit,
            PipelineError::Filter(_) => FailureKind::Filter,
            PipelineError::Encode(_) => FailureKind::Encode,
        }
    }
}
