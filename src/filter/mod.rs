pub mod adapter;
pub mod noise_remover;
pub mod worker;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterInitError {
    #[error("invalid filter parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("filter worker failed to start: {0}")]
    Worker(String),
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("filter failed: {0}")]
    Failed(String),
    #[error("filter worker disconnected after {processed} samples")]
    Disconnected { processed: usize },
}

/// A stateful per-sample filter. Every call advances its internal state, so
/// samples must be fed in order.
pub trait AdaptiveFilter {
    /// Filters one sample. With `training` set the filter keeps adapting its
    /// noise model; otherwise the model is frozen.
    fn apply(&mut self, sample: i16, training: bool) -> Result<i16, FilterError>;
}

/// Creates a fresh filter state for one run.
pub trait FilterProvider {
    type Filter: AdaptiveFilter;

    fn init(&self) -> Result<Self::Filter, FilterInitError>;
}
