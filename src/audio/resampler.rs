use serde::{Deserialize, Serialize};
use std::collections::TryReserveError;
use thiserror::Error;

/// How an interpolated sample is narrowed back to `i16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Round half away from zero.
    #[default]
    Nearest,
    /// Truncate toward zero, matching plain integer narrowing.
    Truncate,
}

impl Rounding {
    fn narrow(self, value: f64) -> i16 {
        let value = match self {
            Rounding::Nearest => value.round(),
            Rounding::Truncate => value.trunc(),
        };
        value.clamp(i16::MIN as f64, i16::MAX as f64) as i16
    }
}

#[derive(Debug, Error)]
#[error("could not allocate {requested} samples: {source}")]
pub struct AllocationError {
    pub requested: usize,
    #[source]
    pub source: TryReserveError,
}

#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("sample rate must be positive (source {source_rate} Hz, target {target_rate} Hz)")]
    ZeroRate { source_rate: u32, target_rate: u32 },
    #[error("cannot resample an empty buffer")]
    EmptySource,
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

/// Number of samples produced when converting `source_len` samples from
/// `from_rate` to `to_rate`, i.e. `floor(source_len * to_rate / from_rate)`.
pub fn output_len(source_len: usize, from_rate: u32, to_rate: u32) -> usize {
    if from_rate == 0 {
        return 0;
    }
    (source_len as u128 * to_rate as u128 / from_rate as u128) as usize
}

/// Resample 16-bit PCM from one sample rate to another using linear interpolation.
/// Returns a verbatim copy if rates match.
///
/// The destination length is fixed up front at `floor(len * to_rate / from_rate)`.
/// Source positions are computed from the exact integer quotient and remainder of
/// `i * from_rate / to_rate`, so integer ratios land exactly on source samples. The
/// right-hand neighbour is clamped to the last source sample.
pub fn resample(
    input: &[i16],
    from_rate: u32,
    to_rate: u32,
    rounding: Rounding,
) -> Result<Vec<i16>, ResampleError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(ResampleError::ZeroRate {
            source_rate: from_rate,
            target_rate: to_rate,
        });
    }
    if from_rate == to_rate {
        return Ok(input.to_vec());
    }
    if input.is_empty() {
        return Err(ResampleError::EmptySource);
    }

    let output_len = output_len(input.len(), from_rate, to_rate);
    let mut output = Vec::new();
    output
        .try_reserve_exact(output_len)
        .map_err(|source| AllocationError {
            requested: output_len,
            source,
        })?;

    let last = input.len() - 1;
    let from = from_rate as u64;
    let to = to_rate as u64;

    for i in 0..output_len as u64 {
        let scaled = i * from;
        let idx_floor = (scaled / to) as usize;
        let frac = (scaled % to) as f64 / to as f64;
        let idx_next = (idx_floor + 1).min(last);

        let left = input[idx_floor] as f64;
        let right = input[idx_next] as f64;
        let sample = left + (right - left) * frac;
        output.push(rounding.narrow(sample));
    }

    Ok(output)
}
