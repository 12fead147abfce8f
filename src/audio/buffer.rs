use std::num::NonZeroU32;

use super::resampler::{self, ResampleError, Rounding};

/// A mono block of 16-bit PCM at a known, positive sample rate.
///
/// Stages take the buffer by value and hand a new one to the next stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    samples: Vec<i16>,
    sample_rate: NonZeroU32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<i16>, sample_rate: NonZeroU32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.get()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.samples
    }

    /// Duration in seconds at the buffer's own rate.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate.get() as f64
    }

    /// Convert to `target_rate`, consuming the source buffer.
    pub fn resample(
        self,
        target_rate: NonZeroU32,
        rounding: Rounding,
    ) -> Result<AudioBuffer, ResampleError> {
        let samples = resampler::resample(
            &self.samples,
            self.sample_rate.get(),
            target_rate.get(),
            rounding,
        )?;
        Ok(AudioBuffer::new(samples, target_rate))
    }
}
