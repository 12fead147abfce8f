use log::{debug, info, warn};
use serde::Serialize;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::audio::buffer::AudioBuffer;
use crate::audio::wav::PcmCodec;
use crate::config::PipelineConfig;
use crate::error::{DecodeError, EncodeError, PipelineError};
use crate::filter::{adapter, FilterProvider};

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub source_sample_rate: u32,
    pub source_samples: usize,
    pub sample_rate: u32,
    pub samples: usize,
    pub processed: usize,
    pub filter_duration_ms: f64,
}

/// Decode → resample → filter → encode, for one file at a time.
///
/// Each run creates its own filter state from the provider and never shares
/// it, so independent pipelines can run on separate threads.
pub struct Pipeline<C, P> {
    codec: C,
    provider: P,
    config: PipelineConfig,
}

impl<C, P> Pipeline<C, P>
where
    C: PcmCodec,
    P: FilterProvider,
{
    pub fn new(codec: C, provider: P, config: PipelineConfig) -> Self {
        Self {
            codec,
            provider,
            config,
        }
    }

    pub fn run(&self, input: &Path, output: &Path) -> Result<RunReport, PipelineError> {
        let target_rate = self.config.validate()?;

        let source = self.decode(input)?;
        let source_sample_rate = source.sample_rate();
        let source_samples = source.len();
        info!(
            "Decoded {} samples at {} Hz ({:.2}s) from {}",
            source_samples,
            source_sample_rate,
            source.duration_secs(),
            input.display()
        );

        let mut converted = source.resample(target_rate, self.config.rounding)?;
        debug!(
            "Resampled {} Hz -> {} Hz: {} samples",
            source_sample_rate,
            converted.sample_rate(),
            converted.len()
        );

        let (processed, elapsed) = self.filter(&mut converted)?;
        info!(
            "{} samples processed in {} ms",
            processed,
            elapsed.as_millis()
        );

        let sample_rate = converted.sample_rate();
        let samples = converted.len();
        self.encode(output, converted)?;
        info!("Wrote {} samples at {} Hz to {}", samples, sample_rate, output.display());

        Ok(RunReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            source_sample_rate,
            source_samples,
            sample_rate,
            samples,
            processed,
            filter_duration_ms: elapsed.as_secs_f64() * 1000.0,
        })
    }

    fn decode(&self, path: &Path) -> Result<AudioBuffer, DecodeError> {
        let decoded = self.codec.decode(path)?;
        if decoded.channels != 1 {
            return Err(DecodeError::UnsupportedChannels(decoded.channels));
        }
        let sample_rate = NonZeroU32::new(decoded.sample_rate).ok_or(DecodeError::ZeroSampleRate)?;
        if decoded.samples.is_empty() {
            return Err(DecodeError::Empty);
        }
        Ok(AudioBuffer::new(decoded.samples, sample_rate))
    }

    fn filter(&self, buffer: &mut AudioBuffer) -> Result<(usize, Duration), PipelineError> {
        let mut filter = self.provider.init()?;

        let start = Instant::now();
        let processed = adapter::process(buffer.samples_mut(), &mut filter, self.config.training)?;
        Ok((processed, start.elapsed()))
    }

    fn encode(&self, path: &Path, buffer: AudioBuffer) -> Result<(), EncodeError> {
        let requested = buffer.len();
        // Only a file this run created may be cleaned up after a short write.
        let existed_before = path.exists();
        let written = self
            .codec
            .encode(path, buffer.sample_rate(), buffer.samples())?;

        if written != requested {
            if existed_before {
                warn!("Leaving pre-existing output {} in place", path.display());
            } else {
                match std::fs::remove_file(path) {
                    Ok(()) => warn!("Removed incomplete output {}", path.display()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => warn!("Failed to remove incomplete output {}: {}", path.display(), e),
                }
            }
            return Err(EncodeError::ShortWrite { written, requested });
        }
        Ok(())
    }
}
