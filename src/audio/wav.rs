use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

#[cfg(unix)]
const DEFAULT_OUTPUT_MODE: u32 = 0o644;

/// Interleaved PCM as it came out of a container, before any channel checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("unsupported sample format: {format:?} ({bits} bits)")]
    UnsupportedFormat { format: SampleFormat, bits: u16 },
}

/// Reads and writes 16-bit PCM containers.
pub trait PcmCodec {
    fn decode(&self, path: &Path) -> Result<DecodedAudio, CodecError>;

    /// Writes a mono file and returns how many samples ended up in it.
    fn encode(&self, path: &Path, sample_rate: u32, samples: &[i16]) -> Result<usize, CodecError>;
}

/// RIFF/WAV codec backed by `hound`.
///
/// Integer PCM of any width up to 32 bits is normalized to 16 bits on read.
/// Writes go to a temp file next to the target and are renamed into place
/// only once the header is finalized, so a failed write leaves nothing behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

impl PcmCodec for WavCodec {
    fn decode(&self, path: &Path) -> Result<DecodedAudio, CodecError> {
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();

        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample > 32 {
            return Err(CodecError::UnsupportedFormat {
                format: spec.sample_format,
                bits: spec.bits_per_sample,
            });
        }

        let samples = if spec.bits_per_sample == 16 {
            reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?
        } else {
            let bits = spec.bits_per_sample as u32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| to_i16(s, bits)))
                .collect::<Result<Vec<_>, _>>()?
        };

        debug!(
            "Decoded {}: {} samples, {} Hz, {} channel(s), {} bits",
            path.display(),
            samples.len(),
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample
        );

        Ok(DecodedAudio {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    fn encode(&self, path: &Path, sample_rate: u32, samples: &[i16]) -> Result<usize, CodecError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(parent)?;

        let mut written = 0;
        {
            let mut writer = WavWriter::new(BufWriter::new(tmp.as_file_mut()), spec)?;
            for &sample in samples {
                writer.write_sample(sample)?;
                written += 1;
            }
            writer.finalize()?;
        }

        set_output_permissions(tmp.as_file(), path)?;
        tmp.persist(path).map_err(|e| e.error)?;
        debug!("Wrote {} samples to {}", written, path.display());
        Ok(written)
    }
}

/// Temp files are created owner-only. Give the output the permissions of the
/// file it replaces, or the usual `0o644` for a new file.
fn set_output_permissions(file: &File, target: &Path) -> std::io::Result<()> {
    match std::fs::metadata(target) {
        Ok(existing) if existing.is_file() => file.set_permissions(existing.permissions()),
        _ => set_default_permissions(file),
    }
}

#[cfg(unix)]
fn set_default_permissions(file: &File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(DEFAULT_OUTPUT_MODE))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &File) -> std::io::Result<()> {
    Ok(())
}

/// Rescale a signed integer sample of `bits` width to 16 bits.
fn to_i16(sample: i32, bits: u32) -> i16 {
    if bits > 16 {
        (sample >> (bits - 16)) as i16
    } else {
        (sample << (16 - bits)) as i16
    }
}
