pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod pipeline;

use std::path::Path;

use audio::wav::WavCodec;
use config::PipelineConfig;
use error::PipelineError;
use filter::noise_remover::NoiseRemoverProvider;
use pipeline::{Pipeline, RunReport};

/// Denoises one WAV file with the in-process noise remover.
pub fn denoise_file(
    input: &Path,
    output: &Path,
    config: PipelineConfig,
) -> Result<RunReport, PipelineError> {
    let provider = NoiseRemoverProvider::new(config.filter.clone());
    Pipeline::new(WavCodec, provider, config).run(input, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio::wav::PcmCodec;
    use tempfile::TempDir;

    #[test]
    fn test_denoise_file_writes_working_rate_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("note.wav");
        let output = cli::output_path_for(&input);
        let samples: Vec<i16> = (0..4800).map(|i| ((i % 40) * 200 - 4000) as i16).collect();
        WavCodec.encode(&input, 48000, &samples).unwrap();

        let report = denoise_file(&input, &output, PipelineConfig::default()).unwrap();

        assert_eq!(report.output, dir.path().join("note_out.wav"));
        assert_eq!(report.samples, 800);
        let decoded = WavCodec.decode(&output).unwrap();
        assert_eq!((decoded.sample_rate, decoded.samples.len()), (8000, 800));
    }
}
