use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audio::resampler::Rounding;
use crate::config::{PipelineConfig, DEFAULT_OUTPUT_SUFFIX};

pub const USAGE: &str = "\
Usage: nross <INPUT.wav> [options]

Options:
  -o, --output <PATH>   Output file (default: <INPUT>_out.<ext> next to the input)
  -r, --rate <HZ>       Working sample rate (default: 8000)
      --truncate        Truncate interpolated samples instead of rounding
      --no-training     Freeze the noise model instead of adapting it
      --worker          Run the noise remover on a dedicated thread
      --json            Print the run report as JSON
  -h, --help            Show this help";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing input file")]
    MissingInput,
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("option `{0}` needs a value")]
    MissingValue(String),
    #[error("invalid sample rate `{0}`")]
    InvalidRate(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: PipelineConfig,
    pub worker: bool,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(CliArgs),
    Help,
}

/// Parses arguments (without the program name).
pub fn parse_args<I>(args: I) -> Result<Command, UsageError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut config = PipelineConfig::default();
    let mut worker = false;
    let mut json = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-o" | "--output" => {
                let value = args.next().ok_or_else(|| UsageError::MissingValue(arg.clone()))?;
                output = Some(PathBuf::from(value));
            }
            "-r" | "--rate" => {
                let value = args.next().ok_or_else(|| UsageError::MissingValue(arg.clone()))?;
                config.target_sample_rate = match value.parse::<u32>() {
                    Ok(rate) if rate > 0 => rate,
                    _ => return Err(UsageError::InvalidRate(value)),
                };
            }
            "--truncate" => config.rounding = Rounding::Truncate,
            "--no-training" => config.training = false,
            "--worker" => worker = true,
            "--json" => json = true,
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(UsageError::UnknownOption(flag.to_string()));
            }
            path if input.is_none() => input = Some(PathBuf::from(path)),
            other => return Err(UsageError::UnexpectedArgument(other.to_string())),
        }
    }

    let input = input.ok_or(UsageError::MissingInput)?;
    let output = output.unwrap_or_else(|| output_path_for(&input));

    Ok(Command::Run(CliArgs {
        input,
        output,
        config,
        worker,
        json,
    }))
}

/// `<dir>/<stem>_out.<ext>` beside the input. Inputs without an extension
/// get `.wav`.
pub fn output_path_for(input: &Path) -> PathBuf {
    let mut name = input
        .file_stem()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(DEFAULT_OUTPUT_SUFFIX);
    name.push(".");
    name.push(input.extension().unwrap_or_else(|| OsStr::new("wav")));
    input.with_file_name(name)
}
