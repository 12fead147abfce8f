use anyhow::{Context, Result};
use log::error;
use nross_lib::audio::wav::WavCodec;
use nross_lib::cli::{self, CliArgs, Command};
use nross_lib::error::{PipelineError, USAGE_EXIT_CODE};
use nross_lib::filter::noise_remover::NoiseRemoverProvider;
use nross_lib::filter::worker::FilterWorker;
use nross_lib::filter::FilterProvider;
use nross_lib::pipeline::Pipeline;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match cli::parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            println!("{}", cli::USAGE);
            return;
        }
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, cli::USAGE);
            std::process::exit(USAGE_EXIT_CODE);
        }
    };

    if let Err(err) = run(args) {
        error!("{:#}", err);
        let code = err
            .downcast_ref::<PipelineError>()
            .map(|e| e.kind().exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let provider = NoiseRemoverProvider::new(args.config.filter.clone());
    if args.worker {
        execute(FilterWorker::new(provider), &args)
    } else {
        execute(provider, &args)
    }
}

fn execute<P: FilterProvider>(provider: P, args: &CliArgs) -> Result<()> {
    let pipeline = Pipeline::new(WavCodec, provider, args.config.clone());
    let report = pipeline
        .run(&args.input, &args.output)
        .with_context(|| format!("Failed to denoise {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} -> {} ({} samples at {} Hz, filtered in {:.0} ms)",
            report.input.display(),
            report.output.display(),
            report.samples,
            report.sample_rate,
            report.filter_duration_ms
        );
    }
    Ok(())
}
