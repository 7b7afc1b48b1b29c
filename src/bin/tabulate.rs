use clap::Parser;
use log::error;
use reanalysis_pipeline::tabulate;
use reanalysis_pipeline::{PipelineError, TabulateConfig, DEFAULT_GRID_FILE, DEFAULT_TABLE_FILE};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "tabulate")]
#[command(about = "Flatten the temperature grid into a CSV table in degrees Celsius")]
struct Args {
    /// Grid file written by `retrieve`
    #[arg(short, long, default_value = DEFAULT_GRID_FILE)]
    input: PathBuf,

    /// CSV table to write
    #[arg(short, long, default_value = DEFAULT_TABLE_FILE)]
    output: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), PipelineError> {
    let config = TabulateConfig::builder()
        .input_path(args.input)
        .output_path(args.output)
        .build();
    tabulate::run(&config)?;
    Ok(())
}
