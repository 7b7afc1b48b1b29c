use clap::Parser;
use log::error;
use reanalysis_pipeline::{
    load_data, plot_spatial_heatmap, plot_time_series, PipelineError, RenderConfig, RenderError,
    DEFAULT_HEATMAP_FILE, DEFAULT_TABLE_FILE, DEFAULT_TIME_SERIES_FILE,
};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "render")]
#[command(about = "Plot the daily temperature cycle and the mean temperature heatmap")]
struct Args {
    /// CSV table written by `tabulate`
    #[arg(short, long, default_value = DEFAULT_TABLE_FILE)]
    input: PathBuf,

    /// Time series figure to write
    #[arg(long, default_value = DEFAULT_TIME_SERIES_FILE)]
    time_series: PathBuf,

    /// Heatmap figure to write
    #[arg(long, default_value = DEFAULT_HEATMAP_FILE)]
    heatmap: PathBuf,
}

fn main() -> Result<(), PipelineError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = RenderConfig::builder()
        .input_path(args.input)
        .time_series_path(args.time_series)
        .heatmap_path(args.heatmap)
        .build();

    let df = match load_data(&config.input_path) {
        Ok(df) => df,
        Err(e @ RenderError::MissingInput(_)) => {
            error!("❌ Error: {e}");
            process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    plot_time_series(&df, &config.time_series_path)?;
    plot_spatial_heatmap(&df, &config.heatmap_path)?;
    Ok(())
}
