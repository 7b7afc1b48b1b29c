use clap::Parser;
use log::error;
use reanalysis_pipeline::retrieve::retrieve;
use reanalysis_pipeline::{
    BoundingBox, PipelineError, ReanalysisMonth, RetrieveConfig, DEFAULT_DATASET,
    DEFAULT_GRID_FILE, DEFAULT_SERVICE_URL, JULY_2023, SAVOIE,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "retrieve")]
#[command(about = "Download the monthly mean 2m temperature grid for one area")]
struct Args {
    /// Base URL of the data service API
    #[arg(long, env = "CDS_API_URL", default_value = DEFAULT_SERVICE_URL)]
    service_url: String,

    /// Personal access token for the data service
    #[arg(long, env = "CDS_API_KEY", hide_env_values = true)]
    access_key: Option<String>,

    /// Dataset to request the product from
    #[arg(long, default_value = DEFAULT_DATASET)]
    dataset: String,

    #[arg(long, default_value_t = JULY_2023.year_string())]
    year: String,

    #[arg(long, default_value_t = JULY_2023.month_string())]
    month: String,

    /// Area as north,west,south,east in degrees
    #[arg(long, default_value_t = SAVOIE.to_string(), allow_hyphen_values = true)]
    area: String,

    /// Where to write the downloaded grid file
    #[arg(short, long, default_value = DEFAULT_GRID_FILE)]
    output: PathBuf,

    /// Seconds between two job status requests
    #[arg(long, default_value = "5")]
    poll_interval: u64,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // A failed download, bad arguments included, is reported but does not fail the process.
    if let Err(e) = run(args).await {
        error!("❌ Error during download: {e}");
    }
}

async fn run(args: Args) -> Result<(), PipelineError> {
    let period = ReanalysisMonth::parse(&args.year, &args.month)?;
    let area: BoundingBox = args.area.parse()?;

    let config = RetrieveConfig::builder()
        .service_url(args.service_url)
        .maybe_access_key(args.access_key)
        .dataset(args.dataset)
        .period(period)
        .bounding_box(area)
        .output_path(args.output)
        .poll_interval(Duration::from_secs(args.poll_interval))
        .build();

    retrieve(&config).await?;
    Ok(())
}
