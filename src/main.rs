use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use verdant::{load_region, NdviPipeline, PipelineConfig, SceneStore};

/// Landsat NDVI compositing pipeline
#[derive(Debug, Parser)]
#[command(name = "verdant", version, about)]
struct Cli {
    /// Pipeline configuration (TOML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scene store directory containing catalog.json
    #[arg(short, long)]
    archive: PathBuf,

    /// Study area GeoJSON (overrides the config's region_path)
    #[arg(short, long)]
    region: Option<PathBuf>,

    /// Output GeoTIFF path for the NDVI composite
    #[arg(short, long, default_value = "ndvi_composite.tif")]
    output: PathBuf,

    /// Also write the time series as CSV
    #[arg(long)]
    series_csv: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let region_path = cli
        .region
        .clone()
        .or_else(|| config.region_path.clone())
        .context("no study area given: pass --region or set region_path in the config")?;
    let region = load_region(&region_path)
        .with_context(|| format!("loading region {}", region_path.display()))?;

    let store = SceneStore::open(&cli.archive)
        .with_context(|| format!("opening scene store {}", cli.archive.display()))?;

    let pipeline = NdviPipeline::new(config);
    let run = pipeline.run(&store, &region)?;
    let report = pipeline.export(&run, &region, &cli.output)?;

    let chart = pipeline.chart(&run);
    if chart.is_empty() {
        println!("No valid observations in the selected window.");
    } else {
        println!("{}", chart.render());
    }
    if let Some(csv_path) = &cli.series_csv {
        chart
            .write_csv(csv_path)
            .with_context(|| format!("writing series CSV {}", csv_path.display()))?;
        println!("Series CSV: {}", csv_path.display());
    }

    println!(
        "Composite: {} ({}x{} pixels, {} valid)",
        report.path.display(),
        report.width,
        report.height,
        report.valid_pixels
    );
    Ok(())
}
