#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the rain detection tool.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use rain_map_cli_utils::IndicatifProgress;
use rain_map_database::{paths, rain_db};
use rain_map_detect::DetectConfig;
use rain_map_ingest::{
    DEFAULT_CAMERA_SOURCE, DEFAULT_NEIGHBORHOOD_SOURCE, RunOptions, build_client, camera_source,
    load_index, neighborhood_source, skip_summary,
};

#[derive(Parser)]
#[command(name = "rain_map_ingest", about = "Traffic camera rain detection tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every camera's current frame and store per-intersection results
    Run {
        /// Path of the `DuckDB` file to write (default: `data/rain_data.duckdb`)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Edge density above which a frame counts as rain
        #[arg(long, default_value = "0.01")]
        threshold: f64,
        /// Maximum number of cameras to process (for testing)
        #[arg(long)]
        limit: Option<usize>,
        /// HTTP request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
        /// Neighborhood boundary source id
        #[arg(long, default_value = DEFAULT_NEIGHBORHOOD_SOURCE)]
        neighborhoods: String,
        /// Camera source id
        #[arg(long, default_value = DEFAULT_CAMERA_SOURCE)]
        cameras: String,
    },
    /// Print the stored results of the last run
    Show {
        /// Path of the `DuckDB` file to read (default: `data/rain_data.duckdb`)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// List all configured neighborhood and camera sources
    Sources,
    /// Resolve one state-plane coordinate to a neighborhood
    Resolve {
        /// Easting in US survey feet (EPSG:2285)
        x: f64,
        /// Northing in US survey feet (EPSG:2285)
        y: f64,
        /// HTTP request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
        /// Neighborhood boundary source id
        #[arg(long, default_value = DEFAULT_NEIGHBORHOOD_SOURCE)]
        neighborhoods: String,
        /// Camera source id whose projection the coordinate is in
        #[arg(long, default_value = DEFAULT_CAMERA_SOURCE)]
        cameras: String,
    },
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = rain_map_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            db,
            threshold,
            limit,
            timeout_secs,
            neighborhoods,
            cameras,
        } => {
            let options = RunOptions {
                neighborhood_source: neighborhoods,
                camera_source: cameras,
                detect: DetectConfig {
                    rain_threshold: threshold,
                    ..DetectConfig::default()
                },
                limit,
                timeout: Duration::from_secs(timeout_secs),
            };

            let start = Instant::now();
            let progress = IndicatifProgress::cameras_bar(&multi, "Loading datasets");
            let report = rain_map_ingest::run(&options, progress.as_ref()).await?;

            let skipped = skip_summary(&report);
            println!(
                "Scored {} cameras, skipped {}, excluded {} up front",
                report.observed_count(),
                skipped.values().sum::<usize>(),
                report.excluded
            );
            for (kind, count) in &skipped {
                println!("  {kind:<10} {count}");
            }

            let path = db.unwrap_or_else(paths::rain_db_path);
            let mut conn = rain_db::open(&path)?;
            let stored = rain_db::replace_all(&mut conn, &report.records)?;

            let rainy = report.records.iter().filter(|r| r.rain_detected).count();
            log::info!(
                "Stored {stored} records ({rainy} with rain) in {} after {:.1}s",
                path.display(),
                start.elapsed().as_secs_f64()
            );
        }
        Commands::Show { db } => {
            let path = db.unwrap_or_else(paths::rain_db_path);
            let conn = rain_db::open(&path)?;
            let rows = rain_db::list_records(&conn)?;

            println!(
                "{:>4}  {:<28} {:<32} {:>10}  {:<5}  TIMESTAMP",
                "ID", "NEIGHBORHOOD", "STREET", "DENSITY", "RAIN"
            );
            println!("{}", "-".repeat(105));
            for row in &rows {
                let r = &row.record;
                println!(
                    "{:>4}  {:<28} {:<32} {:>10.5}  {:<5}  {}",
                    row.id,
                    r.neighborhood,
                    r.street_label,
                    r.average_density,
                    r.rain_detected,
                    r.timestamp.format("%Y-%m-%d %H:%M:%S")
                );
            }
            println!("{} rows", rows.len());
        }
        Commands::Sources => {
            println!("{:<28} {:<12} NAME", "ID", "KIND");
            println!("{}", "-".repeat(70));
            for source in rain_map_neighborhood::registry::all_sources() {
                println!("{:<28} {:<12} {}", source.id(), "boundaries", source.name());
            }
            for source in rain_map_camera::registry::all_sources() {
                println!("{:<28} {:<12} {}", source.id(), "cameras", source.name());
            }
        }
        Commands::Resolve {
            x,
            y,
            timeout_secs,
            neighborhoods,
            cameras,
        } => {
            let client = build_client(Duration::from_secs(timeout_secs))?;
            let boundaries = neighborhood_source(&neighborhoods)?;
            let cameras = camera_source(&cameras)?;
            let index = load_index(&client, &boundaries, cameras.projection).await?;

            let geographic = index.projection().inverse(x, y)?;
            let name = index.resolve(x, y)?;
            println!(
                "({x}, {y}) -> ({:.6}, {:.6}) -> {name}",
                geographic.x, geographic.y
            );
        }
    }

    Ok(())
}
