pub mod types;
pub mod config;
pub mod data;
pub mod processing;
pub mod colormap;
pub mod chart;
pub mod map;
pub mod dashboard;
pub mod render;
pub mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the interactive dashboard
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Write a static dashboard page for one selection
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Canton to select; omit for all cantons
        #[arg(long)]
        canton: Option<String>,
        #[arg(short, long, value_name = "FILE", default_value = "dashboard.html")]
        output: PathBuf,
    },
    /// Report canton names that do not match between the two datasets
    Validate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            info!("Serving dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;
            let store = data::DataStore::load(&app_config)?;

            server::start_server(app_config, store).await?;
        }
        Commands::Render { config, canton, output } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let store = data::DataStore::load(&app_config)?;

            let choice = types::CantonChoice::from_selection(
                canton.as_deref(),
                &app_config.display.all_option,
            );
            let dash = dashboard::build(&store, choice, &app_config.map);
            let page = render::render_page(&dash, store.canton_options(), &app_config)?;

            fs::write(output, page)
                .with_context(|| format!("Failed to write dashboard: {:?}", output))?;
            info!("Wrote {:?}", output);
        }
        Commands::Validate { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let records = data::load_records(&app_config.input.centers_csv)?;
            let cantons = data::load_cantons(
                &app_config.input.cantons,
                &app_config.input.canton_column_shape,
            )?;

            let report = processing::validate_join(&records, &cantons);
            if report.is_clean() {
                println!("All {} canton names match.", cantons.len());
            } else {
                for name in &report.missing_geometry {
                    println!("no geometry:  {}", name);
                }
                for name in &report.missing_records {
                    println!("no records:   {}", name);
                }
            }
        }
    }

    Ok(())
}
