//! Pollution Atlas - country-level CO2, PM2.5 and air-pollution mortality
//!
//! Reconciles per-country CSV tables against a world map and shows them as
//! an interactive choropleth/marker map, or renders them headlessly.

mod charts;
mod cli;
mod config;
mod data;
mod gui;
mod view;

use anyhow::{anyhow, Result};
use clap::Parser;
use cli::{Args, Command, MapOptions};
use config::AtlasConfig;
use data::DatasetMode;
use eframe::egui;
use gui::AtlasApp;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = cli::load_config(&args)?;

    match args.command {
        None => run_viewer(config, DatasetMode::default()),
        Some(Command::View { mode }) => run_viewer(config, mode),
        Some(Command::Reconcile { mode, out }) => cli::run_reconcile(&config, mode, out.as_deref()),
        Some(Command::RenderMap {
            mode,
            year,
            metric,
            zoom,
            pan,
            out,
        }) => {
            let options = MapOptions {
                year,
                metric,
                zoom,
                pan,
            };
            cli::run_render_map(&config, mode, &options, &out)
        }
        Some(Command::RenderCountry { country, mode, out }) => {
            cli::run_render_country(&config, mode, &country, &out)
        }
    }
}

fn run_viewer(config: AtlasConfig, mode: DatasetMode) -> Result<()> {
    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1000.0, 600.0])
            .with_title("Pollution Atlas"),
        ..Default::default()
    };

    eframe::run_native(
        "Pollution Atlas",
        options,
        Box::new(move |cc| Ok(Box::new(AtlasApp::new(cc, config, mode)))),
    )
    .map_err(|e| anyhow!("viewer failed: {}", e))
}
