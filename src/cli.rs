//! Command line interface: launch the viewer, or reconcile and render
//! headlessly.

use crate::charts::{
    card_size, country_bars, CardRenderer, MapRenderer, MapScene, MapStyle, RenderError,
};
use crate::config::AtlasConfig;
use crate::data::{load_dataset, DatasetMode, Metric};
use crate::view::{Selection, ViewEvent, ViewState};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Country-level pollution and mortality atlas")]
pub struct Args {
    /// JSON config file (defaults are used for missing fields)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the GeoJSON and CSV files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch the interactive viewer (default)
    View {
        #[arg(long, value_enum, default_value_t = DatasetMode::Mortality)]
        mode: DatasetMode,
    },

    /// Reconcile the source tables and print the merged records as JSON
    Reconcile {
        #[arg(long, value_enum, default_value_t = DatasetMode::Mortality)]
        mode: DatasetMode,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Render the map for one year/metric to a PNG
    RenderMap {
        #[arg(long, value_enum, default_value_t = DatasetMode::Mortality)]
        mode: DatasetMode,

        /// Tracked year (first tracked year when omitted)
        #[arg(long)]
        year: Option<String>,

        /// Colored metric (mode default when omitted)
        #[arg(long, value_enum)]
        metric: Option<Metric>,

        /// Zoom slider value
        #[arg(long)]
        zoom: Option<f64>,

        /// Pan offset in pixels: DX,DY
        #[arg(long, value_parser = parse_pan, allow_hyphen_values = true)]
        pan: Option<[f64; 2]>,

        #[arg(long)]
        out: PathBuf,
    },

    /// Render the bar-chart card of one country to a PNG
    RenderCountry {
        #[arg(long)]
        country: String,

        #[arg(long, value_enum, default_value_t = DatasetMode::Mortality)]
        mode: DatasetMode,

        #[arg(long)]
        out: PathBuf,
    },
}

/// Parse `DX,DY`.
pub fn parse_pan(text: &str) -> Result<[f64; 2], String> {
    let (dx, dy) = text
        .split_once(',')
        .ok_or_else(|| format!("expected DX,DY, got `{}`", text))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("`{}` is not a finite number", part.trim()))
    };
    Ok([parse(dx)?, parse(dy)?])
}

/// Defaults, then the config file, then command line overrides.
pub fn load_config(args: &Args) -> Result<AtlasConfig> {
    let mut config = match &args.config {
        Some(path) => AtlasConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AtlasConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

/// Map view options of `render-map`.
#[derive(Debug, Clone, Default)]
pub struct MapOptions {
    pub year: Option<String>,
    pub metric: Option<Metric>,
    pub zoom: Option<f64>,
    pub pan: Option<[f64; 2]>,
}

/// Drive a fresh view through the same events the viewer would send.
pub fn build_view(config: &AtlasConfig, mode: DatasetMode, options: &MapOptions) -> ViewState {
    let selection = Selection::new(config.years.clone(), mode.metrics(), mode.default_metric());
    let mut view = ViewState::new(config.view, selection);

    if let Some(zoom) = options.zoom {
        view.update(ViewEvent::ZoomInput(zoom));
        view.update(ViewEvent::ZoomRelease);
    }
    if let Some([dx, dy]) = options.pan {
        view.update(ViewEvent::PointerDown);
        view.update(ViewEvent::Drag { dx, dy });
        view.update(ViewEvent::PointerUp);
    }
    if let Some(year) = &options.year {
        view.update(ViewEvent::YearChange(year.clone()));
        if view.selection().year() != year {
            tracing::warn!(year = %year, "year is not tracked; keeping {}", view.selection().year());
        }
    }
    if let Some(metric) = options.metric {
        view.update(ViewEvent::MetricChange(metric));
        if view.selection().metric() != metric {
            tracing::warn!(%metric, ?mode, "metric not available in this mode");
        }
    }
    view
}

pub fn run_reconcile(config: &AtlasConfig, mode: DatasetMode, out: Option<&Path>) -> Result<()> {
    let dataset = load_dataset(config, mode).context("building dataset")?;
    let json = serde_json::to_string_pretty(&*dataset.records)?;

    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), records = dataset.records.len(), "records written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

pub fn run_render_map(
    config: &AtlasConfig,
    mode: DatasetMode,
    options: &MapOptions,
    out: &Path,
) -> Result<()> {
    let dataset = load_dataset(config, mode).context("building dataset")?;
    let view = build_view(config, mode, options);
    let scene = MapScene {
        world: &dataset.world,
        records: &dataset.records,
        view: &view,
        style: MapStyle::from(mode),
    };
    MapRenderer::render_png(out, &scene)
        .with_context(|| format!("rendering map to {}", out.display()))?;
    println!(
        "Map for {} written to {}",
        view.selection().field_name(),
        out.display()
    );
    Ok(())
}

pub fn run_render_country(
    config: &AtlasConfig,
    mode: DatasetMode,
    country: &str,
    out: &Path,
) -> Result<()> {
    let dataset = load_dataset(config, mode).context("building dataset")?;
    let record = dataset
        .record(country)
        .ok_or_else(|| RenderError::UnknownCountry(country.to_string()))?;
    let series = country_bars(record, &config.years, mode.metrics());
    CardRenderer::render_png(out, record, &series, card_size(800, series.len()))
        .with_context(|| format!("rendering card to {}", out.display()))?;
    println!("Card for {} written to {}", record.name, out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pan_parses_signed_pairs() {
        assert_eq!(parse_pan("12.5,-40"), Ok([12.5, -40.0]));
        assert_eq!(parse_pan(" -3 , 4 "), Ok([-3.0, 4.0]));
        assert!(parse_pan("12").is_err());
        assert!(parse_pan("a,1").is_err());
        assert!(parse_pan("inf,1").is_err());
    }

    #[test]
    fn args_default_to_viewer() {
        let args = Args::try_parse_from(["pollution-atlas", "--data-dir", "fixtures"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.data_dir, Some(PathBuf::from("fixtures")));
        assert_eq!(load_config(&args).unwrap().data_dir, PathBuf::from("fixtures"));
    }

    #[test]
    fn render_map_args_parse() {
        let args = Args::try_parse_from([
            "pollution-atlas",
            "render-map",
            "--mode",
            "pollution",
            "--metric",
            "pm25",
            "--zoom",
            "12",
            "--pan",
            "-20,15",
            "--out",
            "map.png",
        ])
        .unwrap();

        match args.command {
            Some(Command::RenderMap {
                mode,
                metric,
                zoom,
                pan,
                out,
                ..
            }) => {
                assert_eq!(mode, DatasetMode::Pollution);
                assert_eq!(metric, Some(Metric::Pm25));
                assert_eq!(zoom, Some(12.0));
                assert_eq!(pan, Some([-20.0, 15.0]));
                assert_eq!(out, PathBuf::from("map.png"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn build_view_replays_viewer_events() {
        let config = AtlasConfig::default();
        let options = MapOptions {
            year: Some("2015".into()),
            metric: Some(Metric::Co2),
            zoom: Some(14.0),
            pan: Some([30.0, -10.0]),
        };

        let view = build_view(&config, DatasetMode::Mortality, &options);
        assert_eq!(view.scale(), 625.0);
        assert_eq!(view.translate(), [30.0, -10.0]);
        assert_eq!(view.selection().field_name(), "2015_CO2");
    }

    #[test]
    fn build_view_ignores_unknown_year_and_metric() {
        let config = AtlasConfig::default();
        let options = MapOptions {
            year: Some("1990".into()),
            metric: Some(Metric::Death),
            ..MapOptions::default()
        };

        let view = build_view(&config, DatasetMode::Pollution, &options);
        assert_eq!(view.selection().field_name(), "2010_CO2");
        assert_eq!(view.translate(), [0.0, 0.0]);
    }
}
