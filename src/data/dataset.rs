//! Dataset Module
//! Loads every source a view needs, then reconciles them in one step.

use crate::config::AtlasConfig;
use crate::data::geo::WorldMap;
use crate::data::loader::{DataLoader, LoadError, SourceSpec};
use crate::data::reconciler::{ReconcileError, Reconciler};
use crate::data::record::{MergedCountryRecord, Metric, SourceTable};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Which tables a view joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DatasetMode {
    /// CO2 + PM2.5, drawn as markers.
    Pollution,
    /// CO2 + PM2.5 + deaths, drawn as a choropleth.
    #[default]
    Mortality,
}

impl DatasetMode {
    /// Metrics joined by this mode; the first one orders the output.
    pub fn metrics(self) -> &'static [Metric] {
        match self {
            DatasetMode::Pollution => &[Metric::Co2, Metric::Pm25],
            DatasetMode::Mortality => &[Metric::Co2, Metric::Pm25, Metric::Death],
        }
    }

    /// Metric coloured by default.
    pub fn default_metric(self) -> Metric {
        match self {
            DatasetMode::Pollution => Metric::Co2,
            DatasetMode::Mortality => Metric::Death,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DatasetMode::Pollution => "Pollution markers",
            DatasetMode::Mortality => "Mortality choropleth",
        }
    }
}

/// A source that failed to load.
#[derive(Debug)]
pub struct SourceFailure {
    pub metric: Metric,
    pub error: LoadError,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.metric, self.error)
    }
}

fn join_failures(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{} source table(s) failed to load: {}", .0.len(), join_failures(.0))]
    Sources(Vec<SourceFailure>),
    #[error("world map failed to load: {0}")]
    World(#[source] LoadError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Everything a view session renders from. Immutable once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub mode: DatasetMode,
    pub world: Arc<WorldMap>,
    pub records: Arc<[MergedCountryRecord]>,
}

impl Dataset {
    pub fn record(&self, name: &str) -> Option<&MergedCountryRecord> {
        self.records.iter().find(|r| r.name == name)
    }
}

/// Split per-source results into tables, or every failure if any.
pub fn collect_sources(
    specs: &[SourceSpec],
    results: Vec<Result<SourceTable, LoadError>>,
) -> Result<Vec<SourceTable>, PipelineError> {
    let mut tables = Vec::with_capacity(results.len());
    let mut failures = Vec::new();

    for (spec, result) in specs.iter().zip(results) {
        match result {
            Ok(table) => tables.push(table),
            Err(error) => {
                tracing::warn!(metric = %spec.metric, %error, "source table failed to load");
                failures.push(SourceFailure {
                    metric: spec.metric,
                    error,
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(tables)
    } else {
        Err(PipelineError::Sources(failures))
    }
}

/// Load the world map and every source of `mode`, then reconcile.
///
/// Nothing is reconciled unless every load succeeded.
pub fn load_dataset(config: &AtlasConfig, mode: DatasetMode) -> Result<Dataset, PipelineError> {
    let specs = config.source_specs(mode);
    let world_path = config.world_path();

    let (world, results) = rayon::join(
        || DataLoader::load_world(&world_path),
        || DataLoader::load_sources(&specs),
    );

    let tables = collect_sources(&specs, results)?;
    let world = world.map_err(PipelineError::World)?;
    let records = Reconciler::reconcile(&tables, &config.reconcile_options())?;

    tracing::info!(
        mode = ?mode,
        countries = records.len(),
        features = world.shapes.len(),
        "dataset ready"
    );

    Ok(Dataset {
        mode,
        world: Arc::new(world),
        records: records.into(),
    })
}
