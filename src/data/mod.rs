//! Data module - source loading and reconciliation

mod dataset;
mod geo;
mod loader;
mod reconciler;
mod record;

pub use dataset::{load_dataset, Dataset, DatasetMode, PipelineError};
pub use geo::{CountryShape, WorldMap};
pub use loader::SourceSpec;
pub use reconciler::ReconcileOptions;
pub use record::{Keying, MergedCountryRecord, Metric, YearValue};
