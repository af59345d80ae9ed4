//! Atlas configuration: data locations, column names, tracked years and
//! viewport constants. Read from an optional JSON file; every field has a
//! default matching the bundled data set.

use crate::data::{DatasetMode, Keying, Metric, ReconcileOptions, SourceSpec};
use crate::view::ViewSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// File names inside the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFiles {
    pub world: String,
    pub co2: String,
    pub pm25: String,
    pub death: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            world: "custom.geo.json".to_string(),
            co2: "CO2.csv".to_string(),
            pm25: "PM25.csv".to_string(),
            death: "death.csv".to_string(),
        }
    }
}

/// Column names shared by the source tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub country: String,
    pub year: String,
    pub death: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            country: "Country".to_string(),
            year: "Year".to_string(),
            death: "Death".to_string(),
            latitude: "latitudes".to_string(),
            longitude: "longitudes".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub data_dir: PathBuf,
    pub files: DataFiles,
    pub columns: ColumnNames,
    pub years: Vec<String>,
    /// Aggregate row dropped from every join.
    pub excluded_country: String,
    pub view: ViewSettings,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            files: DataFiles::default(),
            columns: ColumnNames::default(),
            years: (2010..=2017).map(|y| y.to_string()).collect(),
            excluded_country: "World".to_string(),
            view: ViewSettings::default(),
        }
    }
}

impl AtlasConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.years.is_empty() {
            return Err(ConfigError::Invalid("`years` must not be empty".into()));
        }
        self.view.validate().map_err(ConfigError::Invalid)
    }

    pub fn world_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.world)
    }

    fn metric_file(&self, metric: Metric) -> &str {
        match metric {
            Metric::Co2 => &self.files.co2,
            Metric::Pm25 => &self.files.pm25,
            Metric::Death => &self.files.death,
        }
    }

    /// Source tables joined by `mode`, primary first.
    pub fn source_specs(&self, mode: DatasetMode) -> Vec<SourceSpec> {
        mode.metrics()
            .iter()
            .map(|&metric| SourceSpec {
                metric,
                path: self.data_dir.join(self.metric_file(metric)),
                keying: match metric {
                    Metric::Death => Keying::Long {
                        year_column: self.columns.year.clone(),
                        value_column: self.columns.death.clone(),
                    },
                    Metric::Co2 | Metric::Pm25 => Keying::Wide,
                },
                country_column: self.columns.country.clone(),
            })
            .collect()
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            years: self.years.clone(),
            country_column: self.columns.country.clone(),
            latitude_column: self.columns.latitude.clone(),
            longitude_column: self.columns.longitude.clone(),
            excluded_country: self.excluded_country.clone(),
            primary: 0,
            coordinate_metric: Metric::Pm25,
        }
    }
}
