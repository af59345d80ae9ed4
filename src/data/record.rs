//! Record Types Module
//! Parsed CSV rows, source tables and the merged per-country record.

use clap::ValueEnum;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// One parsed CSV row: column name -> cell text.
///
/// Null cells are simply absent from the mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Get the raw cell text for a column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Get a cell parsed as a number. Empty or malformed cells are `None`.
    pub fn number(&self, column: &str) -> Option<f64> {
        let text = self.get(column)?;
        let value = parse_number(text);
        if value.is_none() && !text.trim().is_empty() {
            tracing::trace!(column, text, "ignoring non-numeric cell");
        }
        value
    }
}

/// Parse a CSV cell as a finite number.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Tracked measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// CO2 emissions
    Co2,
    /// PM2.5 concentration
    Pm25,
    /// Deaths attributed to air pollution
    Death,
}

impl Metric {
    /// Suffix used in merged field names (`2010_CO2`).
    pub fn suffix(self) -> &'static str {
        match self {
            Metric::Co2 => "CO2",
            Metric::Pm25 => "PM25",
            Metric::Death => "Death",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::Co2 => "CO2 Emissions (tonnes)",
            Metric::Pm25 => "PM2.5 Concentration (µg/m³)",
            Metric::Death => "Deaths because of air pollution",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Co2 => "tonnes",
            Metric::Pm25 => "(µg/m³)",
            Metric::Death => "Deaths per 1000 people",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// How a source table is keyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keying {
    /// One row per country, one column per year.
    Wide,
    /// One row per (country, year); the value lives in `value_column`.
    Long {
        year_column: String,
        value_column: String,
    },
}

/// A loaded source table tagged with the metric it provides.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub name: String,
    pub metric: Metric,
    pub keying: Keying,
    pub rows: Vec<RawRow>,
}

impl SourceTable {
    pub fn new(name: impl Into<String>, metric: Metric, keying: Keying, rows: Vec<RawRow>) -> Self {
        Self {
            name: name.into(),
            metric,
            keying,
            rows,
        }
    }
}

/// A single `Y_M` cell of a merged record.
#[derive(Debug, Clone, PartialEq)]
pub struct YearValue {
    pub year: String,
    pub metric: Metric,
    pub value: Option<f64>,
}

/// One country present in every required source table.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedCountryRecord {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    values: Vec<YearValue>,
}

impl MergedCountryRecord {
    pub fn new(
        name: impl Into<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        values: Vec<YearValue>,
    ) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            values,
        }
    }

    /// Merged field name for a year/metric pair.
    pub fn field_name(year: &str, metric: Metric) -> String {
        format!("{}_{}", year, metric.suffix())
    }

    /// Value of the `year_metric` field; `None` when absent in the source.
    pub fn value(&self, year: &str, metric: Metric) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.metric == metric && v.year == year)
            .and_then(|v| v.value)
    }

    /// Whether the record carries a field for this year/metric at all.
    pub fn has_field(&self, year: &str, metric: Metric) -> bool {
        self.values
            .iter()
            .any(|v| v.metric == metric && v.year == year)
    }

    pub fn values(&self) -> &[YearValue] {
        &self.values
    }

    /// `(longitude, latitude)` when both are known.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.longitude?, self.latitude?))
    }
}

impl Serialize for MergedCountryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.values.len()))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("latitude", &self.latitude)?;
        map.serialize_entry("longitude", &self.longitude)?;
        for cell in &self.values {
            map.serialize_entry(&Self::field_name(&cell.year, cell.metric), &cell.value)?;
        }
        map.end()
    }
}
