//! Dataset Reconciler Module
//! Joins independently sourced per-country tables into one record per country.

use crate::data::record::{Keying, MergedCountryRecord, Metric, RawRow, SourceTable, YearValue};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("reconciliation needs at least two sources, got {0}")]
    TooFewSources(usize),
    #[error("primary source index {index} is out of range for {count} sources")]
    PrimaryOutOfRange { index: usize, count: usize },
    #[error("no source provides {0} rows to read coordinates from")]
    MissingCoordinateSource(Metric),
}

/// Column names and join parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOptions {
    /// Tracked years, in output order.
    pub years: Vec<String>,
    pub country_column: String,
    pub latitude_column: String,
    pub longitude_column: String,
    /// Aggregate row that is never emitted.
    pub excluded_country: String,
    /// Index of the table that fixes output order.
    pub primary: usize,
    /// Metric whose table supplies latitude/longitude.
    pub coordinate_metric: Metric,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            years: (2010..=2017).map(|y| y.to_string()).collect(),
            country_column: "Country".to_string(),
            latitude_column: "latitudes".to_string(),
            longitude_column: "longitudes".to_string(),
            excluded_country: "World".to_string(),
            primary: 0,
            coordinate_metric: Metric::Pm25,
        }
    }
}

/// Rows of one source grouped by country, in table order.
struct CountryIndex<'a> {
    source: &'a SourceTable,
    rows: HashMap<&'a str, Vec<&'a RawRow>>,
}

impl<'a> CountryIndex<'a> {
    fn build(source: &'a SourceTable, country_column: &str) -> Self {
        let mut rows: HashMap<&'a str, Vec<&'a RawRow>> = HashMap::new();
        for row in &source.rows {
            if let Some(country) = row.get(country_column) {
                rows.entry(country).or_default().push(row);
            }
        }
        Self { source, rows }
    }

    fn contains(&self, country: &str) -> bool {
        self.rows.contains_key(country)
    }

    /// First row for a country; wide tables have exactly one.
    fn first(&self, country: &str) -> Option<&'a RawRow> {
        self.rows.get(country).and_then(|rows| rows.first().copied())
    }

    /// Value of this source's metric for one country and year.
    fn value(&self, country: &str, year: &str) -> Option<f64> {
        let rows = self.rows.get(country)?;
        match &self.source.keying {
            Keying::Wide => rows.first()?.number(year),
            Keying::Long {
                year_column,
                value_column,
            } => rows
                .iter()
                .find(|row| row.get(year_column).map(str::trim) == Some(year))?
                .number(value_column),
        }
    }
}

/// Multi-source reconciliation (intersection + merge).
pub struct Reconciler;

impl Reconciler {
    /// Distinct values of the country column in one table.
    pub fn country_set<'a>(table: &'a SourceTable, country_column: &str) -> HashSet<&'a str> {
        table
            .rows
            .iter()
            .filter_map(|row| row.get(country_column))
            .collect()
    }

    /// Countries present in every table, minus the excluded aggregate,
    /// in order of first appearance in the primary table.
    pub fn common_countries<'a>(
        sources: &'a [SourceTable],
        options: &ReconcileOptions,
    ) -> Result<Vec<&'a str>, ReconcileError> {
        Self::check_sources(sources, options)?;

        let sets: Vec<HashSet<&str>> = sources
            .iter()
            .map(|table| Self::country_set(table, &options.country_column))
            .collect();

        let mut seen = HashSet::new();
        let common = sources[options.primary]
            .rows
            .iter()
            .filter_map(|row| row.get(&options.country_column))
            .filter(|country| *country != options.excluded_country)
            .filter(|country| sets.iter().all(|set| set.contains(country)))
            .filter(|country| seen.insert(*country))
            .collect();

        Ok(common)
    }

    /// Build one merged record per common country.
    ///
    /// Missing rows or cells become `None`; only the source list itself can
    /// make this fail.
    pub fn reconcile(
        sources: &[SourceTable],
        options: &ReconcileOptions,
    ) -> Result<Vec<MergedCountryRecord>, ReconcileError> {
        let common = Self::common_countries(sources, options)?;

        let indexes: Vec<CountryIndex> = sources
            .iter()
            .map(|source| CountryIndex::build(source, &options.country_column))
            .collect();

        let coordinates = indexes
            .iter()
            .find(|index| index.source.metric == options.coordinate_metric)
            .ok_or(ReconcileError::MissingCoordinateSource(options.coordinate_metric))?;

        if tracing::enabled!(tracing::Level::TRACE) {
            Self::trace_excluded(&indexes, &common, options);
        }

        let records: Vec<MergedCountryRecord> = common
            .iter()
            .map(|&country| {
                let coord_row = coordinates.first(country);
                let latitude = coord_row.and_then(|row| row.number(&options.latitude_column));
                let longitude = coord_row.and_then(|row| row.number(&options.longitude_column));

                let values = options
                    .years
                    .iter()
                    .flat_map(|year| {
                        indexes.iter().map(move |index| YearValue {
                            year: year.clone(),
                            metric: index.source.metric,
                            value: index.value(country, year),
                        })
                    })
                    .collect();

                MergedCountryRecord::new(country, latitude, longitude, values)
            })
            .collect();

        tracing::debug!(
            sources = sources.len(),
            records = records.len(),
            "reconciled country tables"
        );

        Ok(records)
    }

    fn check_sources(
        sources: &[SourceTable],
        options: &ReconcileOptions,
    ) -> Result<(), ReconcileError> {
        if sources.len() < 2 {
            return Err(ReconcileError::TooFewSources(sources.len()));
        }
        if options.primary >= sources.len() {
            return Err(ReconcileError::PrimaryOutOfRange {
                index: options.primary,
                count: sources.len(),
            });
        }
        if !sources.iter().any(|s| s.metric == options.coordinate_metric) {
            return Err(ReconcileError::MissingCoordinateSource(
                options.coordinate_metric,
            ));
        }
        Ok(())
    }

    fn trace_excluded(indexes: &[CountryIndex], common: &[&str], options: &ReconcileOptions) {
        let kept: HashSet<&str> = common.iter().copied().collect();
        let mut reported = HashSet::new();
        for index in indexes {
            for row in &index.source.rows {
                let Some(country) = row.get(&options.country_column) else {
                    continue;
                };
                if kept.contains(country)
                    || country == options.excluded_country
                    || !reported.insert(country)
                {
                    continue;
                }
                let missing: Vec<&str> = indexes
                    .iter()
                    .filter(|other| !other.contains(country))
                    .map(|other| other.source.name.as_str())
                    .collect();
                tracing::trace!(country, ?missing, "country dropped from reconciliation");
            }
        }
    }
}
