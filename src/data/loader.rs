//! Data Loader Module
//! Reads the CSV source tables with Polars and the country outlines with geojson.

use crate::data::geo::WorldMap;
use crate::data::record::{Keying, Metric, RawRow, SourceTable};
use geojson::GeoJson;
use polars::prelude::*;
use rayon::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to load CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("{} has no `{column}` column", path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid GeoJSON in {}: {source}", path.display())]
    GeoJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} is not a GeoJSON feature collection", path.display())]
    NotFeatureCollection { path: PathBuf },
}

/// Where one source table lives and how to interpret it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub metric: Metric,
    pub path: PathBuf,
    pub keying: Keying,
    /// Key column that must be present in the header.
    pub country_column: String,
}

/// Loads CSV tables and GeoJSON outlines.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file with every column read as text.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoadError> {
        LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|source| LoadError::Csv {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Turn a DataFrame into one `RawRow` per line, skipping null cells.
    pub fn rows_from_frame(df: &DataFrame) -> Result<Vec<RawRow>, PolarsError> {
        let mut rows = vec![RawRow::new(); df.height()];

        for column in df.get_columns() {
            let name = column.name().to_string();
            let text = column.as_materialized_series().cast(&DataType::String)?;
            for (row, cell) in rows.iter_mut().zip(text.str()?.into_iter()) {
                if let Some(value) = cell {
                    row.insert(name.clone(), value);
                }
            }
        }

        Ok(rows)
    }

    /// Load one source table described by `spec`.
    pub fn load_source(spec: &SourceSpec) -> Result<SourceTable, LoadError> {
        let df = Self::load_csv(&spec.path)?;

        let has_country = df
            .get_column_names()
            .iter()
            .any(|name| name.as_str() == spec.country_column);
        if !has_country {
            return Err(LoadError::MissingColumn {
                path: spec.path.clone(),
                column: spec.country_column.clone(),
            });
        }

        let rows = Self::rows_from_frame(&df).map_err(|source| LoadError::Csv {
            path: spec.path.clone(),
            source,
        })?;

        tracing::debug!(
            path = %spec.path.display(),
            metric = %spec.metric,
            rows = rows.len(),
            "loaded source table"
        );

        let name = spec
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| spec.metric.to_string());

        Ok(SourceTable::new(name, spec.metric, spec.keying.clone(), rows))
    }

    /// Load every source in parallel. Each load keeps its own result so the
    /// caller can report every failure, not just the first.
    pub fn load_sources(specs: &[SourceSpec]) -> Vec<Result<SourceTable, LoadError>> {
        specs.par_iter().map(Self::load_source).collect()
    }

    /// Load country outlines from a GeoJSON feature collection.
    pub fn load_world(path: &Path) -> Result<WorldMap, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let geojson =
            GeoJson::from_reader(BufReader::new(file)).map_err(|source| LoadError::GeoJson {
                path: path.to_path_buf(),
                source,
            })?;

        let world = WorldMap::from_geojson(geojson).ok_or_else(|| {
            LoadError::NotFeatureCollection {
                path: path.to_path_buf(),
            }
        })?;

        tracing::debug!(path = %path.display(), features = world.shapes.len(), "loaded world map");
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn wide_spec(metric: Metric, path: PathBuf) -> SourceSpec {
        SourceSpec {
            metric,
            path,
            keying: Keying::Wide,
            country_column: "Country".into(),
        }
    }

    #[test]
    fn loads_wide_table_as_text_rows() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "PM25.csv",
            "Country,2010,2011,latitudes,longitudes\nA,1.5,,10,20\nWorld,7,8,0,0\n",
        );

        let table = DataLoader::load_source(&wide_spec(Metric::Pm25, path)).unwrap();

        assert_eq!(table.name, "PM25");
        assert_eq!(table.metric, Metric::Pm25);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("Country"), Some("A"));
        assert_eq!(table.rows[0].number("2010"), Some(1.5));
        assert_eq!(table.rows[0].number("2011"), None);
        assert_eq!(table.rows[0].number("latitudes"), Some(10.0));
        assert_eq!(table.rows[1].get("Country"), Some("World"));
    }

    #[test]
    fn missing_key_column_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "CO2.csv", "Nation,2010\nA,5\n");

        let err = DataLoader::load_source(&wide_spec(Metric::Co2, path)).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { ref column, .. } if column == "Country"));
    }

    #[test]
    fn parallel_load_keeps_one_result_per_source() {
        let dir = TempDir::new().unwrap();
        let co2 = write(&dir, "CO2.csv", "Country,2010\nA,5\n");
        let missing = dir.path().join("nope.csv");

        let results = DataLoader::load_sources(&[
            wide_spec(Metric::Co2, co2),
            wide_spec(Metric::Pm25, missing),
        ]);

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn world_must_be_a_feature_collection() {
        let dir = TempDir::new().unwrap();
        let point = write(&dir, "point.geo.json", r#"{"type":"Point","coordinates":[1,2]}"#);
        let world = write(
            &dir,
            "custom.geo.json",
            r#"{"type":"FeatureCollection","features":[]}"#,
        );

        assert!(matches!(
            DataLoader::load_world(&point),
            Err(LoadError::NotFeatureCollection { .. })
        ));
        assert_eq!(DataLoader::load_world(&world).unwrap(), WorldMap::default());
        assert!(matches!(
            DataLoader::load_world(&dir.path().join("absent.json")),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn truncated_world_file_is_a_geojson_error() {
        let dir = TempDir::new().unwrap();
        let truncated = write(&dir, "custom.geo.json", r#"{"type":"#);

        let err = DataLoader::load_world(&truncated).unwrap_err();
        assert!(matches!(err, LoadError::GeoJson { .. }));
        assert!(err.to_string().starts_with("invalid GeoJSON in"));
    }
}
