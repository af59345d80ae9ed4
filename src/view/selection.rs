//! Selected year/metric and the value domain derived from it.

use crate::data::{MergedCountryRecord, Metric};

/// Upper bound used when nothing positive is selected.
pub const DEFAULT_DOMAIN_MAX: f64 = 100.0;

/// `[0, max]` domain of a color or bar-height scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleDomain {
    pub max: f64,
}

impl ScaleDomain {
    /// `[0, ceil(max / 10) * 10]` over the present values.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let max = values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        let rounded = (max / 10.0).ceil() * 10.0;
        let max = if rounded.is_finite() && rounded > 0.0 {
            rounded
        } else {
            DEFAULT_DOMAIN_MAX
        };
        Self { max }
    }

    pub fn min(&self) -> f64 {
        0.0
    }

    /// Position of `value` inside the domain, clamped to `[0, 1]`.
    pub fn normalize(&self, value: f64) -> f64 {
        (value / self.max).clamp(0.0, 1.0)
    }
}

impl Default for ScaleDomain {
    fn default() -> Self {
        Self {
            max: DEFAULT_DOMAIN_MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    years: Vec<String>,
    metrics: Vec<Metric>,
    year: String,
    metric: Metric,
}

impl Selection {
    /// Start on the first tracked year and `metric` (or the first metric
    /// when `metric` is not offered).
    pub fn new(years: Vec<String>, metrics: &[Metric], metric: Metric) -> Self {
        let year = years.first().cloned().unwrap_or_default();
        let metric = if metrics.contains(&metric) {
            metric
        } else {
            metrics.first().copied().unwrap_or(metric)
        };
        Self {
            years,
            metrics: metrics.to_vec(),
            year,
            metric,
        }
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn years(&self) -> &[String] {
        &self.years
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Returns `false` when the year is not tracked or already selected.
    pub fn set_year(&mut self, year: &str) -> bool {
        if year == self.year || !self.years.iter().any(|y| y == year) {
            return false;
        }
        self.year = year.to_string();
        true
    }

    pub fn set_metric(&mut self, metric: Metric) -> bool {
        if metric == self.metric || !self.metrics.contains(&metric) {
            return false;
        }
        self.metric = metric;
        true
    }

    /// Merged field name of the selection (`2010_Death`).
    pub fn field_name(&self) -> String {
        MergedCountryRecord::field_name(&self.year, self.metric)
    }

    pub fn value_of(&self, record: &MergedCountryRecord) -> Option<f64> {
        record.value(&self.year, self.metric)
    }

    pub fn domain(&self, records: &[MergedCountryRecord]) -> ScaleDomain {
        ScaleDomain::from_values(records.iter().map(|r| self.value_of(r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::YearValue;

    fn record(name: &str, year: &str, metric: Metric, value: Option<f64>) -> MergedCountryRecord {
        MergedCountryRecord::new(
            name,
            None,
            None,
            vec![YearValue {
                year: year.into(),
                metric,
                value,
            }],
        )
    }

    fn years() -> Vec<String> {
        vec!["2010".into(), "2011".into()]
    }

    #[test]
    fn domain_rounds_up_to_tens() {
        assert_eq!(ScaleDomain::from_values([Some(3.2), None, Some(41.0)]).max, 50.0);
        assert_eq!(ScaleDomain::from_values([Some(40.0)]).max, 40.0);
        assert_eq!(ScaleDomain::from_values([Some(0.01)]).max, 10.0);
    }

    #[test]
    fn empty_or_non_positive_domain_falls_back() {
        assert_eq!(ScaleDomain::from_values([None, None]).max, DEFAULT_DOMAIN_MAX);
        assert_eq!(ScaleDomain::from_values([Some(0.0), Some(-4.0)]).max, DEFAULT_DOMAIN_MAX);
    }

    #[test]
    fn normalize_clamps() {
        let domain = ScaleDomain { max: 50.0 };
        assert_eq!(domain.normalize(25.0), 0.5);
        assert_eq!(domain.normalize(-1.0), 0.0);
        assert_eq!(domain.normalize(80.0), 1.0);
    }

    #[test]
    fn unknown_year_or_metric_is_ignored() {
        let mut selection = Selection::new(years(), &[Metric::Co2, Metric::Pm25], Metric::Death);
        assert_eq!(selection.metric(), Metric::Co2);
        assert_eq!(selection.year(), "2010");

        assert!(!selection.set_year("1999"));
        assert!(!selection.set_year("2010"));
        assert!(selection.set_year("2011"));
        assert!(!selection.set_metric(Metric::Death));
        assert!(selection.set_metric(Metric::Pm25));
        assert_eq!(selection.field_name(), "2011_PM25");
    }

    #[test]
    fn domain_follows_selected_field() {
        let records = vec![
            record("A", "2010", Metric::Death, Some(12.0)),
            record("B", "2010", Metric::Death, None),
            record("C", "2011", Metric::Death, Some(95.0)),
        ];
        let mut selection = Selection::new(years(), &[Metric::Death], Metric::Death);

        assert_eq!(selection.domain(&records).max, 20.0);
        selection.set_year("2011");
        assert_eq!(selection.domain(&records).max, 100.0);
    }
}
