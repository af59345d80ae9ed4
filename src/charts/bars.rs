//! Per-country bar series shown in the popup card.

use crate::data::{MergedCountryRecord, Metric};
use crate::view::ScaleDomain;

/// Bar fill per metric (RGB).
pub fn metric_color(metric: Metric) -> [u8; 3] {
    match metric {
        Metric::Co2 => [105, 179, 162],
        Metric::Pm25 => [255, 99, 71],
        Metric::Death => [214, 39, 40],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearBar {
    pub year: String,
    /// Display value: missing and negative values become 0.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub metric: Metric,
    pub bars: Vec<YearBar>,
    pub domain: ScaleDomain,
}

impl BarSeries {
    pub fn title(&self) -> &'static str {
        self.metric.title()
    }

    /// Bar heights scaled by `progress` for the grow-in animation.
    pub fn heights_at(&self, progress: f64) -> Vec<f64> {
        let progress = progress.clamp(0.0, 1.0);
        self.bars.iter().map(|b| b.value * progress).collect()
    }
}

/// One series per metric, one bar per tracked year.
pub fn country_bars(
    record: &MergedCountryRecord,
    years: &[String],
    metrics: &[Metric],
) -> Vec<BarSeries> {
    metrics
        .iter()
        .map(|&metric| {
            let bars: Vec<YearBar> = years
                .iter()
                .map(|year| YearBar {
                    year: year.clone(),
                    value: record.value(year, metric).unwrap_or(0.0).max(0.0),
                })
                .collect();
            let domain = ScaleDomain::from_values(bars.iter().map(|b| Some(b.value)));
            BarSeries {
                metric,
                bars,
                domain,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::YearValue;
    use pretty_assertions::assert_eq;

    fn cell(year: &str, metric: Metric, value: Option<f64>) -> YearValue {
        YearValue {
            year: year.into(),
            metric,
            value,
        }
    }

    #[test]
    fn missing_and_negative_values_clamp_to_zero() {
        let record = MergedCountryRecord::new(
            "A",
            Some(1.0),
            Some(2.0),
            vec![
                cell("2010", Metric::Co2, Some(12.5)),
                cell("2011", Metric::Co2, None),
                cell("2012", Metric::Co2, Some(-3.0)),
            ],
        );
        let years: Vec<String> = ["2010", "2011", "2012"].iter().map(|y| y.to_string()).collect();

        let series = country_bars(&record, &years, &[Metric::Co2, Metric::Death]);

        assert_eq!(series.len(), 2);
        let co2: Vec<f64> = series[0].bars.iter().map(|b| b.value).collect();
        assert_eq!(co2, vec![12.5, 0.0, 0.0]);
        assert_eq!(series[0].domain.max, 20.0);
        assert_eq!(series[0].heights_at(0.5), vec![6.25, 0.0, 0.0]);

        assert!(series[1].bars.iter().all(|b| b.value == 0.0));
        assert_eq!(series[1].title(), "Deaths because of air pollution");
    }
}
