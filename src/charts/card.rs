//! Country Card Renderer
//! Static PNG version of the country popup: a header with name and
//! coordinates, then one bar chart per metric over the tracked years.

use crate::charts::bars::{metric_color, BarSeries};
use crate::charts::RenderError;
use crate::data::MergedCountryRecord;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

const HEADER_HEIGHT: u32 = 60;

pub struct CardRenderer;

impl CardRenderer {
    pub fn draw<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        record: &MergedCountryRecord,
        series: &[BarSeries],
    ) -> Result<(), RenderError> {
        area.fill(&WHITE)?;
        let (header, body) = area.split_vertically(HEADER_HEIGHT);

        header.draw(&Text::new(
            record.name.clone(),
            (20, 10),
            ("sans-serif", 22).into_font().color(&BLACK),
        ))?;
        header.draw(&Text::new(
            coordinates_label(record),
            (20, 38),
            ("sans-serif", 13).into_font().color(&BLACK.mix(0.6)),
        ))?;

        let panels = body.split_evenly((series.len().max(1), 1));
        for (panel, series) in panels.iter().zip(series) {
            Self::draw_series(panel, series)?;
        }
        Ok(())
    }

    fn draw_series<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        series: &BarSeries,
    ) -> Result<(), RenderError> {
        if series.bars.is_empty() {
            return Ok(());
        }
        let n = series.bars.len() as u32;
        let years: Vec<&str> = series.bars.iter().map(|b| b.year.as_str()).collect();

        let mut chart = ChartBuilder::on(area)
            .caption(series.title(), ("sans-serif", 16))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d((0..n).into_segmented(), 0.0..series.domain.max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n as usize)
            .x_label_formatter(&|x| match x {
                SegmentValue::CenterOf(i) => years
                    .get(*i as usize)
                    .map(|y| y.to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .y_desc(series.metric.unit())
            .draw()?;

        let [r, g, b] = metric_color(series.metric);
        chart.draw_series(
            Histogram::vertical(&chart)
                .style(RGBColor(r, g, b).filled())
                .margin(6)
                .data(
                    series
                        .bars
                        .iter()
                        .enumerate()
                        .map(|(i, bar)| (i as u32, bar.value)),
                ),
        )?;
        Ok(())
    }

    pub fn render_png(
        path: &Path,
        record: &MergedCountryRecord,
        series: &[BarSeries],
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        Self::draw(&root, record, series)?;
        root.present()?;
        tracing::info!(path = %path.display(), country = %record.name, "country card written");
        Ok(())
    }
}

/// `lat 23.50, lon 121.00`, or a placeholder when unknown.
pub fn coordinates_label(record: &MergedCountryRecord) -> String {
    match (record.latitude, record.longitude) {
        (Some(lat), Some(lon)) => format!("lat {:.2}, lon {:.2}", lat, lon),
        _ => "coordinates unavailable".to_string(),
    }
}

/// Card height giving each metric panel the same room.
pub fn card_size(width: u32, metric_count: usize) -> (u32, u32) {
    (width, HEADER_HEIGHT + 260 * metric_count.max(1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_label_formats_or_falls_back() {
        let known = MergedCountryRecord::new("Taiwan", Some(23.5), Some(121.0), Vec::new());
        assert_eq!(coordinates_label(&known), "lat 23.50, lon 121.00");

        let unknown = MergedCountryRecord::new("Nowhere", None, Some(3.0), Vec::new());
        assert_eq!(coordinates_label(&unknown), "coordinates unavailable");
    }

    #[test]
    fn card_grows_with_metric_count() {
        assert_eq!(card_size(800, 3), (800, 840));
        assert_eq!(card_size(800, 0), (800, 320));
    }
}
