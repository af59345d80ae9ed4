//! Country Popup Window
//! Name, coordinates and one animated bar chart per metric for the
//! clicked country.

use crate::charts::{coordinates_label, metric_color, BarSeries};
use crate::data::MergedCountryRecord;
use crate::view::{Transition, BAR_GROWTH};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Plot};
use std::time::Instant;

const CHART_HEIGHT: f32 = 150.0;

struct OpenCountry {
    record: MergedCountryRecord,
    series: Vec<BarSeries>,
    opened_at: Instant,
}

#[derive(Default)]
pub struct CountryPopup {
    open: Option<OpenCountry>,
}

/// Actions triggered by the popup
#[derive(Debug, Clone, PartialEq)]
pub enum PopupAction {
    None,
    ExportCard,
}

impl CountryPopup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `record`; bars restart their grow-in animation.
    pub fn open(&mut self, record: MergedCountryRecord, series: Vec<BarSeries>) {
        tracing::debug!(country = %record.name, "popup opened");
        self.open = Some(OpenCountry {
            record,
            series,
            opened_at: Instant::now(),
        });
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    /// Record and series currently shown.
    pub fn current(&self) -> Option<(&MergedCountryRecord, &[BarSeries])> {
        self.open
            .as_ref()
            .map(|open| (&open.record, open.series.as_slice()))
    }

    pub fn show(&mut self, ctx: &egui::Context) -> PopupAction {
        let Some(open) = &self.open else {
            return PopupAction::None;
        };

        let mut action = PopupAction::None;
        let mut keep_open = true;
        let transition = Transition::new(BAR_GROWTH);
        let elapsed = open.opened_at.elapsed();
        let progress = transition.progress(elapsed);

        egui::Window::new(RichText::new(&open.record.name).size(16.0).strong())
            .id(egui::Id::new("country_popup"))
            .open(&mut keep_open)
            .collapsible(false)
            .resizable(false)
            .default_width(420.0)
            .show(ctx, |ui| {
                ui.label(
                    RichText::new(coordinates_label(&open.record))
                        .size(12.0)
                        .color(Color32::GRAY),
                );
                ui.add_space(8.0);

                for series in &open.series {
                    ui.label(RichText::new(series.title()).size(13.0).strong());
                    Self::draw_bars(ui, &open.record.name, series, progress);
                    ui.add_space(6.0);
                }

                ui.vertical_centered(|ui| {
                    if ui.button("💾 Save as PNG").clicked() {
                        action = PopupAction::ExportCard;
                    }
                });
            });

        if !transition.is_finished(elapsed) {
            ctx.request_repaint();
        }
        if !keep_open {
            self.close();
        }
        action
    }

    fn draw_bars(ui: &mut egui::Ui, country: &str, series: &BarSeries, progress: f64) {
        let [r, g, b] = metric_color(series.metric);
        let color = Color32::from_rgb(r, g, b);
        let labels: Vec<String> = series.bars.iter().map(|bar| bar.year.clone()).collect();

        let bars: Vec<Bar> = series
            .heights_at(progress)
            .into_iter()
            .enumerate()
            .map(|(i, height)| {
                Bar::new(i as f64, height)
                    .width(0.7)
                    .fill(color)
                    .name(&labels[i])
            })
            .collect();

        Plot::new(format!("bars_{}_{}", country, series.metric))
            .height(CHART_HEIGHT)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .include_y(0.0)
            .include_y(series.domain.max)
            .y_axis_label(series.metric.unit())
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(color).name(series.title()));
            });
    }
}
