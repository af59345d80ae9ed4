//! Control Panel Widget
//! Left side panel: data folder, dataset mode, year/metric selectors,
//! zoom slider, export and status.

use crate::data::{DatasetMode, Metric};
use crate::view::ViewState;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Left side control panel mirroring the current view selection.
pub struct ControlPanel {
    pub data_dir: PathBuf,
    pub mode: DatasetMode,
    pub years: Vec<String>,
    pub metrics: Vec<Metric>,
    pub year: String,
    pub metric: Metric,
    pub zoom: f64,
    pub zoom_range: (f64, f64),
    pub busy: bool,
    pub ready: bool,
    pub progress: f32,
    pub status: String,
}

impl ControlPanel {
    pub fn new(data_dir: PathBuf, mode: DatasetMode, view: &ViewState) -> Self {
        let settings = view.settings();
        let mut panel = Self {
            data_dir,
            mode,
            years: Vec::new(),
            metrics: Vec::new(),
            year: String::new(),
            metric: mode.default_metric(),
            zoom: view.level(),
            zoom_range: (settings.min_level, settings.max_level),
            busy: false,
            ready: false,
            progress: 0.0,
            status: "Ready".to_string(),
        };
        panel.sync(view);
        panel
    }

    /// Copy selection and zoom back from the view after it changed.
    pub fn sync(&mut self, view: &ViewState) {
        let selection = view.selection();
        self.years = selection.years().to_vec();
        self.metrics = selection.metrics().to_vec();
        self.year = selection.year().to_string();
        self.metric = selection.metric();
        self.zoom = view.level();
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🌍 Pollution Atlas")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Emissions, PM2.5 and mortality by country")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Folder Section =====
        ui.label(RichText::new("📁 Data Folder").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(self.data_dir.display().to_string())
                            .size(12.0)
                            .color(Color32::WHITE),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_enabled_ui(!self.busy, |ui| {
                            if ui.button("📂 Browse").clicked() {
                                action = ControlPanelAction::BrowseFolder;
                            }
                        });
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Dataset Mode Section =====
        ui.label(RichText::new("⚙️ Dataset").size(14.0).strong());
        ui.add_space(5.0);

        ui.add_enabled_ui(!self.busy, |ui| {
            ui.horizontal(|ui| {
                for mode in [DatasetMode::Pollution, DatasetMode::Mortality] {
                    if ui
                        .radio_value(&mut self.mode, mode, mode.label())
                        .changed()
                    {
                        action = ControlPanelAction::ModeChanged(mode);
                    }
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Selection Section =====
        ui.label(RichText::new("🔧 Selection").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 80.0;
        let combo_width = 200.0;

        ui.add_enabled_ui(self.ready, |ui| {
            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new("Year:"));
                ComboBox::from_id_salt("year")
                    .width(combo_width)
                    .selected_text(&self.year)
                    .show_ui(ui, |ui| {
                        for year in &self.years {
                            if ui.selectable_label(self.year == *year, year).clicked() {
                                action = ControlPanelAction::YearChanged(year.clone());
                            }
                        }
                    });
            });

            ui.add_space(5.0);

            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new("Metric:"));
                ComboBox::from_id_salt("metric")
                    .width(combo_width)
                    .selected_text(self.metric.title())
                    .show_ui(ui, |ui| {
                        for &metric in &self.metrics {
                            if ui
                                .selectable_label(self.metric == metric, metric.title())
                                .clicked()
                            {
                                action = ControlPanelAction::MetricChanged(metric);
                            }
                        }
                    });
            });

            ui.add_space(5.0);

            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new("Zoom:"));
                let (min, max) = self.zoom_range;
                let response = ui.add(egui::Slider::new(&mut self.zoom, min..=max).step_by(0.1));
                let released =
                    response.drag_stopped() || (response.changed() && !response.dragged());
                if response.changed() || released {
                    action = ControlPanelAction::Zoom {
                        value: response.changed().then_some(self.zoom),
                        released,
                    };
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.ready, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export Map PNG").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportMap;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.busy),
        );

        ui.add_space(5.0);

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.ready && !self.busy {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseFolder,
    ModeChanged(DatasetMode),
    YearChanged(String),
    MetricChanged(Metric),
    /// Slider moved (`value`) and/or let go (`released`).
    Zoom { value: Option<f64>, released: bool },
    ExportMap,
}
