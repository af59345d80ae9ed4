//! Pollution Atlas Main Application
//! Main window with control panel, map view and country popup.

use crate::charts::{
    card_size, country_bars, CardRenderer, MapRenderer, MapScene, MapStyle,
};
use crate::config::AtlasConfig;
use crate::data::{load_dataset, Dataset, DatasetMode};
use crate::gui::{ControlPanel, ControlPanelAction, CountryPopup, MapView, PopupAction};
use crate::view::{Selection, ViewChange, ViewEvent, ViewState};
use egui::{RichText, SidePanel};
use std::sync::mpsc::{channel, Receiver};
use std::thread;

const CARD_WIDTH: u32 = 800;

/// Dataset loading result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete(Dataset),
    Error(String),
}

/// Main application window.
pub struct AtlasApp {
    config: AtlasConfig,
    control_panel: ControlPanel,
    map_view: MapView,
    popup: CountryPopup,
    view: ViewState,
    dataset: Option<Dataset>,

    // Async dataset loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl AtlasApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AtlasConfig, mode: DatasetMode) -> Self {
        let view = ViewState::new(config.view, Self::selection_for(&config, mode));
        let control_panel = ControlPanel::new(config.data_dir.clone(), mode, &view);
        let mut app = Self {
            config,
            control_panel,
            map_view: MapView::new(),
            popup: CountryPopup::new(),
            view,
            dataset: None,
            load_rx: None,
            is_loading: false,
        };
        app.start_load(mode);
        app
    }

    fn selection_for(config: &AtlasConfig, mode: DatasetMode) -> Selection {
        Selection::new(config.years.clone(), mode.metrics(), mode.default_metric())
    }

    /// Load and reconcile `mode` in a background thread.
    fn start_load(&mut self, mode: DatasetMode) {
        if self.is_loading {
            return;
        }

        let config = self.config.clone();
        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        self.is_loading = true;
        self.control_panel.busy = true;
        self.control_panel
            .set_progress(5.0, &format!("Loading {}...", mode.label()));

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress(
                20.0,
                format!("Reading {} source tables...", mode.metrics().len()),
            ));
            let result = match load_dataset(&config, mode) {
                Ok(dataset) => LoadResult::Complete(dataset),
                Err(e) => {
                    tracing::error!(error = %e, "dataset load failed");
                    LoadResult::Error(e.to_string())
                }
            };
            let _ = tx.send(result);
        });
    }

    /// Check for dataset loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete(dataset) => {
                        self.install_dataset(dataset);
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", error));
                        self.finish_loading();
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    fn finish_loading(&mut self) {
        self.is_loading = false;
        self.control_panel.busy = false;
        self.control_panel.mode = self
            .dataset
            .as_ref()
            .map_or(self.control_panel.mode, |d| d.mode);
    }

    fn install_dataset(&mut self, dataset: Dataset) {
        let count = dataset.records.len();
        self.view
            .set_selection(Self::selection_for(&self.config, dataset.mode));
        self.dataset = Some(dataset);
        self.popup.close();
        self.map_view.invalidate();
        self.control_panel.sync(&self.view);
        self.control_panel.ready = true;
        self.finish_loading();
        self.control_panel
            .set_progress(100.0, &format!("Loaded {} countries", count));
    }

    /// Handle data folder selection
    fn handle_browse_folder(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .set_directory(&self.config.data_dir)
            .pick_folder()
        {
            tracing::info!(path = %path.display(), "data folder selected");
            self.config.data_dir = path.clone();
            self.control_panel.data_dir = path;
            self.start_load(self.control_panel.mode);
        }
    }

    /// Route one input to the view; refresh whatever it invalidated.
    fn apply_event(&mut self, event: ViewEvent) {
        let change = self.view.update(event);
        self.refresh(change);
    }

    fn refresh(&mut self, change: ViewChange) {
        match change {
            ViewChange::None => {}
            ViewChange::Transform | ViewChange::Selection => {
                self.map_view.invalidate();
                self.control_panel.sync(&self.view);
            }
        }
    }

    fn handle_action(&mut self, action: ControlPanelAction) {
        match action {
            ControlPanelAction::BrowseFolder => self.handle_browse_folder(),
            ControlPanelAction::ModeChanged(mode) => self.start_load(mode),
            ControlPanelAction::YearChanged(year) => {
                let change = self.view.on_year_change(&year);
                self.refresh(change);
            }
            ControlPanelAction::MetricChanged(metric) => {
                self.apply_event(ViewEvent::MetricChange(metric))
            }
            ControlPanelAction::Zoom { value, released } => {
                if let Some(value) = value {
                    let change = self.view.on_zoom_input(value);
                    self.refresh(change);
                }
                if released {
                    self.apply_event(ViewEvent::ZoomRelease);
                }
            }
            ControlPanelAction::ExportMap => self.handle_export_map(),
            ControlPanelAction::None => {}
        }
    }

    /// Handle map PNG export
    fn handle_export_map(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.control_panel.set_progress(0.0, "No map to export");
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(format!("atlas_{}.png", self.view.selection().field_name()))
            .save_file()
        else {
            return;
        };

        let scene = MapScene {
            world: &dataset.world,
            records: &dataset.records,
            view: &self.view,
            style: MapStyle::from(dataset.mode),
        };
        let status = match MapRenderer::render_png(&path, &scene) {
            Ok(()) => format!("Map saved to {}", path.display()),
            Err(e) => format!("Error: {}", e),
        };
        self.control_panel.set_progress(100.0, &status);
    }

    /// Handle country card export from the popup
    fn handle_export_card(&mut self) {
        let Some((record, series)) = self.popup.current() else {
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(format!("{}.png", record.name))
            .save_file()
        else {
            return;
        };

        let size = card_size(CARD_WIDTH, series.len());
        let status = match CardRenderer::render_png(&path, record, series, size) {
            Ok(()) => format!("Card saved to {}", path.display()),
            Err(e) => format!("Error: {}", e),
        };
        self.control_panel.set_progress(100.0, &status);
    }

    fn open_popup(&mut self, name: &str) {
        let Some(record) = self.dataset.as_ref().and_then(|d| d.record(name)) else {
            tracing::debug!(country = name, "clicked country has no record");
            return;
        };
        let selection = self.view.selection();
        let series = country_bars(record, selection.years(), selection.metrics());
        self.popup.open(record.clone(), series);
    }
}

impl eframe::App for AtlasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);
                    self.handle_action(action);
                });
            });

        // Central panel - Map
        let mut map_response = None;
        egui::CentralPanel::default().show(ctx, |ui| match &self.dataset {
            Some(dataset) => {
                map_response = Some(self.map_view.show(ui, dataset, &self.view));
            }
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("No Data").size(20.0));
                });
            }
        });

        if let Some(response) = map_response {
            if let Some(error) = response.error {
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", error));
            }
            for event in response.events {
                self.apply_event(event);
            }
            if let Some(name) = response.clicked {
                self.open_popup(&name);
            }
        }

        if self.popup.show(ctx) == PopupAction::ExportCard {
            self.handle_export_card();
        }
    }
}
