//! View State Module
//! Map viewport (zoom level, scale, pan offset), interaction mode and the
//! current selection, all changed through `ViewState::update`.

use crate::data::Metric;
use crate::view::projection::Mercator;
use crate::view::selection::Selection;
use serde::{Deserialize, Serialize};

/// Viewport constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Numerator of the slider -> scale mapping.
    pub base_width: f64,
    pub max_level: f64,
    pub min_level: f64,
    /// Added to the slider denominator.
    pub level_offset: f64,
    pub initial_level: f64,
    /// Visible area `[width, height]` in pixels.
    pub viewport: [f64; 2],
    /// Map content size at the baseline scale.
    pub content: [f64; 2],
    /// Vertical shift of the projection centre.
    pub center_offset_y: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            base_width: 2500.0,
            max_level: 14.0,
            min_level: 4.0,
            level_offset: 4.0,
            initial_level: 4.0,
            viewport: [2500.0, 800.0],
            content: [2500.0, 800.0],
            center_offset_y: 150.0,
        }
    }
}

impl ViewSettings {
    pub fn validate(&self) -> Result<(), String> {
        let finite = [
            self.base_width,
            self.max_level,
            self.min_level,
            self.level_offset,
            self.initial_level,
            self.center_offset_y,
        ]
        .iter()
        .chain(&self.viewport)
        .chain(&self.content)
        .all(|v| v.is_finite());
        if !finite {
            return Err("view settings must be finite numbers".into());
        }
        if self.base_width <= 0.0 || self.max_level <= 0.0 {
            return Err("`base_width` and `max_level` must be positive".into());
        }
        if self.min_level > self.max_level {
            return Err("`min_level` must not exceed `max_level`".into());
        }
        if self.level_offset <= 0.0 {
            return Err("`level_offset` must be positive".into());
        }
        if self.viewport.iter().chain(&self.content).any(|v| *v <= 0.0) {
            return Err("`viewport` and `content` sizes must be positive".into());
        }
        Ok(())
    }

    /// Scale at the unzoomed view.
    pub fn baseline_scale(&self) -> f64 {
        self.base_width / self.max_level
    }

    pub fn clamp_level(&self, level: f64) -> f64 {
        level.clamp(self.min_level, self.max_level)
    }

    /// `base_width / (max_level - level + level_offset)`; larger levels zoom in.
    pub fn scale_for_level(&self, level: f64) -> f64 {
        self.base_width / (self.max_level - self.clamp_level(level) + self.level_offset)
    }

    pub fn projection_center(&self) -> [f64; 2] {
        [
            self.viewport[0] / 2.0,
            self.viewport[1] / 2.0 + self.center_offset_y,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging,
    ZoomAdjust,
}

/// Input reaching the view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    PointerDown,
    Drag { dx: f64, dy: f64 },
    PointerUp,
    /// Zoom slider moved to this value.
    ZoomInput(f64),
    /// Zoom slider let go.
    ZoomRelease,
    YearChange(String),
    MetricChange(Metric),
}

/// What derived visuals an event invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChange {
    None,
    /// Scale or pan changed; re-project.
    Transform,
    /// Year or metric changed; recompute domains and recolor.
    Selection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    settings: ViewSettings,
    level: f64,
    scale: f64,
    translate: [f64; 2],
    interaction: Interaction,
    selection: Selection,
}

impl ViewState {
    pub fn new(settings: ViewSettings, selection: Selection) -> Self {
        let level = settings.clamp_level(settings.initial_level);
        Self {
            settings,
            level,
            scale: settings.scale_for_level(level),
            translate: [0.0, 0.0],
            interaction: Interaction::Idle,
            selection,
        }
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> [f64; 2] {
        self.translate
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Current scale relative to the baseline.
    pub fn scale_factor(&self) -> f64 {
        self.scale / self.settings.baseline_scale()
    }

    /// Largest allowed pan per axis at the current scale.
    pub fn max_translate(&self) -> [f64; 2] {
        let k = self.scale_factor();
        let axis = |content: f64, viewport: f64| ((content * k - viewport) * (k / 2.0)).max(0.0);
        [
            axis(self.settings.content[0], self.settings.viewport[0]),
            axis(self.settings.content[1], self.settings.viewport[1]),
        ]
    }

    /// Clip a pan offset so the map cannot leave the viewport.
    pub fn clamp(&self, translate: [f64; 2]) -> [f64; 2] {
        let [max_x, max_y] = self.max_translate();
        [
            translate[0].clamp(-max_x, max_x),
            translate[1].clamp(-max_y, max_y),
        ]
    }

    /// Accumulate a drag delta, then re-clamp.
    pub fn apply_drag(&mut self, dx: f64, dy: f64) -> bool {
        if !dx.is_finite() || !dy.is_finite() {
            return false;
        }
        let before = self.translate;
        self.translate = self.clamp([before[0] + dx, before[1] + dy]);
        self.translate != before
    }

    /// Recompute the scale from a slider value and re-clamp the existing pan.
    pub fn apply_zoom_level(&mut self, slider_value: f64) -> bool {
        if !slider_value.is_finite() {
            return false;
        }
        let before = (self.scale, self.translate);
        self.level = self.settings.clamp_level(slider_value);
        self.scale = self.settings.scale_for_level(self.level);
        self.translate = self.clamp(self.translate);
        (self.scale, self.translate) != before
    }

    /// Single entry point for every input.
    pub fn update(&mut self, event: ViewEvent) -> ViewChange {
        match event {
            ViewEvent::PointerDown => {
                self.interaction = Interaction::Dragging;
                ViewChange::None
            }
            ViewEvent::Drag { dx, dy } => {
                if self.interaction != Interaction::Dragging {
                    return ViewChange::None;
                }
                changed(self.apply_drag(dx, dy), ViewChange::Transform)
            }
            ViewEvent::PointerUp => {
                if self.interaction == Interaction::Dragging {
                    self.interaction = Interaction::Idle;
                }
                ViewChange::None
            }
            ViewEvent::ZoomInput(value) => {
                if self.interaction == Interaction::Idle {
                    self.interaction = Interaction::ZoomAdjust;
                }
                changed(self.apply_zoom_level(value), ViewChange::Transform)
            }
            ViewEvent::ZoomRelease => {
                if self.interaction == Interaction::ZoomAdjust {
                    self.interaction = Interaction::Idle;
                }
                ViewChange::None
            }
            ViewEvent::YearChange(year) => {
                changed(self.selection.set_year(&year), ViewChange::Selection)
            }
            ViewEvent::MetricChange(metric) => {
                changed(self.selection.set_metric(metric), ViewChange::Selection)
            }
        }
    }

    pub fn on_zoom_input(&mut self, slider_value: f64) -> ViewChange {
        self.update(ViewEvent::ZoomInput(slider_value))
    }

    pub fn on_year_change(&mut self, year: &str) -> ViewChange {
        self.update(ViewEvent::YearChange(year.to_string()))
    }

    /// Replace the selection after a dataset switch; pan and zoom survive.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Projection producing map pixels at the baseline scale.
    pub fn projection(&self) -> Mercator {
        Mercator::new(
            self.settings.baseline_scale(),
            self.settings.projection_center(),
        )
    }

    /// Map pixels to screen pixels: `p * scale_factor + translate`.
    pub fn to_screen(&self, point: [f64; 2]) -> [f64; 2] {
        let k = self.scale_factor();
        [
            point[0] * k + self.translate[0],
            point[1] * k + self.translate[1],
        ]
    }

    /// Screen pixels back to map pixels.
    pub fn to_map(&self, point: [f64; 2]) -> [f64; 2] {
        let k = self.scale_factor();
        [
            (point[0] - self.translate[0]) / k,
            (point[1] - self.translate[1]) / k,
        ]
    }

    /// Screen pixel to `(lon, lat)`.
    pub fn screen_to_geo(&self, point: [f64; 2]) -> (f64, f64) {
        self.projection().invert(self.to_map(point))
    }

    /// `(lon, lat)` to screen pixel.
    pub fn geo_to_screen(&self, lon: f64, lat: f64) -> [f64; 2] {
        self.to_screen(self.projection().project(lon, lat))
    }
}

fn changed(did_change: bool, change: ViewChange) -> ViewChange {
    if did_change {
        change
    } else {
        ViewChange::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state() -> ViewState {
        let selection = Selection::new(
            vec!["2010".into(), "2011".into()],
            &[Metric::Co2, Metric::Pm25, Metric::Death],
            Metric::Death,
        );
        ViewState::new(ViewSettings::default(), selection)
    }

    #[test]
    fn slider_maps_inverse_linearly_to_scale() {
        let mut view = state();
        assert!((view.scale() - 2500.0 / 14.0).abs() < 1e-9);
        assert_eq!(view.scale_factor(), 1.0);

        view.apply_zoom_level(14.0);
        assert_eq!(view.scale(), 625.0);

        view.apply_zoom_level(4.0);
        assert!((view.scale() - 178.571_428_571).abs() < 1e-6);
    }

    #[test]
    fn slider_input_is_clamped_to_range() {
        let mut view = state();
        view.apply_zoom_level(40.0);
        assert_eq!(view.level(), 14.0);
        assert_eq!(view.scale(), 625.0);
        assert!(!view.apply_zoom_level(f64::NAN));
        assert_eq!(view.level(), 14.0);
    }

    #[test]
    fn no_pan_at_baseline_zoom() {
        let mut view = state();
        assert_eq!(view.max_translate(), [0.0, 0.0]);
        view.apply_drag(300.0, -40.0);
        assert_eq!(view.translate(), [0.0, 0.0]);
    }

    #[test]
    fn drag_accumulates_and_clamps_when_zoomed() {
        let mut view = state();
        view.apply_zoom_level(9.0);
        let k = view.scale_factor();
        let max_x = (2500.0 * k - 2500.0) * (k / 2.0);

        view.apply_drag(10.0, 5.0);
        view.apply_drag(15.0, 5.0);
        assert_eq!(view.translate(), [25.0, 10.0]);

        view.apply_drag(1e7, 0.0);
        assert_eq!(view.translate()[0], max_x);
    }

    #[test]
    fn zoom_out_reclamps_without_reset() {
        let mut view = state();
        view.apply_zoom_level(14.0);
        view.apply_drag(100.0, 50.0);
        assert_eq!(view.translate(), [100.0, 50.0]);

        view.apply_zoom_level(4.0);
        assert_eq!(view.translate(), [0.0, 0.0]);
    }

    #[test]
    fn drag_events_only_apply_while_dragging() {
        let mut view = state();
        view.on_zoom_input(14.0);
        assert_eq!(view.interaction(), Interaction::ZoomAdjust);
        assert_eq!(view.update(ViewEvent::ZoomRelease), ViewChange::None);
        assert_eq!(view.interaction(), Interaction::Idle);

        assert_eq!(view.update(ViewEvent::Drag { dx: 5.0, dy: 5.0 }), ViewChange::None);
        assert_eq!(view.translate(), [0.0, 0.0]);

        view.update(ViewEvent::PointerDown);
        assert_eq!(view.interaction(), Interaction::Dragging);
        assert_eq!(
            view.update(ViewEvent::Drag { dx: 5.0, dy: 5.0 }),
            ViewChange::Transform
        );
        view.update(ViewEvent::PointerUp);
        assert_eq!(view.interaction(), Interaction::Idle);
        assert_eq!(view.translate(), [5.0, 5.0]);
    }

    #[test]
    fn selection_events_report_selection_change() {
        let mut view = state();
        assert_eq!(view.on_year_change("2011"), ViewChange::Selection);
        assert_eq!(view.on_year_change("2011"), ViewChange::None);
        assert_eq!(view.on_year_change("1900"), ViewChange::None);
        assert_eq!(
            view.update(ViewEvent::MetricChange(Metric::Co2)),
            ViewChange::Selection
        );
        assert_eq!(view.selection().field_name(), "2011_CO2");
    }

    #[test]
    fn screen_and_map_round_trip() {
        let mut view = state();
        view.apply_zoom_level(12.0);
        view.apply_drag(30.0, -20.0);
        let map = [812.5, 333.0];
        let back = view.to_map(view.to_screen(map));
        assert!((back[0] - map[0]).abs() < 1e-9 && (back[1] - map[1]).abs() < 1e-9);

        let (lon, lat) = view.screen_to_geo(view.geo_to_screen(121.0, 23.5));
        assert!((lon - 121.0).abs() < 1e-9 && (lat - 23.5).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn clamp_is_bounded_and_idempotent(
            level in 4.0f64..=14.0,
            tx in -1e6f64..1e6,
            ty in -1e6f64..1e6,
        ) {
            let mut view = state();
            view.apply_zoom_level(level);
            let [max_x, max_y] = view.max_translate();

            let once = view.clamp([tx, ty]);
            prop_assert!(once[0].abs() <= max_x && once[1].abs() <= max_y);
            prop_assert_eq!(view.clamp(once), once);
        }
    }
}
