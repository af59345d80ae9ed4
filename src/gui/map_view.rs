//! Map View Widget
//! Shows the rendered map as a texture, turns pointer drags into view
//! events, highlights the hovered country and draws the fading tooltip.

use crate::charts::{Highlight, MapRenderer, MapScene, MapStyle, HIGHLIGHT_WIDTH};
use crate::data::Dataset;
use crate::view::{Transition, ViewEvent, ViewState, TOOLTIP_FADE_IN, TOOLTIP_FADE_OUT};
use egui::{
    Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, TextureHandle, TextureOptions,
};
use std::time::Instant;

const TOOLTIP_OPACITY: f32 = 0.9;

/// What the map produced this frame.
#[derive(Debug, Default)]
pub struct MapViewResponse {
    pub events: Vec<ViewEvent>,
    pub clicked: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
struct Tooltip {
    name: String,
    pos: Pos2,
    shown_at: Instant,
    hidden_at: Option<Instant>,
}

impl Tooltip {
    fn transition(&self, now: Instant) -> (Transition, std::time::Duration) {
        match self.hidden_at {
            None => (
                Transition::new(TOOLTIP_FADE_IN),
                now.saturating_duration_since(self.shown_at),
            ),
            Some(hidden_at) => (
                Transition::new(TOOLTIP_FADE_OUT),
                now.saturating_duration_since(hidden_at),
            ),
        }
    }

    /// Fades in while hovered, fades out after the pointer leaves.
    fn opacity(&self, now: Instant) -> f32 {
        let (transition, elapsed) = self.transition(now);
        let progress = transition.progress(elapsed);
        let visible = if self.hidden_at.is_some() {
            1.0 - progress
        } else {
            progress
        };
        visible as f32 * TOOLTIP_OPACITY
    }

    fn is_animating(&self, now: Instant) -> bool {
        let (transition, elapsed) = self.transition(now);
        !transition.is_finished(elapsed)
    }
}

#[derive(Default)]
pub struct MapView {
    texture: Option<TextureHandle>,
    dirty: bool,
    tooltip: Option<Tooltip>,
}

impl MapView {
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..Self::default()
        }
    }

    /// Re-render on the next frame.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    fn refresh_texture(&mut self, ctx: &egui::Context, scene: &MapScene) -> Result<(), String> {
        if !self.dirty && self.texture.is_some() {
            return Ok(());
        }
        let (w, h) = scene.size();
        let pixels = MapRenderer::render_rgb(scene).map_err(|e| e.to_string())?;
        let image = egui::ColorImage::from_rgb([w as usize, h as usize], &pixels);

        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => self.texture = Some(ctx.load_texture("map", image, TextureOptions::LINEAR)),
        }
        self.dirty = false;
        tracing::debug!(width = w, height = h, "map texture refreshed");
        Ok(())
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        dataset: &Dataset,
        view: &ViewState,
    ) -> MapViewResponse {
        let mut out = MapViewResponse::default();
        let scene = MapScene {
            world: &dataset.world,
            records: &dataset.records,
            view,
            style: MapStyle::from(dataset.mode),
        };

        if let Err(e) = self.refresh_texture(ui.ctx(), &scene) {
            out.error = Some(e);
        }

        let (w, h) = scene.size();
        let width = ui.available_width().max(1.0);
        let size = egui::vec2(width, width * h as f32 / w as f32);
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let rect = response.rect;

        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        // screen pixels of the rendered map per UI point
        let ratio = w as f64 / rect.width() as f64;
        let to_pixels = |pos: Pos2| {
            [
                (pos.x - rect.min.x) as f64 * ratio,
                (pos.y - rect.min.y) as f64 * ratio,
            ]
        };

        if response.drag_started() {
            out.events.push(ViewEvent::PointerDown);
        }
        if response.dragged() {
            let delta = response.drag_delta();
            if delta != egui::Vec2::ZERO {
                out.events.push(ViewEvent::Drag {
                    dx: delta.x as f64 * ratio,
                    dy: delta.y as f64 * ratio,
                });
            }
        }
        if response.drag_stopped() {
            out.events.push(ViewEvent::PointerUp);
        }

        let hovered = response
            .hover_pos()
            .and_then(|pos| scene.country_at(to_pixels(pos)).map(|name| (name, pos)));
        if let Some(highlight) = hovered.and_then(|(name, _)| scene.highlight(name)) {
            draw_highlight(&painter, &highlight, rect.min, ratio);
        }
        self.track_hover(hovered);

        if response.clicked() {
            out.clicked = response
                .interact_pointer_pos()
                .and_then(|pos| scene.country_at(to_pixels(pos)))
                .map(str::to_string);
        }

        let now = Instant::now();
        let mut faded_out = false;
        if let Some(tooltip) = &self.tooltip {
            draw_tooltip(&painter, tooltip, tooltip.opacity(now));
            if tooltip.is_animating(now) {
                ui.ctx().request_repaint();
            } else {
                faded_out = tooltip.hidden_at.is_some();
            }
        }
        if faded_out {
            self.tooltip = None;
        }

        out
    }

    fn track_hover(&mut self, hovered: Option<(&str, Pos2)>) {
        let now = Instant::now();
        match hovered {
            Some((name, pos)) => {
                if let Some(tooltip) = self.tooltip.as_mut().filter(|t| t.name == name) {
                    tooltip.pos = pos;
                    if tooltip.hidden_at.take().is_some() {
                        tooltip.shown_at = now;
                    }
                } else {
                    self.tooltip = Some(Tooltip {
                        name: name.to_string(),
                        pos,
                        shown_at: now,
                        hidden_at: None,
                    });
                }
            }
            None => {
                if let Some(tooltip) = &mut self.tooltip {
                    tooltip.hidden_at.get_or_insert(now);
                }
            }
        }
    }
}

/// Overlay drawn on top of the texture; map pixels are scaled down by `ratio`.
fn draw_highlight(painter: &egui::Painter, highlight: &Highlight, origin: Pos2, ratio: f64) {
    let to_ui = |[x, y]: [f64; 2]| origin + egui::vec2((x / ratio) as f32, (y / ratio) as f32);
    match highlight {
        Highlight::Outline(rings) => {
            for ring in rings {
                let points: Vec<Pos2> = ring.iter().copied().map(to_ui).collect();
                painter.add(Shape::line(
                    points,
                    Stroke::new(HIGHLIGHT_WIDTH, Color32::BLACK),
                ));
            }
        }
        Highlight::Marker { center, radius } => {
            painter.circle_filled(to_ui(*center), (radius / ratio) as f32, Color32::RED);
        }
    }
}

fn draw_tooltip(painter: &egui::Painter, tooltip: &Tooltip, opacity: f32) {
    if opacity <= 0.0 {
        return;
    }
    let anchor = tooltip.pos + egui::vec2(12.0, -12.0);
    let galley = painter.layout_no_wrap(
        tooltip.name.clone(),
        FontId::proportional(14.0),
        Color32::BLACK.gamma_multiply(opacity),
    );
    let text_rect = Align2::LEFT_BOTTOM.anchor_size(anchor, galley.size());
    painter.rect_filled(
        text_rect.expand(4.0),
        3.0,
        Color32::WHITE.gamma_multiply(opacity),
    );
    painter.galley(text_rect.min, galley, Color32::BLACK);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tooltip_fades_in_then_out() {
        let start = Instant::now();
        let mut tooltip = Tooltip {
            name: "Chile".into(),
            pos: Pos2::ZERO,
            shown_at: start,
            hidden_at: None,
        };

        assert_eq!(tooltip.opacity(start), 0.0);
        assert!(tooltip.is_animating(start + Duration::from_millis(100)));
        assert_eq!(tooltip.opacity(start + TOOLTIP_FADE_IN), TOOLTIP_OPACITY);

        let left = start + Duration::from_secs(1);
        tooltip.hidden_at = Some(left);
        assert_eq!(tooltip.opacity(left), TOOLTIP_OPACITY);
        assert_eq!(tooltip.opacity(left + TOOLTIP_FADE_OUT), 0.0);
        assert!(!tooltip.is_animating(left + TOOLTIP_FADE_OUT));
    }
}
