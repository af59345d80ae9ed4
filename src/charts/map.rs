//! Map Renderer Module
//! Draws the choropleth or marker map for the current view with plotters.
//!
//! Layout (screen pixels, viewport sized):
//! 1. Country outlines, projected then transformed by the view pan/zoom
//! 2. Choropleth: fill from the Blues scale + vertical legend on the right
//! 3. Markers: one translucent red circle + name label per country

use crate::charts::color::{self, BluesScale, LAND, OUTLINE};
use crate::charts::RenderError;
use crate::data::{DatasetMode, MergedCountryRecord, WorldMap};
use crate::view::ViewState;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

/// Marker radius at the baseline zoom.
pub const MARKER_RADIUS: f64 = 7.0;
const LABEL_OFFSET: i32 = 10;

/// Stroke width of a hovered country's outline.
pub const HIGHLIGHT_WIDTH: f32 = 3.0;

const LEGEND_WIDTH: i32 = 20;
const LEGEND_HEIGHT: i32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStyle {
    Choropleth,
    Markers,
}

impl From<DatasetMode> for MapStyle {
    fn from(mode: DatasetMode) -> Self {
        match mode {
            DatasetMode::Pollution => MapStyle::Markers,
            DatasetMode::Mortality => MapStyle::Choropleth,
        }
    }
}

/// Overlay for the country under the pointer, in screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum Highlight {
    /// Every ring of the country, stroked black.
    Outline(Vec<Vec<[f64; 2]>>),
    /// The country's marker, drawn fully opaque.
    Marker { center: [f64; 2], radius: f64 },
}

/// Everything one map frame is drawn from.
#[derive(Debug, Clone, Copy)]
pub struct MapScene<'a> {
    pub world: &'a WorldMap,
    pub records: &'a [MergedCountryRecord],
    pub view: &'a ViewState,
    pub style: MapStyle,
}

impl<'a> MapScene<'a> {
    /// Output size in pixels (the viewport).
    pub fn size(&self) -> (u32, u32) {
        let [w, h] = self.view.settings().viewport;
        (w.round().max(1.0) as u32, h.round().max(1.0) as u32)
    }

    pub fn color_scale(&self) -> BluesScale {
        BluesScale::new(self.view.selection().domain(self.records))
    }

    pub fn record(&self, name: &str) -> Option<&'a MergedCountryRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn marker_radius(&self) -> f64 {
        MARKER_RADIUS * self.view.scale_factor()
    }

    /// Name of the country under a screen pixel: the nearest marker in
    /// marker mode, the containing outline in choropleth mode.
    pub fn country_at(&self, screen: [f64; 2]) -> Option<&'a str> {
        match self.style {
            MapStyle::Markers => {
                let radius = self.marker_radius();
                self.records
                    .iter()
                    .filter_map(|r| {
                        let (lon, lat) = r.coordinates()?;
                        let [x, y] = self.view.geo_to_screen(lon, lat);
                        let dist = ((x - screen[0]).powi(2) + (y - screen[1]).powi(2)).sqrt();
                        (dist <= radius).then_some((dist, r.name.as_str()))
                    })
                    .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(_, name)| name)
            }
            MapStyle::Choropleth => {
                let (lon, lat) = self.view.screen_to_geo(screen);
                self.world
                    .country_at(lon, lat)
                    .map(|shape| shape.name.as_str())
                    .filter(|name| !name.is_empty())
            }
        }
    }

    /// Hover overlay for `name`. Choropleth countries are outlined only
    /// when they have a value for the current selection.
    pub fn highlight(&self, name: &str) -> Option<Highlight> {
        let record = self.record(name)?;
        match self.style {
            MapStyle::Choropleth => {
                self.view.selection().value_of(record)?;
                let shape = self.world.shapes.iter().find(|s| s.name == name)?;
                let rings = shape
                    .polygons
                    .iter()
                    .flatten()
                    .map(|ring| {
                        ring.iter()
                            .map(|&[lon, lat]| self.view.geo_to_screen(lon, lat))
                            .collect()
                    })
                    .collect();
                Some(Highlight::Outline(rings))
            }
            MapStyle::Markers => {
                let (lon, lat) = record.coordinates()?;
                Some(Highlight::Marker {
                    center: self.view.geo_to_screen(lon, lat),
                    radius: self.marker_radius(),
                })
            }
        }
    }

    /// Ring in screen pixels.
    pub fn project_ring(&self, ring: &[[f64; 2]]) -> Vec<(i32, i32)> {
        ring.iter()
            .map(|&[lon, lat]| {
                let [x, y] = self.view.geo_to_screen(lon, lat);
                (x.round() as i32, y.round() as i32)
            })
            .collect()
    }
}

fn rgb(c: [u8; 3]) -> RGBColor {
    RGBColor(c[0], c[1], c[2])
}

/// Renders map scenes to any plotters backend.
pub struct MapRenderer;

impl MapRenderer {
    pub fn draw<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        scene: &MapScene,
    ) -> Result<(), RenderError> {
        area.fill(&WHITE)?;

        let scale = scene.color_scale();
        let outline = rgb(OUTLINE).stroke_width(1);

        for shape in &scene.world.shapes {
            let fill = match scene.style {
                MapStyle::Choropleth => scale.color(
                    scene
                        .record(&shape.name)
                        .and_then(|r| scene.view.selection().value_of(r)),
                ),
                MapStyle::Markers => LAND,
            };

            for polygon in &shape.polygons {
                if let Some(outer) = polygon.first() {
                    let points = scene.project_ring(outer);
                    if points.len() >= 3 {
                        area.draw(&Polygon::new(points, rgb(fill).filled()))?;
                    }
                }
                for ring in polygon {
                    let points = scene.project_ring(ring);
                    if points.len() >= 2 {
                        area.draw(&PathElement::new(points, outline))?;
                    }
                }
            }
        }

        match scene.style {
            MapStyle::Markers => Self::draw_markers(area, scene)?,
            MapStyle::Choropleth => Self::draw_legend(area, scene, &scale)?,
        }

        Ok(())
    }

    fn draw_markers<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        scene: &MapScene,
    ) -> Result<(), RenderError> {
        let radius = scene.marker_radius().round().max(1.0) as i32;
        let label = ("sans-serif", 11).into_font().color(&BLACK);

        for record in scene.records {
            let Some((lon, lat)) = record.coordinates() else {
                continue;
            };
            let [x, y] = scene.view.geo_to_screen(lon, lat);
            let (x, y) = (x.round() as i32, y.round() as i32);
            area.draw(&Circle::new((x, y), radius, RED.mix(0.5).filled()))?;
            area.draw(&Text::new(
                record.name.clone(),
                (x + LABEL_OFFSET, y),
                label.clone(),
            ))?;
        }
        Ok(())
    }

    fn draw_legend<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        scene: &MapScene,
        scale: &BluesScale,
    ) -> Result<(), RenderError> {
        let (width, _) = scene.size();
        let x0 = width as i32 - LEGEND_WIDTH - 170;
        let y0 = 155;

        // gradient, dark at the top
        for dy in 0..LEGEND_HEIGHT {
            let t = 1.0 - dy as f64 / (LEGEND_HEIGHT - 1) as f64;
            let c = BluesScale::interpolate(t);
            area.draw(&Rectangle::new(
                [(x0, y0 + dy), (x0 + LEGEND_WIDTH, y0 + dy + 1)],
                rgb(c).filled(),
            ))?;
        }

        let font = ("sans-serif", 12).into_font().color(&BLACK);
        let domain = scale.domain;
        for tick in color::legend_ticks(&domain) {
            let y = y0 + ((1.0 - domain.normalize(tick)) * LEGEND_HEIGHT as f64).round() as i32;
            area.draw(&PathElement::new(
                vec![(x0 + LEGEND_WIDTH, y), (x0 + LEGEND_WIDTH + 5, y)],
                BLACK,
            ))?;
            area.draw(&Text::new(
                color::format_tick(tick),
                (x0 + LEGEND_WIDTH + 10, y - 6),
                font.clone(),
            ))?;
        }

        let selection = scene.view.selection();
        area.draw(&Text::new(
            format!("{} ({})", selection.metric().title(), selection.year()),
            (x0 - 60, y0 - 30),
            font,
        ))?;
        Ok(())
    }

    /// Render to a PNG file.
    pub fn render_png(path: &Path, scene: &MapScene) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, scene.size()).into_drawing_area();
        Self::draw(&root, scene)?;
        root.present()?;
        tracing::info!(path = %path.display(), "map written");
        Ok(())
    }

    /// Render into a packed RGB buffer of `scene.size()`.
    pub fn render_rgb(scene: &MapScene) -> Result<Vec<u8>, RenderError> {
        let (w, h) = scene.size();
        let mut buffer = vec![255u8; (w as usize) * (h as usize) * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
            Self::draw(&root, scene)?;
            root.present()?;
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CountryShape, Metric, YearValue};
    use crate::view::{Selection, ViewSettings};

    fn world() -> WorldMap {
        WorldMap {
            shapes: vec![CountryShape {
                name: "Squareland".into(),
                polygons: vec![vec![vec![
                    [0.0, 0.0],
                    [10.0, 0.0],
                    [10.0, 10.0],
                    [0.0, 10.0],
                    [0.0, 0.0],
                ]]],
            }],
        }
    }

    fn records() -> Vec<MergedCountryRecord> {
        vec![MergedCountryRecord::new(
            "Squareland",
            Some(5.0),
            Some(5.0),
            vec![YearValue {
                year: "2010".into(),
                metric: Metric::Co2,
                value: Some(3.0),
            }],
        )]
    }

    fn view() -> ViewState {
        ViewState::new(
            ViewSettings::default(),
            Selection::new(vec!["2010".into()], &[Metric::Co2], Metric::Co2),
        )
    }

    #[test]
    fn style_follows_mode() {
        assert_eq!(MapStyle::from(DatasetMode::Pollution), MapStyle::Markers);
        assert_eq!(MapStyle::from(DatasetMode::Mortality), MapStyle::Choropleth);
    }

    #[test]
    fn choropleth_hit_test_uses_outlines() {
        let (world, records, view) = (world(), records(), view());
        let scene = MapScene {
            world: &world,
            records: &records,
            view: &view,
            style: MapStyle::Choropleth,
        };

        let inside = view.geo_to_screen(2.0, 2.0);
        assert_eq!(scene.country_at(inside), Some("Squareland"));
        let outside = view.geo_to_screen(-40.0, 30.0);
        assert_eq!(scene.country_at(outside), None);
        assert_eq!(scene.size(), (2500, 800));
    }

    #[test]
    fn marker_hit_test_uses_scaled_radius() {
        let (world, records, mut view) = (world(), records(), view());
        view.apply_zoom_level(14.0);
        let scene = MapScene {
            world: &world,
            records: &records,
            view: &view,
            style: MapStyle::Markers,
        };

        let [x, y] = view.geo_to_screen(5.0, 5.0);
        let radius = scene.marker_radius();
        assert!((radius - MARKER_RADIUS * 3.5).abs() < 1e-9);
        assert_eq!(scene.country_at([x + radius - 0.5, y]), Some("Squareland"));
        assert_eq!(scene.country_at([x + radius + 0.5, y]), None);
    }

    #[test]
    fn hover_outlines_only_countries_with_values() {
        let (world, records, view) = (world(), records(), view());
        let scene = MapScene {
            world: &world,
            records: &records,
            view: &view,
            style: MapStyle::Choropleth,
        };

        let Some(Highlight::Outline(rings)) = scene.highlight("Squareland") else {
            panic!("expected an outline");
        };
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 5);
        assert_eq!(rings[0][2], view.geo_to_screen(10.0, 10.0));
        assert_eq!(scene.highlight("Nowhere"), None);

        let blank = vec![MergedCountryRecord::new(
            "Squareland",
            Some(5.0),
            Some(5.0),
            vec![YearValue {
                year: "2010".into(),
                metric: Metric::Co2,
                value: None,
            }],
        )];
        let scene = MapScene {
            records: &blank,
            ..scene
        };
        assert_eq!(scene.highlight("Squareland"), None);
    }

    #[test]
    fn hover_marker_sits_on_projected_coordinates() {
        let (world, records, view) = (world(), records(), view());
        let scene = MapScene {
            world: &world,
            records: &records,
            view: &view,
            style: MapStyle::Markers,
        };

        assert_eq!(
            scene.highlight("Squareland"),
            Some(Highlight::Marker {
                center: view.geo_to_screen(5.0, 5.0),
                radius: scene.marker_radius(),
            })
        );
    }

    #[test]
    fn rings_follow_view_transform() {
        let (world, records, mut view) = (world(), records(), view());
        let scene_points = |view: &ViewState| {
            MapScene {
                world: &world,
                records: &records,
                view,
                style: MapStyle::Choropleth,
            }
            .project_ring(&world.shapes[0].polygons[0][0])
        };

        let before = scene_points(&view);
        view.apply_zoom_level(14.0);
        view.update(crate::view::ViewEvent::PointerDown);
        view.update(crate::view::ViewEvent::Drag { dx: 40.0, dy: 0.0 });
        let after = scene_points(&view);

        assert_eq!(before.len(), 5);
        assert_ne!(before, after);
        let [cx, cy] = view.to_screen(view.projection().project(0.0, 0.0));
        assert_eq!(after[0], (cx.round() as i32, cy.round() as i32));
    }
}
