//! Country outlines read from a GeoJSON feature collection.

use geojson::{FeatureCollection, GeoJson, Value};

/// A ring of `[longitude, latitude]` points.
pub type Ring = Vec<[f64; 2]>;

/// One feature of the world map.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryShape {
    /// `properties.name` of the feature; empty when missing.
    pub name: String,
    /// Polygons, each an outer ring followed by its holes.
    pub polygons: Vec<Vec<Ring>>,
}

impl CountryShape {
    /// Even-odd point-in-polygon test in longitude/latitude space.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygons.iter().any(|polygon| {
            polygon
                .iter()
                .filter(|ring| ring_contains(ring, lon, lat))
                .count()
                % 2
                == 1
        })
    }
}

fn ring_contains(ring: &[[f64; 2]], x: f64, y: f64) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// All country shapes of a map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldMap {
    pub shapes: Vec<CountryShape>,
}

impl WorldMap {
    /// Convert a parsed GeoJSON document. Only feature collections carry
    /// named countries; anything else yields `None`.
    pub fn from_geojson(geojson: GeoJson) -> Option<Self> {
        match geojson {
            GeoJson::FeatureCollection(collection) => Some(Self::from_collection(collection)),
            _ => None,
        }
    }

    pub fn from_collection(collection: FeatureCollection) -> Self {
        let shapes = collection
            .features
            .into_iter()
            .map(|feature| {
                let name = feature
                    .property("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let polygons = match feature.geometry.map(|g| g.value) {
                    Some(Value::Polygon(rings)) => vec![convert_polygon(&rings)],
                    Some(Value::MultiPolygon(polygons)) => {
                        polygons.iter().map(|rings| convert_polygon(rings)).collect()
                    }
                    _ => Vec::new(),
                };
                CountryShape { name, polygons }
            })
            .collect();

        Self { shapes }
    }

    /// Country whose outline contains the point.
    pub fn country_at(&self, lon: f64, lat: f64) -> Option<&CountryShape> {
        self.shapes.iter().find(|shape| shape.contains(lon, lat))
    }
}

fn convert_polygon(rings: &[Vec<Vec<f64>>]) -> Vec<Ring> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .filter_map(|position| match position.as_slice() {
                    [lon, lat, ..] => Some([*lon, *lat]),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "Squareland" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                        [[4, 4], [6, 4], [6, 6], [4, 6], [4, 4]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Islands" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[20, 0], [22, 0], [22, 2], [20, 0]]],
                        [[[30, 0], [32, 0], [32, 2], [30, 2], [30, 0]]]
                    ]
                }
            }
        ]
    }"#;

    fn sample() -> WorldMap {
        let geojson: GeoJson = SAMPLE.parse().unwrap();
        WorldMap::from_geojson(geojson).unwrap()
    }

    #[test]
    fn reads_names_and_polygons() {
        let world = sample();
        assert_eq!(world.shapes.len(), 2);
        assert_eq!(world.shapes[0].name, "Squareland");
        assert_eq!(world.shapes[0].polygons.len(), 1);
        assert_eq!(world.shapes[0].polygons[0].len(), 2);
        assert_eq!(world.shapes[1].polygons.len(), 2);
    }

    #[test]
    fn holes_are_outside() {
        let world = sample();
        assert_eq!(world.country_at(1.0, 1.0).map(|s| s.name.as_str()), Some("Squareland"));
        assert!(world.country_at(5.0, 5.0).is_none());
        assert_eq!(world.country_at(31.0, 1.0).map(|s| s.name.as_str()), Some("Islands"));
        assert!(world.country_at(50.0, 50.0).is_none());
    }

    #[test]
    fn non_collection_is_rejected() {
        let geojson: GeoJson = r#"{"type": "Point", "coordinates": [1, 2]}"#.parse().unwrap();
        assert!(WorldMap::from_geojson(geojson).is_none());
    }
}
