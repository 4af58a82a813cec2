//! `GeoJSON` output for map libraries.
//!
//! Each grid cell becomes a rectangular polygon feature carrying its
//! fill style and counts as properties.

use geo::{Polygon, Rect, coord};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use safety_map_grid_models::{BoundingBox, GridCell};

/// Stroke and fill settings applied to every cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStyle {
    /// Stroke width in pixels.
    pub weight: u32,
    /// Fill opacity (0.0-1.0).
    pub fill_opacity: f64,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            weight: 1,
            fill_opacity: 0.3,
        }
    }
}

/// Polygon outline of a bounding box, in `(lng, lat)` order.
#[must_use]
pub fn bounds_polygon(bounds: &BoundingBox) -> Polygon<f64> {
    Rect::new(
        coord! { x: bounds.west, y: bounds.south },
        coord! { x: bounds.east, y: bounds.north },
    )
    .to_polygon()
}

/// Converts cells to a `GeoJSON` feature collection.
#[must_use]
pub fn cells_to_geojson(cells: &[GridCell], style: &CellStyle) -> FeatureCollection {
    let features = cells
        .iter()
        .map(|cell| {
            let mut properties = JsonObject::new();
            properties.insert("severity".to_string(), cell.severity.as_ref().into());
            properties.insert("fillColor".to_string(), cell.severity.color().into());
            properties.insert("fillOpacity".to_string(), style.fill_opacity.into());
            properties.insert("weight".to_string(), style.weight.into());
            properties.insert("dangerous".to_string(), cell.dangerous.into());
            properties.insert("total".to_string(), cell.total.into());

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::from(&bounds_polygon(&cell.bounds)))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
