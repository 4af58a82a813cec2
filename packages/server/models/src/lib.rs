#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the safety map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the store row types and the grid types to allow independent
//! evolution of the API contract.

use chrono::{DateTime, Utc};
use safety_map_grid_models::{GradientStop, GridCell, HeatLayerOptions, HeatPoint, Severity};
use safety_map_safety_models::{NewPointReport, PointReport, SafetyKind};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always `true` when the server answers.
    pub healthy: bool,
    /// Server crate version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// What went wrong.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// A point report as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReport {
    /// Store id.
    pub id: i64,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// `"dangerous"` or `"safe"`.
    #[serde(rename = "type")]
    pub kind: SafetyKind,
    /// Creation time (ISO 8601).
    pub created_at: DateTime<Utc>,
}

impl From<PointReport> for ApiReport {
    fn from(report: PointReport) -> Self {
        Self {
            id: report.id,
            latitude: report.latitude,
            longitude: report.longitude,
            kind: report.kind,
            created_at: report.created_at,
        }
    }
}

/// Body of `POST /api/reports`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreateReportRequest {
    /// Latitude of the marked location.
    pub latitude: f64,
    /// Longitude of the marked location.
    pub longitude: f64,
    /// `"dangerous"` or `"safe"`.
    #[serde(rename = "type")]
    pub kind: SafetyKind,
}

impl From<CreateReportRequest> for NewPointReport {
    fn from(request: CreateReportRequest) -> Self {
        Self::new(request.latitude, request.longitude, request.kind)
    }
}

/// Response encoding for grid endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain JSON array of [`ApiGridCell`].
    #[default]
    Json,
    /// `GeoJSON` `FeatureCollection`.
    Geojson,
}

/// Query parameters for `GET /api/grid`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridQueryParams {
    /// Visible region as `west,south,east,north`.
    pub bbox: String,
    /// Cell edge length in degrees.
    pub cell_size: Option<f64>,
    /// Whether to emit cells without reports.
    pub include_empty: Option<bool>,
    /// Response encoding.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Query parameters for `GET /api/clusters`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterQueryParams {
    /// Map zoom level.
    pub zoom: Option<u8>,
    /// Response encoding.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Query parameters for `GET /api/overlays/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayQueryParams {
    /// Visible region as `west,south,east,north`.
    pub bbox: Option<String>,
    /// Map zoom level.
    pub zoom: Option<u8>,
}

/// Query parameters for `GET /api/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQueryParams {
    /// Free-form place query.
    pub q: String,
}

/// A classified grid cell as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGridCell {
    /// Southern edge.
    pub south: f64,
    /// Western edge.
    pub west: f64,
    /// Northern edge.
    pub north: f64,
    /// Eastern edge.
    pub east: f64,
    /// Dangerous reports in the cell.
    pub dangerous: u32,
    /// All reports in the cell.
    pub total: u32,
    /// Dangerous ratio, absent for empty cells.
    pub ratio: Option<f64>,
    /// Severity name.
    pub severity: Severity,
    /// Fill colour to draw the cell with.
    pub fill_color: String,
}

impl From<GridCell> for ApiGridCell {
    fn from(cell: GridCell) -> Self {
        Self {
            south: cell.bounds.south,
            west: cell.bounds.west,
            north: cell.bounds.north,
            east: cell.bounds.east,
            dangerous: cell.dangerous,
            total: cell.total,
            ratio: cell.ratio(),
            severity: cell.severity,
            fill_color: cell.severity.color().to_string(),
        }
    }
}

/// Heat layer as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHeatLayer {
    /// `[lat, lng, intensity]` triples.
    pub points: Vec<[f64; 3]>,
    /// Kernel radius in pixels.
    pub radius: u32,
    /// Blur in pixels.
    pub blur: u32,
    /// Gradient colour stops.
    pub gradient: Vec<GradientStop>,
}

impl ApiHeatLayer {
    /// Builds the response from weighted points and renderer options.
    #[must_use]
    pub fn new(points: &[HeatPoint], options: HeatLayerOptions) -> Self {
        Self {
            points: points.iter().map(HeatPoint::as_triple).collect(),
            radius: options.radius,
            blur: options.blur,
            gradient: options.gradient,
        }
    }
}

/// An overlay preset in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOverlayPreset {
    /// Preset id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Short description.
    pub description: Option<String>,
    /// Whether the overlay includes a heat layer.
    pub has_heat: bool,
}

/// A computed overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOverlay {
    /// Preset id.
    pub preset: String,
    /// Classified cells.
    pub cells: Vec<ApiGridCell>,
    /// Heat layer, when the preset has one.
    pub heat: Option<ApiHeatLayer>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use safety_map_grid_models::BoundingBox;

    #[test]
    fn report_serializes_type_and_camel_case() {
        let report = ApiReport::from(PointReport {
            id: 3,
            latitude: 1.0,
            longitude: 2.0,
            kind: SafetyKind::Dangerous,
            created_at: DateTime::default(),
        });
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["type"], "dangerous");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn create_request_parses_type() {
        let request: CreateReportRequest =
            serde_json::from_str(r#"{"latitude": 1.5, "longitude": 2.5, "type": "safe"}"#)
                .unwrap();
        let payload = NewPointReport::from(request);
        assert_eq!(payload.kind, SafetyKind::Safe);
    }

    #[test]
    fn grid_cell_carries_fill_color() {
        let cell = GridCell::from_counts(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 1, 2);
        let api = ApiGridCell::from(cell);
        assert_eq!(api.severity, Severity::Orange);
        assert_eq!(api.fill_color, "orange");
        assert_eq!(api.ratio, Some(0.5));
    }

    #[test]
    fn heat_layer_flattens_points() {
        let points = [HeatPoint {
            latitude: 1.0,
            longitude: 2.0,
            intensity: 1.0,
        }];
        let layer = ApiHeatLayer::new(&points, HeatLayerOptions::default());
        assert_eq!(layer.points, vec![[1.0, 2.0, 1.0]]);
        assert_eq!(layer.radius, 15);
    }

    #[test]
    fn format_defaults_to_json() {
        let params: ClusterQueryParams = serde_json::from_str(r#"{"zoom": 13}"#).unwrap();
        assert_eq!(params.format, OutputFormat::Json);
        assert_eq!(params.zoom, Some(13));
    }
}
