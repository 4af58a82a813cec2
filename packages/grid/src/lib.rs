#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Safety overlay computation.
//!
//! Turns a snapshot of point reports into the shapes a map draws: a grid
//! of severity-coloured cells and, for some overlays, a weighted point
//! list for a heat layer. Everything here is a pure function of the
//! reports, the viewport and the overlay preset. Callers re-run it in
//! full whenever any of those change.

pub mod builder;
pub mod heat;
pub mod registry;
pub mod render;
pub mod zoom;

use safety_map_grid_models::{BoundingBox, GridCell, GridError, HeatPoint};
use safety_map_safety_models::PointReport;
use serde::{Deserialize, Serialize};

pub use builder::{GridOptions, build_grid};
pub use heat::{HeatLayerOptions, heat_points};
pub use registry::{GridStrategy, OverlayPreset, all_presets, find_preset};

/// What the map is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Visible region.
    pub region: BoundingBox,
    /// Map zoom level.
    pub zoom: u8,
}

/// Weighted points plus the renderer options to draw them with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatLayer {
    /// One point per report.
    pub points: Vec<HeatPoint>,
    /// Radius, blur and gradient for the renderer.
    pub options: HeatLayerOptions,
}

/// A computed overlay, ready to hand to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// Id of the preset this overlay was computed from.
    pub preset: String,
    /// Classified cells.
    pub cells: Vec<GridCell>,
    /// Heat layer, when the preset has one.
    pub heat: Option<HeatLayer>,
}

/// Computes `preset` over `points` for the given viewport.
///
/// # Errors
///
/// Returns [`GridError`] if the preset's cell size, the viewport's region
/// or its zoom is unusable, or the fixed lattice is too large.
pub fn compute_overlay(
    preset: &OverlayPreset,
    points: &[PointReport],
    viewport: &Viewport,
) -> Result<Overlay, GridError> {
    let cells = match preset.grid {
        GridStrategy::Fixed {
            cell_size,
            include_empty,
        } => {
            let options = GridOptions {
                include_empty,
                ..GridOptions::default()
            };
            build_grid(points, &viewport.region, cell_size, &options)?
        }
        GridStrategy::Zoom {
            base_cell_size,
            base_zoom,
        } => {
            let cell_size = zoom::zoom_cell_size(base_cell_size, base_zoom, viewport.zoom)?;
            zoom::bucket_points(points, cell_size)?
        }
    };

    let heat = preset.heat.as_ref().map(|options| HeatLayer {
        points: heat_points(points),
        options: options.clone(),
    });

    log::debug!(
        "Computed overlay '{}': {} cells, heat layer: {}",
        preset.id,
        cells.len(),
        heat.is_some()
    );

    Ok(Overlay {
        preset: preset.id.clone(),
        cells,
        heat,
    })
}
