//! Zoom-scaled bucketing for overlays drawn without a viewport.
//!
//! Each report lands in exactly one bucket keyed by
//! `(floor(lat / size), floor(lng / size))`, so unlike the fixed grid no
//! report is counted twice. The bucket size doubles for every zoom level
//! below the base zoom.

use std::collections::BTreeMap;

use safety_map_grid_models::{BoundingBox, GridCell, GridError, validate_cell_size};
use safety_map_safety_models::PointReport;

/// Bucket edge length at [`DEFAULT_BASE_ZOOM`] for the citizen map.
pub const DEFAULT_BASE_CELL_SIZE: f64 = 0.0005;
/// Zoom level at which [`DEFAULT_BASE_CELL_SIZE`] applies.
pub const DEFAULT_BASE_ZOOM: u8 = 15;

/// Deepest zoom level accepted by [`zoom_cell_size`].
pub const MAX_ZOOM: u8 = 24;

/// Bucket edge length for `zoom`, scaled from `base_cell_size` at
/// `base_zoom`.
///
/// # Errors
///
/// Returns [`GridError::InvalidZoom`] if `zoom` exceeds [`MAX_ZOOM`].
pub fn zoom_cell_size(base_cell_size: f64, base_zoom: u8, zoom: u8) -> Result<f64, GridError> {
    if zoom > MAX_ZOOM {
        return Err(GridError::InvalidZoom {
            zoom,
            max: MAX_ZOOM,
        });
    }

    Ok(base_cell_size * 2f64.powi(i32::from(base_zoom) - i32::from(zoom)))
}

/// Index of the bucket containing `value`, if it fits an `i64`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn bucket_index(value: f64, cell_size: f64) -> Option<i64> {
    let index = (value / cell_size).floor();
    // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
    (index >= i64::MIN as f64 && index < i64::MAX as f64).then_some(index as i64)
}

/// Buckets `points` into square cells of `cell_size`.
///
/// Cells are returned in bucket key order (south to north, then west to
/// east). Reports with non-finite coordinates are skipped. An empty
/// report set yields no cells.
///
/// # Errors
///
/// * [`GridError::InvalidCellSize`] unless `cell_size` is a finite
///   positive number.
/// * [`GridError::BucketOutOfRange`] if a report's bucket index does not
///   fit an `i64` at this cell size.
#[allow(clippy::cast_precision_loss)]
pub fn bucket_points(points: &[PointReport], cell_size: f64) -> Result<Vec<GridCell>, GridError> {
    validate_cell_size(cell_size)?;

    let mut buckets: BTreeMap<(i64, i64), (u32, u32)> = BTreeMap::new();

    for point in points {
        if !point.latitude.is_finite() || !point.longitude.is_finite() {
            log::debug!("Skipping report {} with non-finite coordinates", point.id);
            continue;
        }

        let key = bucket_index(point.latitude, cell_size)
            .zip(bucket_index(point.longitude, cell_size))
            .ok_or(GridError::BucketOutOfRange {
                latitude: point.latitude,
                longitude: point.longitude,
                cell_size,
            })?;
        let (dangerous, total) = buckets.entry(key).or_insert((0, 0));
        if point.kind.is_dangerous() {
            *dangerous += 1;
        }
        *total += 1;
    }

    Ok(buckets
        .into_iter()
        .map(|((row, col), (dangerous, total))| {
            let south = row as f64 * cell_size;
            let west = col as f64 * cell_size;
            let bounds = BoundingBox::new(west, south, west + cell_size, south + cell_size);
            GridCell::from_counts(bounds, dangerous, total)
        })
        .collect())
}
