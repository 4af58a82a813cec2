//! Fixed-lattice density grid over a visible region.
//!
//! The region is cut into square cells of a configured edge length,
//! starting at its south-west corner. Each cell counts the reports that
//! fall inside its closed bounds and is classified by its dangerous
//! ratio. Reports sitting exactly on a shared edge are counted by every
//! cell touching that edge.

use rstar::{AABB, RTree, RTreeObject};
use safety_map_grid_models::{BoundingBox, GridCell, GridError, validate_cell_size};
use safety_map_safety_models::PointReport;

/// Default upper bound on the number of lattice cells in one grid.
pub const DEFAULT_MAX_CELLS: u64 = 250_000;

/// Tuning for [`build_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOptions {
    /// Emit cells with no reports (as green) instead of skipping them.
    pub include_empty: bool,
    /// Maximum lattice size before the build is refused.
    pub max_cells: u64,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            include_empty: true,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

/// A report positioned in the R-tree as `[lng, lat]`.
struct IndexedReport {
    position: [f64; 2],
    dangerous: bool,
}

impl RTreeObject for IndexedReport {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// R-tree over one snapshot of reports.
struct ReportIndex {
    tree: RTree<IndexedReport>,
}

impl ReportIndex {
    fn new(points: &[PointReport]) -> Self {
        let entries = points
            .iter()
            .map(|p| IndexedReport {
                position: [p.longitude, p.latitude],
                dangerous: p.kind.is_dangerous(),
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Returns `(dangerous, total)` for reports inside `bounds`, edges
    /// included.
    fn tally(&self, bounds: &BoundingBox) -> (u32, u32) {
        let envelope = AABB::from_corners([bounds.west, bounds.south], [bounds.east, bounds.north]);

        self.tree
            .locate_in_envelope(&envelope)
            .fold((0u32, 0u32), |(dangerous, total), entry| {
                (
                    dangerous.saturating_add(u32::from(entry.dangerous)),
                    total.saturating_add(1),
                )
            })
    }
}

/// Number of lattice steps of `cell_size` from `start` needed to reach
/// `end`, i.e. the count of offsets `start + i * cell_size` below `end`.
///
/// Returns `None` once the count would exceed `cap`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn lattice_steps(start: f64, end: f64, cell_size: f64, cap: u64) -> Option<u64> {
    let estimate = ((end - start) / cell_size).ceil().max(0.0);
    if !estimate.is_finite() || estimate > cap as f64 {
        return None;
    }

    let mut steps = estimate as u64;

    // The division can land one step off either way; settle on the exact
    // loop bound.
    while steps > 0 && start + (steps - 1) as f64 * cell_size >= end {
        steps -= 1;
    }
    while start + steps as f64 * cell_size < end {
        steps = steps.checked_add(1).filter(|&s| s <= cap)?;
    }

    Some(steps)
}

/// Lattice size reported when a build is refused.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn estimated_cells(region: &BoundingBox, cell_size: f64) -> u64 {
    let rows = ((region.north - region.south) / cell_size).ceil();
    let cols = ((region.east - region.west) / cell_size).ceil();
    // Float-to-int casts saturate.
    (rows * cols) as u64
}

/// Builds the density grid for `region`.
///
/// Cells are emitted row-major: west to east within a row, rows from
/// south to north. Edge cells keep the full `cell_size` and may overhang
/// the region's north and east edges. Every edge is computed from its
/// lattice index, so neighbouring cells share the exact same edge value.
///
/// An empty report set yields no cells. Coordinates of the reports are
/// not validated here.
///
/// # Errors
///
/// * [`GridError::InvalidCellSize`] if `cell_size` is not a finite
///   positive number.
/// * [`GridError::InvalidRegion`] if the region is inverted or not finite.
/// * [`GridError::TooManyCells`] if the lattice exceeds
///   [`GridOptions::max_cells`].
#[allow(clippy::cast_precision_loss)]
pub fn build_grid(
    points: &[PointReport],
    region: &BoundingBox,
    cell_size: f64,
    options: &GridOptions,
) -> Result<Vec<GridCell>, GridError> {
    validate_cell_size(cell_size)?;
    region.validate()?;

    if points.is_empty() {
        return Ok(Vec::new());
    }

    let too_many = || GridError::TooManyCells {
        requested: estimated_cells(region, cell_size),
        limit: options.max_cells,
    };

    let rows = lattice_steps(region.south, region.north, cell_size, options.max_cells)
        .ok_or_else(too_many)?;
    if rows == 0 {
        return Ok(Vec::new());
    }
    let cols = lattice_steps(region.west, region.east, cell_size, options.max_cells)
        .ok_or_else(too_many)?;
    let requested = rows.saturating_mul(cols);

    if requested > options.max_cells {
        return Err(GridError::TooManyCells {
            requested,
            limit: options.max_cells,
        });
    }

    let index = ReportIndex::new(points);
    let capacity = if options.include_empty {
        usize::try_from(requested).unwrap_or(0)
    } else {
        0
    };
    let mut cells = Vec::with_capacity(capacity);
    let edge = |origin: f64, step: u64| origin + step as f64 * cell_size;

    for row in 0..rows {
        let south = edge(region.south, row);
        let north = edge(region.south, row + 1);
        for col in 0..cols {
            let bounds = BoundingBox::new(
                edge(region.west, col),
                south,
                edge(region.west, col + 1),
                north,
            );
            let (dangerous, total) = index.tally(&bounds);

            if total == 0 && !options.include_empty {
                continue;
            }

            cells.push(GridCell::from_counts(bounds, dangerous, total));
        }
    }

    log::debug!(
        "Built {} grid cells ({rows}x{cols} lattice, cell size {cell_size}) from {} reports",
        cells.len(),
        points.len()
    );

    Ok(cells)
}
