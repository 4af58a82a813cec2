//! Subcommand implementations shared by the argument parser and the
//! interactive menu.

use safety_map_grid::render::{CellStyle, cells_to_geojson};
use safety_map_grid::zoom::{
    DEFAULT_BASE_CELL_SIZE, DEFAULT_BASE_ZOOM, bucket_points, zoom_cell_size,
};
use safety_map_grid::{GridOptions, HeatLayerOptions, build_grid, heat_points};
use safety_map_grid_models::{BoundingBox, GridCell};
use safety_map_safety_models::{NewPointReport, PointReport, SafetyKind};
use safety_map_store::{SafetyStore, fetch_or_empty};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Prints every stored report.
pub async fn list(store: &dyn SafetyStore) -> CommandResult {
    let reports = store.list().await?;

    println!("{:<8} {:<10} {:>12} {:>12}  CREATED", "ID", "TYPE", "LAT", "LNG");
    println!("{}", "-".repeat(70));
    for report in &reports {
        println!("{}", format_report(report));
    }
    println!();
    println!("{} reports", reports.len());

    Ok(())
}

/// Validates and stores a new report.
pub async fn mark(
    store: &dyn SafetyStore,
    latitude: f64,
    longitude: f64,
    kind: SafetyKind,
) -> CommandResult {
    let payload = NewPointReport::new(latitude, longitude, kind);
    payload.validate()?;

    let report = store.insert(payload).await?;
    println!("Marked {} at ({latitude}, {longitude}) as #{}", report.kind, report.id);

    Ok(())
}

/// Deletes a report by id.
pub async fn remove(store: &dyn SafetyStore, id: i64) -> CommandResult {
    store.delete(id).await?;
    println!("Removed report #{id}");
    Ok(())
}

/// Builds and prints the fixed-lattice grid over `region`.
pub async fn grid(
    store: &dyn SafetyStore,
    region: &BoundingBox,
    cell_size: f64,
    include_empty: bool,
    geojson: bool,
) -> CommandResult {
    let reports = fetch_or_empty(store).await;
    let options = GridOptions {
        include_empty,
        ..GridOptions::default()
    };

    let cells = build_grid(&reports, region, cell_size, &options)?;
    print_cells(&cells, geojson)
}

/// Buckets reports by zoom level and prints the resulting cells.
pub async fn clusters(store: &dyn SafetyStore, zoom: u8, geojson: bool) -> CommandResult {
    let reports = fetch_or_empty(store).await;
    let cell_size = zoom_cell_size(DEFAULT_BASE_CELL_SIZE, DEFAULT_BASE_ZOOM, zoom)?;
    log::debug!("Zoom {zoom} uses cell size {cell_size}");

    let cells = bucket_points(&reports, cell_size)?;
    print_cells(&cells, geojson)
}

/// Prints the heat layer as JSON.
pub async fn heat(store: &dyn SafetyStore) -> CommandResult {
    let reports = fetch_or_empty(store).await;
    let options = HeatLayerOptions::default();
    let points: Vec<[f64; 3]> = heat_points(&reports)
        .iter()
        .map(safety_map_grid_models::HeatPoint::as_triple)
        .collect();

    let body = serde_json::json!({
        "points": points,
        "radius": options.radius,
        "blur": options.blur,
        "gradient": options.gradient,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(())
}

/// Looks up a place name and prints its coordinates.
pub async fn search(query: &str) -> CommandResult {
    let client = safety_map_geocoder::client()?;
    let base_url = safety_map_geocoder::base_url_from_env();

    match safety_map_geocoder::search(&client, &base_url, query).await? {
        Some(place) => {
            println!(
                "{}, {}  {}",
                place.latitude,
                place.longitude,
                place.display_name.as_deref().unwrap_or("")
            );
        }
        None => println!("No match for '{query}'"),
    }

    Ok(())
}

fn print_cells(cells: &[GridCell], geojson: bool) -> CommandResult {
    if geojson {
        let collection = cells_to_geojson(cells, &CellStyle::default());
        println!("{}", serde_json::to_string_pretty(&collection)?);
        return Ok(());
    }

    println!(
        "{:>11} {:>11} {:>11} {:>11} {:>5} {:>5}  SEVERITY",
        "SOUTH", "WEST", "NORTH", "EAST", "DANG", "TOTAL"
    );
    for cell in cells {
        println!("{}", format_cell(cell));
    }
    println!();
    println!("{} cells", cells.len());

    Ok(())
}

fn format_report(report: &PointReport) -> String {
    format!(
        "{:<8} {:<10} {:>12.6} {:>12.6}  {}",
        report.id,
        report.kind.to_string(),
        report.latitude,
        report.longitude,
        report.created_at.to_rfc3339()
    )
}

fn format_cell(cell: &GridCell) -> String {
    format!(
        "{:>11.6} {:>11.6} {:>11.6} {:>11.6} {:>5} {:>5}  {}",
        cell.bounds.south,
        cell.bounds.west,
        cell.bounds.north,
        cell.bounds.east,
        cell.dangerous,
        cell.total,
        cell.severity
    )
}
