//! HTTP handler functions for the safety map API.

use actix_web::{HttpResponse, web};
use safety_map_geocoder::GeocodeError;
use safety_map_grid::render::{CellStyle, cells_to_geojson};
use safety_map_grid::zoom::{
    DEFAULT_BASE_CELL_SIZE, DEFAULT_BASE_ZOOM, bucket_points, zoom_cell_size,
};
use safety_map_grid::{
    GridOptions, GridStrategy, HeatLayerOptions, Viewport, all_presets, build_grid,
    compute_overlay, find_preset, heat_points,
};
use safety_map_grid_models::{BoundingBox, GridCell};
use safety_map_safety_models::NewPointReport;
use safety_map_server_models::{
    ApiError, ApiGridCell, ApiHealth, ApiHeatLayer, ApiOverlay, ApiOverlayPreset, ApiReport,
    ClusterQueryParams, CreateReportRequest, GridQueryParams, OutputFormat, OverlayQueryParams,
    SearchQueryParams,
};
use safety_map_store::fetch_or_empty;

use crate::AppState;

/// Cell size used by `/api/grid` when none is given (about 500 m).
const DEFAULT_CELL_SIZE: f64 = 0.005;

/// Zoom used when a request omits it.
const DEFAULT_ZOOM: u8 = 13;

/// Placeholder region for overlays that do not depend on the viewport.
const WHOLE_WORLD: BoundingBox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/reports`
///
/// Lists every report. An unreachable store yields an empty list.
pub async fn reports(state: web::Data<AppState>) -> HttpResponse {
    let reports: Vec<ApiReport> = fetch_or_empty(state.store.as_ref())
        .await
        .into_iter()
        .map(ApiReport::from)
        .collect();

    HttpResponse::Ok().json(reports)
}

/// `POST /api/reports`
///
/// Validates the coordinates and inserts a new report.
pub async fn create_report(
    state: web::Data<AppState>,
    body: web::Json<CreateReportRequest>,
) -> HttpResponse {
    let payload = NewPointReport::from(body.into_inner());

    if let Err(e) = payload.validate() {
        return HttpResponse::BadRequest().json(ApiError::new(e.to_string()));
    }

    match state.store.insert(payload).await {
        Ok(report) => HttpResponse::Created().json(ApiReport::from(report)),
        Err(e) => {
            log::error!("Failed to insert report: {e}");
            HttpResponse::BadGateway().json(ApiError::new("Failed to store report"))
        }
    }
}

/// `DELETE /api/reports/{id}`
pub async fn delete_report(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();

    match state.store.delete(id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => {
            log::error!("Failed to delete report {id}: {e}");
            HttpResponse::BadGateway().json(ApiError::new("Failed to delete report"))
        }
    }
}

/// `GET /api/grid`
///
/// Builds the fixed-lattice grid over the requested bounding box.
pub async fn grid(state: web::Data<AppState>, params: web::Query<GridQueryParams>) -> HttpResponse {
    let Some(region) = BoundingBox::parse(&params.bbox) else {
        return invalid_bbox();
    };

    let cell_size = params.cell_size.unwrap_or(DEFAULT_CELL_SIZE);
    let options = GridOptions {
        include_empty: params.include_empty.unwrap_or(true),
        ..GridOptions::default()
    };

    let reports = fetch_or_empty(state.store.as_ref()).await;

    match build_grid(&reports, &region, cell_size, &options) {
        Ok(cells) => cells_response(cells, params.format),
        Err(e) => HttpResponse::BadRequest().json(ApiError::new(e.to_string())),
    }
}

/// `GET /api/clusters`
///
/// Buckets reports into zoom-scaled cells.
pub async fn clusters(
    state: web::Data<AppState>,
    params: web::Query<ClusterQueryParams>,
) -> HttpResponse {
    let zoom = params.zoom.unwrap_or(DEFAULT_ZOOM);
    let cell_size = match zoom_cell_size(DEFAULT_BASE_CELL_SIZE, DEFAULT_BASE_ZOOM, zoom) {
        Ok(size) => size,
        Err(e) => return HttpResponse::BadRequest().json(ApiError::new(e.to_string())),
    };
    let reports = fetch_or_empty(state.store.as_ref()).await;

    match bucket_points(&reports, cell_size) {
        Ok(cells) => cells_response(cells, params.format),
        Err(e) => HttpResponse::BadRequest().json(ApiError::new(e.to_string())),
    }
}

/// `GET /api/heat`
///
/// Returns weighted points for a heat layer.
pub async fn heat(state: web::Data<AppState>) -> HttpResponse {
    let reports = fetch_or_empty(state.store.as_ref()).await;
    let layer = ApiHeatLayer::new(&heat_points(&reports), HeatLayerOptions::default());

    HttpResponse::Ok().json(layer)
}

/// `GET /api/overlays`
pub async fn overlays() -> HttpResponse {
    let presets: Vec<ApiOverlayPreset> = all_presets()
        .into_iter()
        .map(|preset| ApiOverlayPreset {
            has_heat: preset.heat.is_some(),
            id: preset.id,
            name: preset.name,
            description: preset.description,
        })
        .collect();

    HttpResponse::Ok().json(presets)
}

/// `GET /api/overlays/{id}`
///
/// Computes a named overlay for the requested viewport.
pub async fn overlay(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<OverlayQueryParams>,
) -> HttpResponse {
    let id = path.into_inner();
    let Some(preset) = find_preset(&id) else {
        return HttpResponse::NotFound().json(ApiError::new(format!("Unknown overlay: {id}")));
    };

    let region = match (params.bbox.as_deref(), &preset.grid) {
        (Some(s), _) => match BoundingBox::parse(s) {
            Some(region) => region,
            None => return invalid_bbox(),
        },
        (None, GridStrategy::Fixed { .. }) => {
            return HttpResponse::BadRequest().json(ApiError::new(format!(
                "Overlay {id} needs a bbox (west,south,east,north)"
            )));
        }
        (None, GridStrategy::Zoom { .. }) => WHOLE_WORLD,
    };

    let viewport = Viewport {
        region,
        zoom: params.zoom.unwrap_or(DEFAULT_ZOOM),
    };
    let reports = fetch_or_empty(state.store.as_ref()).await;

    match compute_overlay(&preset, &reports, &viewport) {
        Ok(overlay) => HttpResponse::Ok().json(ApiOverlay {
            preset: overlay.preset,
            cells: overlay.cells.into_iter().map(ApiGridCell::from).collect(),
            heat: overlay
                .heat
                .map(|layer| ApiHeatLayer::new(&layer.points, layer.options)),
        }),
        Err(e) => HttpResponse::BadRequest().json(ApiError::new(e.to_string())),
    }
}

/// `GET /api/search`
///
/// Resolves a free-form place name to coordinates.
pub async fn search(
    state: web::Data<AppState>,
    params: web::Query<SearchQueryParams>,
) -> HttpResponse {
    match safety_map_geocoder::search(&state.http, &state.nominatim_url, &params.q).await {
        Ok(Some(place)) => HttpResponse::Ok().json(place),
        Ok(None) => HttpResponse::NotFound().json(ApiError::new("Location not found")),
        Err(GeocodeError::RateLimited) => {
            HttpResponse::TooManyRequests().json(ApiError::new("Search rate limit exceeded"))
        }
        Err(e) => {
            log::error!("Place search failed: {e}");
            HttpResponse::BadGateway().json(ApiError::new("Search failed"))
        }
    }
}

fn invalid_bbox() -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError::new(
        "Invalid bbox, expected west,south,east,north",
    ))
}

fn cells_response(cells: Vec<GridCell>, format: OutputFormat) -> HttpResponse {
    match format {
        OutputFormat::Json => {
            let cells: Vec<ApiGridCell> = cells.into_iter().map(ApiGridCell::from).collect();
            HttpResponse::Ok().json(cells)
        }
        OutputFormat::Geojson => {
            let collection = cells_to_geojson(&cells, &CellStyle::default());
            match serde_json::to_string(&collection) {
                Ok(body) => HttpResponse::Ok()
                    .content_type("application/geo+json")
                    .body(body),
                Err(e) => {
                    log::error!("Failed to serialize GeoJSON: {e}");
                    HttpResponse::InternalServerError()
                        .json(ApiError::new("Failed to serialize GeoJSON"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use safety_map_store::{MemoryStore, SafetyStore};

    use super::*;

    fn state(store: Arc<dyn SafetyStore>) -> web::Data<AppState> {
        web::Data::new(AppState {
            store,
            http: reqwest::Client::new(),
            nominatim_url: "http://127.0.0.1:9/search".to_string(),
        })
    }

    fn mark(latitude: f64, longitude: f64, kind: &str) -> serde_json::Value {
        serde_json::json!({ "latitude": latitude, "longitude": longitude, "type": kind })
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(
            App::new()
                .app_data(state(Arc::new(MemoryStore::new())))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: ApiHealth = test::call_and_read_body_json(&app, req).await;
        assert!(body.healthy);
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn marked_reports_show_up_in_grid() {
        let app = test::init_service(
            App::new()
                .app_data(state(Arc::new(MemoryStore::new())))
                .configure(crate::configure),
        )
        .await;

        for (lat, lng, kind) in [
            (0.001, 0.001, "dangerous"),
            (0.002, 0.002, "dangerous"),
            (0.003, 0.001, "dangerous"),
            (0.004, 0.003, "safe"),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/reports")
                .set_json(mark(lat, lng, kind))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri("/api/grid?bbox=0,0,0.01,0.01&cellSize=0.005")
            .to_request();
        let cells: Vec<ApiGridCell> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].fill_color, "red");
        assert_eq!((cells[0].dangerous, cells[0].total), (3, 4));
        assert!(cells[1..].iter().all(|c| c.fill_color == "green"));

        let req = test::TestRequest::get()
            .uri("/api/grid?bbox=0,0,0.01,0.01&cellSize=0.005&includeEmpty=false")
            .to_request();
        let cells: Vec<ApiGridCell> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cells.len(), 1);
    }

    #[actix_web::test]
    async fn rejects_bad_input() {
        let app = test::init_service(
            App::new()
                .app_data(state(Arc::new(MemoryStore::new())))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(mark(95.0, 0.0, "safe"))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::get()
            .uri("/api/grid?bbox=0,0,0.01")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::get()
            .uri("/api/grid?bbox=0,0,0.01,0.01&cellSize=0")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::get()
            .uri("/api/grid?bbox=1,2,oops,3,4")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn tiny_cell_size_is_refused() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(NewPointReport::new(
                28.6,
                77.2,
                safety_map_safety_models::SafetyKind::Dangerous,
            ))
            .await
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(store))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/grid?bbox=77.1,28.5,77.3,28.7&cellSize=1e-20")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ApiError = test::read_body_json(resp).await;
        assert!(body.error.contains("exceeds the limit"), "{}", body.error);
    }

    #[actix_web::test]
    async fn delete_then_list_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let app = test::init_service(
            App::new()
                .app_data(state(store.clone()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(mark(22.57, 88.36, "dangerous"))
            .to_request();
        let created: ApiReport = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::delete()
            .uri(&format!("/api/reports/{}", created.id))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NO_CONTENT
        );

        let req = test::TestRequest::get().uri("/api/reports").to_request();
        let reports: Vec<ApiReport> = test::call_and_read_body_json(&app, req).await;
        assert!(reports.is_empty());
    }

    #[actix_web::test]
    async fn geojson_grid_and_heat_layer() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(NewPointReport::new(
                0.001,
                0.001,
                safety_map_safety_models::SafetyKind::Safe,
            ))
            .await
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(store))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/grid?bbox=0,0,0.01,0.01&format=geojson")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/geo+json"
        );
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["features"].as_array().unwrap().len(), 4);

        let req = test::TestRequest::get().uri("/api/heat").to_request();
        let heat: ApiHeatLayer = test::call_and_read_body_json(&app, req).await;
        assert_eq!(heat.points.len(), 1);
        assert!((heat.points[0][2] - 0.5).abs() < f64::EPSILON);
        assert_eq!(heat.blur, 10);
    }

    #[actix_web::test]
    async fn overlays_and_clusters() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(NewPointReport::new(
                22.5726,
                88.3639,
                safety_map_safety_models::SafetyKind::Dangerous,
            ))
            .await
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(store))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/overlays").to_request();
        let presets: Vec<ApiOverlayPreset> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(presets.len(), all_presets().len());

        let req = test::TestRequest::get().uri("/api/overlays/unknown").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );

        let req = test::TestRequest::get().uri("/api/overlays/police").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::get()
            .uri("/api/overlays/citizen?zoom=13")
            .to_request();
        let overlay: ApiOverlay = test::call_and_read_body_json(&app, req).await;
        assert_eq!(overlay.cells.len(), 1);
        assert_eq!(overlay.cells[0].fill_color, "red");
        assert!(overlay.heat.is_none());

        let req = test::TestRequest::get().uri("/api/clusters?zoom=13").to_request();
        let cells: Vec<ApiGridCell> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cells.len(), 1);

        for uri in ["/api/clusters?zoom=255", "/api/overlays/citizen?zoom=255"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            assert_eq!(
                test::call_service(&app, req).await.status(),
                StatusCode::BAD_REQUEST,
                "{uri}"
            );
        }
    }

    #[actix_web::test]
    async fn blank_search_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(state(Arc::new(MemoryStore::new())))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/search?q=%20").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }
}
