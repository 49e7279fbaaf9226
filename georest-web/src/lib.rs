//! HTTP service exposing a `locations` resource and its spatial filter variants.

use std::sync::Arc;

use ahash::AHashMap;
use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::header::{CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use georest::filter::{
    DistanceToPointFilter, DistanceToPointOrderingFilter, FilterBackend, FilterConfig,
    GeometryFilter, InBBoxFilter, TileFilter,
};
use georest::geometry::GeometryKind;
use georest::{
    ConfigError, FeatureOptions, FieldKind, FieldSpec, GeoEndpoint, GeoJsonPagination,
    GeoRestError, GeometryLookup, MemoryQuery, MemoryStore, PageNumberPagination, QueryParams,
    Record, Schema,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Media types accepted as request bodies.
pub const BODY_MEDIA_TYPES: [&str; 3] = [
    "application/json",
    "application/geo-json",
    "application/geo+json",
];

/// Default bind address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Address the server listens on.
    pub addr: String,
    /// Pagination of the `/locations` list.
    pub pagination: PageNumberPagination,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.into(),
            pagination: PageNumberPagination::default(),
        }
    }
}

impl ServiceConfig {
    /// Default configuration overridden by `GEOREST_ADDR` and `GEOREST_PAGE_SIZE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("GEOREST_ADDR") {
            config.addr = addr;
        }
        if let Ok(page_size) = std::env::var("GEOREST_PAGE_SIZE") {
            match page_size.parse() {
                Ok(page_size) => config.pagination.page_size = Some(page_size),
                Err(err) => log::warn!("Ignoring GEOREST_PAGE_SIZE={page_size:?}: {err}"),
            }
        }
        config
    }
}

fn fancy_name(record: &Record) -> JsonValue {
    let name = record
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    json!(format!("Kool {name}"))
}

/// Schema of the `locations` resource.
pub fn location_schema() -> Arc<Schema> {
    Schema::new("id")
        .with_field(FieldSpec::new("name", FieldKind::Text).required())
        .with_field(FieldSpec::new("fancy_name", FieldKind::Computed(fancy_name)))
        .with_field(
            FieldSpec::new("geometry", FieldKind::Geometry(GeometryKind::Geometry)).required(),
        )
        .into_shared()
}

/// Endpoints served by the application. All of them share one store.
pub struct AppState {
    locations: GeoEndpoint<MemoryStore>,
    filters: AHashMap<&'static str, GeoEndpoint<MemoryStore>>,
}

impl AppState {
    /// Creates the endpoints over an empty store.
    pub fn new(config: &ServiceConfig) -> Result<Self, ConfigError> {
        let store = Arc::new(MemoryStore::new(location_schema()));

        let locations = GeoEndpoint::builder(store.clone(), FeatureOptions::new("geometry"))
            .with_pagination(GeoJsonPagination::new(config.pagination.clone()))
            .build()?;

        let bbox = |overlapping| FilterConfig::new().with_bbox_filter("geometry", overlapping);
        let distance = |convert| FilterConfig::new().with_distance_filter("geometry", convert);

        let mut filters = AHashMap::new();
        filters.insert(
            "contained_in_bbox",
            filter_endpoint(&store, bbox(false), InBBoxFilter::default())?,
        );
        filters.insert(
            "overlaps_bbox",
            filter_endpoint(&store, bbox(true), InBBoxFilter::default())?,
        );
        filters.insert(
            "contained_in_tile",
            filter_endpoint(&store, bbox(false), TileFilter::default())?,
        );
        filters.insert(
            "overlaps_tile",
            filter_endpoint(&store, bbox(true), TileFilter::default())?,
        );
        filters.insert(
            "within_distance_of_point",
            filter_endpoint(&store, distance(true), DistanceToPointFilter::default())?,
        );
        filters.insert(
            "within_degrees_of_point",
            filter_endpoint(&store, distance(false), DistanceToPointFilter::default())?,
        );
        filters.insert(
            "order_distance_to_point",
            filter_endpoint(
                &store,
                FilterConfig::new().with_distance_ordering("geometry"),
                DistanceToPointOrderingFilter::default(),
            )?,
        );
        filters.insert(
            "contained_in_geometry",
            filter_endpoint(
                &store,
                FilterConfig::new().with_geometry_filter(
                    "contains_properly",
                    "geometry",
                    GeometryLookup::Contains,
                ),
                GeometryFilter,
            )?,
        );

        Ok(Self { locations, filters })
    }

    /// The `locations` endpoint.
    pub fn locations(&self) -> &GeoEndpoint<MemoryStore> {
        &self.locations
    }

    /// Names of the filter endpoints.
    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().copied()
    }
}

fn filter_endpoint(
    store: &Arc<MemoryStore>,
    config: FilterConfig,
    backend: impl FilterBackend<MemoryQuery> + 'static,
) -> Result<GeoEndpoint<MemoryStore>, ConfigError> {
    GeoEndpoint::builder(store.clone(), FeatureOptions::new("geometry"))
        .with_filter_config(config)
        .with_filter(backend)
        .build()
}

/// Error returned by the handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Error reported by an endpoint.
    #[error(transparent)]
    GeoRest(#[from] GeoRestError),
    /// Request body has a media type other than [`BODY_MEDIA_TYPES`].
    #[error("Unsupported media type \"{0}\" in request.")]
    UnsupportedMediaType(String),
    /// Request body is not valid JSON.
    #[error("JSON parse error - {0}")]
    Body(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::GeoRest(GeoRestError::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                serde_json::to_value(errors).unwrap_or_else(|_| json!({})),
            ),
            ApiError::GeoRest(err) => (err.status_code(), json!({ "detail": err.to_string() })),
            ApiError::UnsupportedMediaType(_) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                json!({ "detail": self.to_string() }),
            ),
            ApiError::Body(_) => (StatusCode::BAD_REQUEST, json!({ "detail": self.to_string() })),
        };

        if status.is_server_error() {
            log::error!("Request failed: {self}");
        } else {
            log::debug!("Request rejected with {status}: {self}");
        }

        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Builds the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/locations", get(list_locations).post(create_location))
        .route(
            "/locations/:id",
            get(retrieve_location)
                .put(update_location)
                .patch(partial_update_location)
                .delete(destroy_location),
        )
        .route("/filters/:name", get(list_filtered))
        .with_state(state)
}

fn request_url(headers: &HeaderMap, uri: &Uri) -> String {
    match headers.get(HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{host}{}", uri.path()),
        None => uri.path().to_string(),
    }
}

fn query_params(query: Option<String>) -> Result<QueryParams, GeoRestError> {
    match query {
        Some(query) => Ok(QueryParams::parse(&query)?),
        None => Ok(QueryParams::new()),
    }
}

/// Parses a JSON or GeoJSON request body.
fn json_body(headers: &HeaderMap, body: &Bytes) -> ApiResult<JsonValue> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !BODY_MEDIA_TYPES.contains(&media_type.as_str()) {
        return Err(ApiError::UnsupportedMediaType(content_type.to_string()));
    }

    Ok(serde_json::from_slice(body)?)
}

async fn list_locations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<JsonValue>> {
    let params = query_params(query)?;
    let body = state.locations.list(&params, &request_url(&headers, &uri))?;
    Ok(Json(body))
}

async fn create_location(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<JsonValue>)> {
    let body = json_body(&headers, &body)?;
    let created = state.locations.create(&body)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn retrieve_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<JsonValue>> {
    Ok(Json(state.locations.retrieve(id)?))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<JsonValue>> {
    let body = json_body(&headers, &body)?;
    Ok(Json(state.locations.update(id, &body, false)?))
}

async fn partial_update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<JsonValue>> {
    let body = json_body(&headers, &body)?;
    Ok(Json(state.locations.update(id, &body, true)?))
}

async fn destroy_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.locations.destroy(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_filtered(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    uri: Uri,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<JsonValue>> {
    let endpoint = state
        .filters
        .get(name.as_str())
        .ok_or_else(GeoRestError::not_found)?;
    let params = query_params(query)?;
    Ok(Json(endpoint.list(&params, &request_url(&headers, &uri))?))
}
