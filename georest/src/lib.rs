//! GeoJSON feature serialization and spatial query filters for REST style endpoints.
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//!
//! use georest::filter::{FilterConfig, InBBoxFilter};
//! use georest::geometry::GeometryKind;
//! use georest::{FeatureOptions, FieldKind, FieldSpec, GeoEndpoint, MemoryStore, QueryParams, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::new("id")
//!     .with_field(FieldSpec::new("name", FieldKind::Text).required())
//!     .with_field(FieldSpec::new("geometry", FieldKind::Geometry(GeometryKind::Point)))
//!     .into_shared();
//!
//! let endpoint = GeoEndpoint::builder(Arc::new(MemoryStore::new(schema)), FeatureOptions::new("geometry"))
//!     .with_filter_config(FilterConfig::new().with_bbox_filter("geometry", false))
//!     .with_filter(InBBoxFilter::default())
//!     .build()
//!     .unwrap();
//!
//! endpoint
//!     .create(&json!({
//!         "type": "Feature",
//!         "properties": {"name": "Rome"},
//!         "geometry": "POINT (12.49 41.89)",
//!     }))
//!     .unwrap();
//!
//! let collection = endpoint
//!     .list(&QueryParams::parse("in_bbox=10,40,15,45").unwrap(), "/locations")
//!     .unwrap();
//! assert_eq!(collection["features"][0]["properties"]["name"], "Rome");
//! ```
//!
//! # Main components
//!
//! * [`Schema`] describes the fields of a record type and how each of them is validated.
//! * [`geometry::GeometryField`] encodes native geometries as GeoJSON and decodes GeoJSON, WKT,
//!   EWKT and HEXEWKB input.
//! * [`FeatureSerializer`] turns [`Record`]s into GeoJSON `Feature`s and back.
//! * [`filter`] backends narrow a [`SpatialQuery`] by query parameters: bounding boxes, slippy
//!   map tiles, distance to a point and arbitrary geometry relations.
//! * [`pagination`] splits result sets into pages wrapped in a `FeatureCollection`.
//! * [`GeoEndpoint`] composes all of the above over a [`RecordStore`].

pub mod endpoint;
pub mod error;
pub mod feature;
pub mod filter;
pub mod geometry;
pub mod pagination;
mod params;
pub mod query;
pub mod schema;
pub mod store;

pub use endpoint::{GeoEndpoint, GeoEndpointBuilder};
pub use error::{ConfigError, FilterError, GeoRestError, ValidationErrors};
pub use feature::{FeatureOptions, FeatureSerializer, IdField};
pub use pagination::{GeoJsonPagination, PageNumberPagination};
pub use params::QueryParams;
pub use query::{GeometryLookup, Order, SpatialLookup, SpatialQuery};
pub use schema::{FieldKind, FieldSpec, FieldValue, Record, Schema};
pub use store::{MemoryQuery, MemoryStore, RecordStore};

// Reexport georest_types
pub use georest_types;
