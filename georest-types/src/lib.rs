//! Value types and pure math shared by the `georest` crates.
//!
//! Nothing in this crate touches a data store or an HTTP request. It contains:
//!
//! * [`Rect`], the `(west, south, east, north)` bounding box used by filters and GeoJSON `bbox`
//!   members;
//! * [`tile`] math converting slippy map tile addresses into bounding boxes;
//! * [`coords`] post-processing of GeoJSON coordinate trees (precision rounding and redundant
//!   point removal);
//! * [`distance`] helpers converting meters into approximate decimal degrees.

pub mod coords;
pub mod distance;
pub mod error;
pub mod rect;
pub mod tile;

pub use coords::CoordinateProcessing;
pub use distance::meters_to_degrees;
pub use error::GeoRestTypesError;
pub use rect::{parse_point, Rect};
pub use tile::{tile_edges, TileIndex};
