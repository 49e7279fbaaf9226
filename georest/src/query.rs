//! Spatial query abstraction used by filter backends.

use std::str::FromStr;

use geo_types::{Geometry, Point};
use georest_types::Rect;
use serde::{Deserialize, Serialize};

use crate::schema::Record;

/// Topological relation tested by [`SpatialLookup::Relate`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryLookup {
    /// Stored geometry contains the query geometry.
    Contains,
    /// Stored geometry is within the query geometry.
    Within,
    /// Geometries share at least one point.
    Intersects,
    /// Geometries share no points.
    Disjoint,
}

impl FromStr for GeometryLookup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(Self::Contains),
            "within" => Ok(Self::Within),
            "intersects" => Ok(Self::Intersects),
            "disjoint" => Ok(Self::Disjoint),
            other => Err(format!("unknown geometry lookup {other:?}")),
        }
    }
}

/// Spatial predicate applied to a geometry field.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialLookup {
    /// Bounding box of the stored geometry lies inside the rectangle.
    Contained(Rect),
    /// Bounding box of the stored geometry overlaps the rectangle.
    BbOverlaps(Rect),
    /// Stored geometry is within the given distance of the point. The distance is in the units of
    /// the coordinates.
    DWithin(Point<f64>, f64),
    /// Stored geometry is in the given relation with the query geometry.
    Relate(GeometryLookup, Geometry<f64>),
}

/// Sort direction.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// Nearest first.
    #[default]
    Asc,
    /// Farthest first.
    Desc,
}

impl Order {
    /// Parses the `order` query parameter. Anything except `desc` is ascending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("desc") => Order::Desc,
            _ => Order::Asc,
        }
    }
}

/// Lazily evaluated set of records that can be narrowed by spatial lookups.
pub trait SpatialQuery: Sized {
    /// Keeps only records whose `field` satisfies the lookup. Records without a geometry in the
    /// field are dropped.
    fn filter(self, field: &str, lookup: SpatialLookup) -> Self;

    /// Orders records by distance between `field` and the point.
    fn order_by_distance(self, field: &str, point: Point<f64>, order: Order) -> Self;

    /// Returns true if [`order_by_distance`](Self::order_by_distance) is supported.
    fn supports_distance_ordering(&self) -> bool;

    /// Evaluates the query.
    fn fetch(self) -> Vec<Record>;
}
