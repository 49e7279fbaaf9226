//! Spatial filter backends.
//!
//! A backend reads its query parameters, turns them into a [`SpatialLookup`](crate::SpatialLookup)
//! or an ordering and applies it to a [`SpatialQuery`]. Backends do nothing when their parameter
//! is absent or empty, or when the field they work on is not configured in [`FilterConfig`].

mod bbox;
mod distance;
mod geometry;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::params::QueryParams;
use crate::query::{GeometryLookup, SpatialQuery};

pub use bbox::{InBBoxFilter, TileFilter};
pub use distance::{DistanceToPointFilter, DistanceToPointOrderingFilter};
pub use geometry::GeometryFilter;

/// Filter backend applied to a query of type `Q`.
pub trait FilterBackend<Q: SpatialQuery>: Debug + Send + Sync {
    /// Narrows or reorders the query according to the request parameters.
    fn filter_query(
        &self,
        params: &QueryParams,
        query: Q,
        config: &FilterConfig,
    ) -> Result<Q, FilterError>;

    /// Returns true if the backend needs a store that can order by distance.
    fn requires_distance_ordering(&self) -> bool {
        false
    }
}

/// Geometry lookup driven by a query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryFilterSpec {
    /// Query parameter carrying the geometry.
    pub param: String,
    /// Geometry field the lookup is applied to.
    pub field: String,
    /// Relation the stored geometry must be in.
    pub lookup: GeometryLookup,
}

/// Per-endpoint filter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Field filtered by [`InBBoxFilter`] and [`TileFilter`].
    pub bbox_filter_field: Option<String>,
    /// Match geometries whose bounding box overlaps the requested box, instead of only the
    /// contained ones.
    pub bbox_filter_include_overlapping: bool,
    /// Field filtered by [`DistanceToPointFilter`].
    pub distance_filter_field: Option<String>,
    /// Treat the `dist` parameter as meters and convert it into degrees.
    pub distance_filter_convert_meters: bool,
    /// Field ordered by [`DistanceToPointOrderingFilter`].
    pub distance_ordering_filter_field: Option<String>,
    /// Lookups applied by [`GeometryFilter`].
    pub geometry_filters: Vec<GeometryFilterSpec>,
}

impl FilterConfig {
    /// Empty configuration: every backend is a no-op.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bbox filter field.
    pub fn with_bbox_filter(mut self, field: impl Into<String>, include_overlapping: bool) -> Self {
        self.bbox_filter_field = Some(field.into());
        self.bbox_filter_include_overlapping = include_overlapping;
        self
    }

    /// Sets the distance filter field.
    pub fn with_distance_filter(mut self, field: impl Into<String>, convert_meters: bool) -> Self {
        self.distance_filter_field = Some(field.into());
        self.distance_filter_convert_meters = convert_meters;
        self
    }

    /// Sets the distance ordering field.
    pub fn with_distance_ordering(mut self, field: impl Into<String>) -> Self {
        self.distance_ordering_filter_field = Some(field.into());
        self
    }

    /// Adds a geometry lookup.
    pub fn with_geometry_filter(
        mut self,
        param: impl Into<String>,
        field: impl Into<String>,
        lookup: GeometryLookup,
    ) -> Self {
        self.geometry_filters.push(GeometryFilterSpec {
            param: param.into(),
            field: field.into(),
            lookup,
        });
        self
    }

    /// All geometry fields referenced by the configuration.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.bbox_filter_field
            .iter()
            .chain(&self.distance_filter_field)
            .chain(&self.distance_ordering_filter_field)
            .map(String::as_str)
            .chain(self.geometry_filters.iter().map(|f| f.field.as_str()))
    }
}
