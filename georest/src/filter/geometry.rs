use serde_json::Value as JsonValue;

use super::{FilterBackend, FilterConfig, GeometryFilterSpec};
use crate::error::FilterError;
use crate::geometry::parse_geometry;
use crate::params::QueryParams;
use crate::query::{SpatialLookup, SpatialQuery};

/// Applies the geometry lookups listed in [`FilterConfig::geometry_filters`].
///
/// Each lookup reads its own query parameter. The value may be in any format accepted by
/// [`parse_geometry`]: GeoJSON text, WKT, EWKT or HEXEWKB.
#[derive(Debug, Clone, Default)]
pub struct GeometryFilter;

impl GeometryFilter {
    fn apply<Q: SpatialQuery>(
        spec: &GeometryFilterSpec,
        params: &QueryParams,
        query: Q,
    ) -> Result<Q, FilterError> {
        let Some(value) = params.get_non_empty(&spec.param) else {
            return Ok(query);
        };

        let geometry = parse_geometry(&JsonValue::String(value.to_string()))
            .map_err(|err| FilterError::Parse(err.to_string()))?;
        let Some(geometry) = geometry else {
            return Ok(query);
        };

        log::debug!("Filtering {} by {:?} lookup", spec.field, spec.lookup);
        Ok(query.filter(&spec.field, SpatialLookup::Relate(spec.lookup, geometry)))
    }
}

impl<Q: SpatialQuery> FilterBackend<Q> for GeometryFilter {
    fn filter_query(
        &self,
        params: &QueryParams,
        query: Q,
        config: &FilterConfig,
    ) -> Result<Q, FilterError> {
        config
            .geometry_filters
            .iter()
            .try_fold(query, |query, spec| Self::apply(spec, params, query))
    }
}
