use geo_types::Point;
use georest_types::{meters_to_degrees, parse_point};

use super::{FilterBackend, FilterConfig};
use crate::error::FilterError;
use crate::params::QueryParams;
use crate::query::{Order, SpatialLookup, SpatialQuery};

/// Distance used when `point` is given without `dist`.
pub const DEFAULT_DISTANCE: f64 = 1000.0;

fn get_filter_point(params: &QueryParams, point_param: &str) -> Result<Option<Point<f64>>, FilterError> {
    let Some(value) = params.get_non_empty(point_param) else {
        return Ok(None);
    };

    parse_point(value).map(Some).map_err(|_| {
        FilterError::Parse(format!(
            "Invalid geometry string supplied for parameter {point_param}"
        ))
    })
}

/// Filters by the `point=x,y` and `dist=<distance>` parameters.
///
/// With `distance_filter_convert_meters` the distance is taken in meters and converted into
/// degrees at the latitude of the point (`y`), otherwise it is used in coordinate units as is.
#[derive(Debug, Clone)]
pub struct DistanceToPointFilter {
    /// Name of the distance parameter.
    pub dist_param: String,
    /// Name of the point parameter.
    pub point_param: String,
}

impl Default for DistanceToPointFilter {
    fn default() -> Self {
        Self {
            dist_param: "dist".into(),
            point_param: "point".into(),
        }
    }
}

impl DistanceToPointFilter {
    /// Reads the point parameter.
    pub fn get_filter_point(&self, params: &QueryParams) -> Result<Option<Point<f64>>, FilterError> {
        get_filter_point(params, &self.point_param)
    }

    /// Reads the distance parameter, [`DEFAULT_DISTANCE`] if absent or empty.
    pub fn get_distance(&self, params: &QueryParams) -> Result<f64, FilterError> {
        let Some(value) = params.get_non_empty(&self.dist_param) else {
            return Ok(DEFAULT_DISTANCE);
        };

        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .ok_or_else(|| {
                FilterError::Parse(format!(
                    "Invalid distance string supplied for parameter {}",
                    self.dist_param
                ))
            })
    }
}

impl<Q: SpatialQuery> FilterBackend<Q> for DistanceToPointFilter {
    fn filter_query(
        &self,
        params: &QueryParams,
        query: Q,
        config: &FilterConfig,
    ) -> Result<Q, FilterError> {
        let Some(field) = &config.distance_filter_field else {
            return Ok(query);
        };

        let Some(point) = self.get_filter_point(params)? else {
            return Ok(query);
        };

        let mut distance = self.get_distance(params)?;
        if config.distance_filter_convert_meters {
            distance = meters_to_degrees(distance, point.y());
        }
        log::debug!("Filtering {field} within {distance} of {point:?}");

        Ok(query.filter(field, SpatialLookup::DWithin(point, distance)))
    }
}

/// Orders results by distance to the `point=x,y` parameter. `order=desc` puts the farthest
/// records first.
#[derive(Debug, Clone)]
pub struct DistanceToPointOrderingFilter {
    /// Name of the point parameter.
    pub point_param: String,
    /// Name of the order parameter.
    pub order_param: String,
}

impl Default for DistanceToPointOrderingFilter {
    fn default() -> Self {
        Self {
            point_param: "point".into(),
            order_param: "order".into(),
        }
    }
}

impl<Q: SpatialQuery> FilterBackend<Q> for DistanceToPointOrderingFilter {
    fn filter_query(
        &self,
        params: &QueryParams,
        query: Q,
        config: &FilterConfig,
    ) -> Result<Q, FilterError> {
        let Some(field) = &config.distance_ordering_filter_field else {
            return Ok(query);
        };

        let Some(point) = get_filter_point(params, &self.point_param)? else {
            return Ok(query);
        };

        let order = Order::from_param(params.get(&self.order_param));
        Ok(query.order_by_distance(field, point, order))
    }

    fn requires_distance_ordering(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::test_utils::{alcatraz, bay_area, names};
    use crate::store::{MemoryQuery, RecordStore};
    use approx::assert_abs_diff_eq;

    fn within(query: &str, convert_meters: bool) -> Result<Vec<String>, FilterError> {
        let config = FilterConfig::new().with_distance_filter("geometry", convert_meters);
        DistanceToPointFilter::default()
            .filter_query(&QueryParams::parse(query).unwrap(), bay_area().query(), &config)
            .map(names)
    }

    fn alcatraz_param() -> String {
        let point = alcatraz();
        format!("point={},{}", point.x(), point.y())
    }

    #[test]
    fn within_meters() {
        let result = within(&format!("dist=5000&{}", alcatraz_param()), true).unwrap();
        assert_eq!(result, vec!["Treasure Island"]);

        let result = within(&format!("dist=7000&{}", alcatraz_param()), true).unwrap();
        assert_eq!(result, vec!["Treasure Island", "Golden Gate Park"]);
    }

    #[test]
    fn within_degrees() {
        let result = within(&format!("dist=0.05&{}", alcatraz_param()), false).unwrap();
        assert_eq!(result, vec!["Treasure Island"]);
    }

    #[test]
    fn default_distance() {
        let filter = DistanceToPointFilter::default();
        assert_abs_diff_eq!(filter.get_distance(&QueryParams::new()).unwrap(), 1000.0);
        assert_abs_diff_eq!(
            filter.get_distance(&QueryParams::parse("dist=").unwrap()).unwrap(),
            1000.0
        );

        // 1000 degrees covers everything
        let result = within(&alcatraz_param(), false).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn empty_point_is_noop() {
        assert_eq!(within("point=&dist=1", false).unwrap().len(), 2);
        assert_eq!(within("dist=0.0001", false).unwrap().len(), 2);
    }

    #[test]
    fn malformed_parameters() {
        let err = within("point=1,a&dist=1", true).unwrap_err();
        assert_eq!(err.to_string(), "Invalid geometry string supplied for parameter point");

        let err = within("point=1,2,3", true).unwrap_err();
        assert_eq!(err.to_string(), "Invalid geometry string supplied for parameter point");

        let err = within("point=1,2&dist=far", true).unwrap_err();
        assert_eq!(err.to_string(), "Invalid distance string supplied for parameter dist");
    }

    #[test]
    fn ordering() {
        let config = FilterConfig::new().with_distance_ordering("geometry");
        let filter = DistanceToPointOrderingFilter::default();
        let near_park = "point=-122.49,37.76";

        let result = filter
            .filter_query(&QueryParams::parse(near_park).unwrap(), bay_area().query(), &config)
            .map(names)
            .unwrap();
        assert_eq!(result, vec!["Golden Gate Park", "Treasure Island"]);

        let result = filter
            .filter_query(
                &QueryParams::parse(&format!("{near_park}&order=desc")).unwrap(),
                bay_area().query(),
                &config,
            )
            .map(names)
            .unwrap();
        assert_eq!(result, vec!["Treasure Island", "Golden Gate Park"]);

        let result = filter
            .filter_query(&QueryParams::new(), bay_area().query(), &config)
            .map(names)
            .unwrap();
        assert_eq!(result, vec!["Treasure Island", "Golden Gate Park"]);

        let backend: &dyn FilterBackend<MemoryQuery> = &filter;
        assert!(backend.requires_distance_ordering());
    }
}
