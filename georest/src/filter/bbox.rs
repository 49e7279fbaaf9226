use georest_types::{Rect, TileIndex};

use super::{FilterBackend, FilterConfig};
use crate::error::FilterError;
use crate::params::QueryParams;
use crate::query::{SpatialLookup, SpatialQuery};

/// Filters by the `in_bbox=minx,miny,maxx,maxy` parameter.
#[derive(Debug, Clone)]
pub struct InBBoxFilter {
    /// Name of the query parameter.
    pub bbox_param: String,
}

impl Default for InBBoxFilter {
    fn default() -> Self {
        Self {
            bbox_param: "in_bbox".into(),
        }
    }
}

impl InBBoxFilter {
    /// Reads the bounding box from the parameters. `None` if the parameter is absent or empty.
    pub fn get_filter_bbox(&self, params: &QueryParams) -> Result<Option<Rect>, FilterError> {
        let Some(value) = params.get_non_empty(&self.bbox_param) else {
            return Ok(None);
        };

        value.parse::<Rect>().map(Some).map_err(|_| {
            FilterError::Parse(format!(
                "Invalid bbox string supplied for parameter {}",
                self.bbox_param
            ))
        })
    }
}

impl<Q: SpatialQuery> FilterBackend<Q> for InBBoxFilter {
    fn filter_query(
        &self,
        params: &QueryParams,
        query: Q,
        config: &FilterConfig,
    ) -> Result<Q, FilterError> {
        if config.bbox_filter_field.is_none() {
            return Ok(query);
        }

        Ok(match self.get_filter_bbox(params)? {
            Some(rect) => filter_by_rect(query, rect, config),
            None => query,
        })
    }
}

/// Filters by the `tile=Z/X/Y` parameter. The tile is converted into its bounding box and then
/// applied the same way as [`InBBoxFilter`] does.
#[derive(Debug, Clone)]
pub struct TileFilter {
    /// Name of the query parameter.
    pub tile_param: String,
}

impl Default for TileFilter {
    fn default() -> Self {
        Self {
            tile_param: "tile".into(),
        }
    }
}

impl TileFilter {
    /// Reads the tile from the parameters and returns its bounding box. `None` if the parameter
    /// is absent or empty.
    pub fn get_filter_bbox(&self, params: &QueryParams) -> Result<Option<Rect>, FilterError> {
        let Some(value) = params.get_non_empty(&self.tile_param) else {
            return Ok(None);
        };

        let tile = value.parse::<TileIndex>().map_err(|_| {
            FilterError::Parse(format!(
                "Invalid tile string supplied for parameter {}",
                self.tile_param
            ))
        })?;
        Ok(Some(tile.bbox()))
    }
}

impl<Q: SpatialQuery> FilterBackend<Q> for TileFilter {
    fn filter_query(
        &self,
        params: &QueryParams,
        query: Q,
        config: &FilterConfig,
    ) -> Result<Q, FilterError> {
        if config.bbox_filter_field.is_none() {
            return Ok(query);
        }

        Ok(match self.get_filter_bbox(params)? {
            Some(rect) => filter_by_rect(query, rect, config),
            None => query,
        })
    }
}

fn filter_by_rect<Q: SpatialQuery>(query: Q, rect: Rect, config: &FilterConfig) -> Q {
    let Some(field) = &config.bbox_filter_field else {
        return query;
    };

    let lookup = if config.bbox_filter_include_overlapping {
        SpatialLookup::BbOverlaps(rect)
    } else {
        SpatialLookup::Contained(rect)
    };
    log::debug!("Filtering {field} by {lookup:?}");

    query.filter(field, lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::test_utils::{names, schema};
    use crate::schema::Record;
    use crate::store::{MemoryQuery, MemoryStore, RecordStore};
    use assert_matches::assert_matches;
    use geo_types::polygon;

    fn boxes() -> MemoryStore {
        let store = MemoryStore::new(schema());
        store.insert(Record::new().with("name", "isContained").with(
            "geometry",
            polygon![(x: 1.0, y: 1.0), (x: 1.0, y: 9.0), (x: 9.0, y: 9.0), (x: 9.0, y: 1.0), (x: 1.0, y: 1.0)],
        ));
        store.insert(Record::new().with("name", "isEqualToBounds").with(
            "geometry",
            polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 10.0), (x: 10.0, y: 10.0), (x: 10.0, y: 0.0), (x: 0.0, y: 0.0)],
        ));
        store.insert(Record::new().with("name", "overlaps").with(
            "geometry",
            polygon![(x: 5.0, y: 5.0), (x: 5.0, y: 15.0), (x: 15.0, y: 15.0), (x: 15.0, y: 5.0), (x: 5.0, y: 5.0)],
        ));
        store.insert(Record::new().with("name", "doesNotTouch").with(
            "geometry",
            polygon![(x: 100.0, y: 100.0), (x: 100.0, y: 101.0), (x: 101.0, y: 101.0), (x: 101.0, y: 100.0), (x: 100.0, y: 100.0)],
        ));
        store
    }

    fn run(
        backend: &dyn FilterBackend<MemoryQuery>,
        query: &str,
        config: &FilterConfig,
    ) -> Result<Vec<String>, FilterError> {
        let params = QueryParams::parse(query).unwrap();
        backend
            .filter_query(&params, boxes().query(), config)
            .map(names)
    }

    #[test]
    fn contained_in_bbox() {
        let config = FilterConfig::new().with_bbox_filter("geometry", false);
        let result = run(&InBBoxFilter::default(), "in_bbox=0,0,10,10", &config).unwrap();
        assert_eq!(result, vec!["isContained", "isEqualToBounds"]);
    }

    #[test]
    fn overlaps_bbox() {
        let config = FilterConfig::new().with_bbox_filter("geometry", true);
        let result = run(&InBBoxFilter::default(), "in_bbox=0,0,10,10", &config).unwrap();
        assert_eq!(result, vec!["isContained", "isEqualToBounds", "overlaps"]);
    }

    #[test]
    fn empty_or_missing_parameter_is_noop() {
        let config = FilterConfig::new().with_bbox_filter("geometry", false);
        assert_eq!(run(&InBBoxFilter::default(), "in_bbox=", &config).unwrap().len(), 4);
        assert_eq!(run(&InBBoxFilter::default(), "", &config).unwrap().len(), 4);
        assert_eq!(run(&TileFilter::default(), "tile=", &config).unwrap().len(), 4);
    }

    #[test]
    fn unconfigured_field_is_noop() {
        let config = FilterConfig::new();
        let result = run(&InBBoxFilter::default(), "in_bbox=nonsense", &config).unwrap();
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn malformed_bbox() {
        let config = FilterConfig::new().with_bbox_filter("geometry", false);
        for query in ["in_bbox=0,0,0", "in_bbox=a,b,c,d", "in_bbox=1,2,3,4,5"] {
            let err = run(&InBBoxFilter::default(), query, &config).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid bbox string supplied for parameter in_bbox"
            );
        }
    }

    #[test]
    fn tile_filter() {
        let store = MemoryStore::new(schema());
        store.insert(Record::new().with("name", "inNorthEastTile").with(
            "geometry",
            polygon![(x: 1.0, y: 1.0), (x: 1.0, y: 85.0), (x: 179.0, y: 85.0), (x: 179.0, y: 1.0), (x: 1.0, y: 1.0)],
        ));
        store.insert(Record::new().with("name", "crossesEquator").with(
            "geometry",
            polygon![(x: 1.0, y: -1.0), (x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: -1.0), (x: 1.0, y: -1.0)],
        ));
        store.insert(Record::new().with("name", "western").with(
            "geometry",
            polygon![(x: -10.0, y: 1.0), (x: -10.0, y: 2.0), (x: -9.0, y: 2.0), (x: -9.0, y: 1.0), (x: -10.0, y: 1.0)],
        ));

        let params = QueryParams::parse("tile=1/1/0").unwrap();
        let contained = FilterConfig::new().with_bbox_filter("geometry", false);
        let result = TileFilter::default()
            .filter_query(&params, store.query(), &contained)
            .map(names)
            .unwrap();
        assert_eq!(result, vec!["inNorthEastTile"]);

        let overlapping = FilterConfig::new().with_bbox_filter("geometry", true);
        let result = TileFilter::default()
            .filter_query(&params, store.query(), &overlapping)
            .map(names)
            .unwrap();
        assert_eq!(result, vec!["inNorthEastTile", "crossesEquator"]);
    }

    #[test]
    fn malformed_tile() {
        let config = FilterConfig::new().with_bbox_filter("geometry", false);
        for query in ["tile=1/0", "tile=a/b/c", "tile=1.5/0/0"] {
            let err = run(&TileFilter::default(), query, &config).unwrap_err();
            assert_matches!(&err, FilterError::Parse(_));
            assert_eq!(err.to_string(), "Invalid tile string supplied for parameter tile");
        }
    }
}
