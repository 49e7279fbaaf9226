use geo::BoundingRect;
use geo_types::Geometry;
use georest_types::{CoordinateProcessing, Rect};
use serde_json::{Map, Value as JsonValue};

use super::{is_empty_geometry, GeometryKind};

/// Encodes a native geometry as an ordered GeoJSON geometry object.
///
/// Keys are written in the order `type`, `coordinates` (or `geometries`), `bbox`. An empty geometry
/// is encoded as `{"type": <kind>, "coordinates": []}` (`"geometries": []` for collections).
pub fn encode_geometry(
    geometry: &Geometry<f64>,
    processing: &CoordinateProcessing,
    auto_bbox: bool,
) -> JsonValue {
    let kind = GeometryKind::of(geometry);
    let mut map = Map::new();
    map.insert("type".into(), kind.name().into());

    if is_empty_geometry(geometry) {
        let key = match kind {
            GeometryKind::GeometryCollection => "geometries",
            _ => "coordinates",
        };
        map.insert(key.into(), JsonValue::Array(vec![]));
        return JsonValue::Object(map);
    }

    let mut value = geojson::Value::from(geometry);
    processing.apply(&mut value);

    match value {
        geojson::Value::GeometryCollection(members) => {
            let members = members
                .into_iter()
                .map(|member| value_to_json(member.value))
                .collect();
            map.insert("geometries".into(), JsonValue::Array(members));
        }
        other => {
            map.insert("coordinates".into(), coordinates_to_json(other));
        }
    }

    if auto_bbox {
        if let Some(extent) = geometry_extent(geometry) {
            map.insert("bbox".into(), bbox_to_json(&extent));
        }
    }

    JsonValue::Object(map)
}

/// Axis-aligned extent of a geometry. `None` for empty geometries.
pub fn geometry_extent(geometry: &Geometry<f64>) -> Option<Rect> {
    if is_empty_geometry(geometry) {
        return None;
    }
    geometry.bounding_rect().map(Rect::from)
}

pub(crate) fn bbox_to_json(rect: &Rect) -> JsonValue {
    JsonValue::from(rect.to_array().to_vec())
}

fn value_to_json(value: geojson::Value) -> JsonValue {
    let type_name = match &value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    };

    let mut map = Map::new();
    map.insert("type".into(), type_name.into());
    match value {
        geojson::Value::GeometryCollection(members) => {
            let members = members
                .into_iter()
                .map(|member| value_to_json(member.value))
                .collect();
            map.insert("geometries".into(), JsonValue::Array(members));
        }
        other => {
            map.insert("coordinates".into(), coordinates_to_json(other));
        }
    }

    JsonValue::Object(map)
}

fn coordinates_to_json(value: geojson::Value) -> JsonValue {
    match value {
        geojson::Value::Point(position) => JsonValue::from(position),
        geojson::Value::MultiPoint(positions) | geojson::Value::LineString(positions) => {
            JsonValue::from(positions)
        }
        geojson::Value::MultiLineString(lines) | geojson::Value::Polygon(lines) => {
            JsonValue::from(lines)
        }
        geojson::Value::MultiPolygon(polygons) => JsonValue::from(polygons),
        geojson::Value::GeometryCollection(_) => JsonValue::Array(vec![]),
    }
}
