use std::str::FromStr;

use geo_types::Geometry;
use geozero::wkb::Ewkb;
use geozero::ToGeo;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as JsonValue;

use super::{empty_point, GeometryDecodeError};

lazy_static! {
    static ref EWKT_PREFIX: Regex =
        Regex::new(r"(?is)^\s*SRID=(?P<srid>-?\d+)\s*;\s*(?P<wkt>.*)$").expect("valid EWKT regex");
    static ref WKT_KEYWORD: Regex = Regex::new(
        r"(?i)^\s*(POINT|LINESTRING|POLYGON|MULTIPOINT|MULTILINESTRING|MULTIPOLYGON|GEOMETRYCOLLECTION)\b"
    )
    .expect("valid WKT regex");
}

/// Parses any supported geometry input.
///
/// * `null` and blank strings give `Ok(None)`.
/// * JSON objects are parsed as GeoJSON geometries.
/// * Strings are parsed as GeoJSON (when starting with `{`), HEXEWKB (hex digits only), EWKT
///   (`SRID=<n>;` prefix) or WKT.
///
/// Malformed geometry text is reported as [`GeometryDecodeError::UnrecognizedFormat`]. Values of
/// a wrong type, strings that are not geometry text at all, and invalid GeoJSON objects are
/// [`GeometryDecodeError::Conversion`] errors.
pub fn parse_geometry(value: &JsonValue) -> Result<Option<Geometry<f64>>, GeometryDecodeError> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) if s.trim().is_empty() => Ok(None),
        JsonValue::String(s) => parse_text(s).map(Some),
        JsonValue::Object(_) => parse_geojson(value.clone()).map(Some),
        JsonValue::Array(_) => Err(improper_type("array")),
        JsonValue::Bool(_) => Err(improper_type("boolean")),
        JsonValue::Number(_) => Err(improper_type("number")),
    }
}

fn improper_type(name: &str) -> GeometryDecodeError {
    GeometryDecodeError::Conversion(format!("Improper geometry input type: {name}"))
}

fn parse_text(s: &str) -> Result<Geometry<f64>, GeometryDecodeError> {
    let trimmed = s.trim();

    if trimmed.starts_with('{') {
        let value: JsonValue = serde_json::from_str(trimmed)
            .map_err(|err| GeometryDecodeError::Conversion(format!("Invalid GeoJSON: {err}")))?;
        return parse_geojson(value);
    }

    if is_hex(trimmed) {
        return parse_hex_ewkb(trimmed);
    }

    if let Some(captures) = EWKT_PREFIX.captures(trimmed) {
        let srid = &captures["srid"];
        if srid != "4326" {
            log::debug!("EWKT input with SRID {srid} is used without reprojection");
        }
        return parse_wkt(&captures["wkt"]);
    }

    if WKT_KEYWORD.is_match(trimmed) {
        return parse_wkt(trimmed);
    }

    Err(GeometryDecodeError::Conversion(
        "String input unrecognized as WKT EWKT, and HEXEWKB.".into(),
    ))
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.len() % 2 == 0 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn parse_hex_ewkb(s: &str) -> Result<Geometry<f64>, GeometryDecodeError> {
    let bytes = hex::decode(s)
        .map_err(|err| GeometryDecodeError::Conversion(format!("Invalid HEXEWKB: {err}")))?;
    Ewkb(bytes)
        .to_geo()
        .map_err(|err| GeometryDecodeError::Conversion(format!("Invalid HEXEWKB: {err}")))
}

fn parse_wkt(s: &str) -> Result<Geometry<f64>, GeometryDecodeError> {
    let parsed = wkt::Wkt::<f64>::from_str(s.trim()).map_err(|err| {
        log::debug!("Failed to parse WKT {s:?}: {err}");
        GeometryDecodeError::UnrecognizedFormat
    })?;

    // geo_types has no empty point; converting one would give an empty MultiPoint.
    if let wkt::Wkt::Point(wkt::types::Point(None)) = parsed {
        return Ok(empty_point().into());
    }

    parsed.try_into().map_err(|err: wkt::conversion::Error| {
        log::debug!("Failed to convert WKT {s:?}: {err:?}");
        GeometryDecodeError::UnrecognizedFormat
    })
}

fn parse_geojson(value: JsonValue) -> Result<Geometry<f64>, GeometryDecodeError> {
    let invalid = |detail: String| {
        GeometryDecodeError::Conversion(format!("Invalid GeoJSON geometry: {detail}"))
    };

    let geometry: geojson::Geometry =
        serde_json::from_value(value).map_err(|err| invalid(err.to_string()))?;
    if !has_valid_positions(&geometry.value) {
        return Err(invalid("positions must have at least two ordinates".into()));
    }

    Geometry::<f64>::try_from(geometry).map_err(|err| invalid(err.to_string()))
}

fn has_valid_positions(value: &geojson::Value) -> bool {
    let valid = |p: &Vec<f64>| p.len() >= 2;
    match value {
        geojson::Value::Point(p) => valid(p),
        geojson::Value::MultiPoint(ps) | geojson::Value::LineString(ps) => ps.iter().all(valid),
        geojson::Value::MultiLineString(ls) | geojson::Value::Polygon(ls) => {
            ls.iter().flatten().all(valid)
        }
        geojson::Value::MultiPolygon(polygons) => polygons.iter().flatten().flatten().all(valid),
        geojson::Value::GeometryCollection(members) => {
            members.iter().all(|m| has_valid_positions(&m.value))
        }
    }
}
