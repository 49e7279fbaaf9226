//! Post-processing of GeoJSON coordinate trees.
//!
//! Two transforms are supported: rounding every ordinate to a number of decimal places, and
//! removing consecutive duplicate positions. When both are enabled rounding runs first, so points
//! that become equal after rounding are collapsed too.

use geojson::{Geometry, Position, Value};
use serde::{Deserialize, Serialize};

/// Coordinate post-processing options of a geometry field.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateProcessing {
    /// Number of decimal places to keep. `None` leaves coordinates untouched.
    pub precision: Option<u32>,
    /// Drop consecutive duplicate positions.
    pub remove_duplicates: bool,
}

impl CoordinateProcessing {
    /// Options that do nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rounding precision.
    pub fn with_precision(mut self, precision: Option<u32>) -> Self {
        self.precision = precision;
        self
    }

    /// Enables or disables removal of consecutive duplicate positions.
    pub fn with_remove_duplicates(mut self, remove_duplicates: bool) -> Self {
        self.remove_duplicates = remove_duplicates;
        self
    }

    /// Returns true if [`apply`](Self::apply) would leave any geometry unchanged.
    pub fn is_noop(&self) -> bool {
        self.precision.is_none() && !self.remove_duplicates
    }

    /// Applies the configured transforms to the geometry value in place.
    ///
    /// Members of a `GeometryCollection` are processed each with its own type.
    pub fn apply(&self, value: &mut Value) {
        if self.is_noop() {
            return;
        }

        if let Value::GeometryCollection(geometries) = value {
            for geometry in geometries {
                self.apply(&mut geometry.value);
            }
            return;
        }

        if let Some(precision) = self.precision {
            round_value(value, precision);
        }

        if self.remove_duplicates {
            remove_redundant(value);
        }
    }

    /// Same as [`apply`](Self::apply), for a whole [`Geometry`].
    pub fn apply_geometry(&self, geometry: &mut Geometry) {
        self.apply(&mut geometry.value);
    }
}

/// Rounds `value` to `precision` decimal places.
///
/// Rounding is done on the exact decimal expansion of the binary value, so `34.985` (stored as
/// `34.98499999...`) becomes `34.98`.
pub fn round(value: f64, precision: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    format!("{:.*}", precision as usize, value)
        .parse()
        .unwrap_or(value)
}

fn round_positions(positions: &mut [Position], precision: u32) {
    for position in positions {
        for ordinate in position.iter_mut() {
            *ordinate = round(*ordinate, precision);
        }
    }
}

fn round_value(value: &mut Value, precision: u32) {
    match value {
        Value::Point(position) => round_positions(std::slice::from_mut(position), precision),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            round_positions(positions, precision)
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            for line in lines {
                round_positions(line, precision);
            }
        }
        Value::MultiPolygon(polygons) => {
            for line in polygons.iter_mut().flatten() {
                round_positions(line, precision);
            }
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                round_value(&mut geometry.value, precision);
            }
        }
    }
}

/// Drops consecutive duplicates. If `keep_line` is set and only one position survives, it is
/// repeated so the result still describes a line.
fn dedupe(positions: &mut Vec<Position>, keep_line: bool) {
    positions.dedup();
    if keep_line && positions.len() == 1 {
        let first = positions[0].clone();
        positions.push(first);
    }
}

fn dedupe_ring(ring: &mut Vec<Position>) {
    dedupe(ring, true);
    if ring.len() < 4 {
        log::warn!(
            "Polygon ring has {} positions after duplicate removal, geometry may be invalid",
            ring.len()
        );
    }
}

fn remove_redundant(value: &mut Value) {
    match value {
        Value::Point(_) => {}
        Value::LineString(positions) => dedupe(positions, true),
        Value::MultiPoint(positions) => dedupe(positions, false),
        Value::MultiLineString(lines) => {
            for line in lines {
                dedupe(line, true);
            }
        }
        Value::Polygon(rings) => {
            for ring in rings {
                dedupe_ring(ring);
            }
        }
        Value::MultiPolygon(polygons) => {
            for ring in polygons.iter_mut().flatten() {
                dedupe_ring(ring);
            }
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                remove_redundant(&mut geometry.value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rounding(precision: u32) -> CoordinateProcessing {
        CoordinateProcessing::new().with_precision(Some(precision))
    }

    fn dedupe_only() -> CoordinateProcessing {
        CoordinateProcessing::new().with_remove_duplicates(true)
    }

    #[test]
    fn round_half_follows_binary_value() {
        assert_eq!(round(34.985, 2), 34.98);
        assert_eq!(round(36.9850, 2), 36.98);
        assert_eq!(round(-105.0162, 2), -105.02);
        assert_eq!(round(39.5742, 0), 40.0);
        assert!(round(f64::NAN, 2).is_nan());
    }

    #[test]
    fn round_point() {
        let mut value = Value::Point(vec![-105.0162, 39.5742]);
        rounding(2).apply(&mut value);
        assert_eq!(value, Value::Point(vec![-105.02, 39.57]));
    }

    #[test]
    fn round_keeps_nesting() {
        let mut value = Value::MultiPolygon(vec![vec![vec![
            vec![0.123, 0.456],
            vec![1.987, 0.111],
            vec![1.444, 1.555],
            vec![0.123, 0.456],
        ]]]);
        rounding(1).apply(&mut value);
        assert_eq!(
            value,
            Value::MultiPolygon(vec![vec![vec![
                vec![0.1, 0.5],
                vec![2.0, 0.1],
                vec![1.4, 1.6],
                vec![0.1, 0.5],
            ]]])
        );
    }

    #[test]
    fn no_options_no_changes() {
        let original = Value::LineString(vec![vec![1.23456, 1.0], vec![1.23456, 1.0]]);
        let mut value = original.clone();
        CoordinateProcessing::new().apply(&mut value);
        assert_eq!(value, original);
    }

    #[test]
    fn linestring_collapsed_to_one_point_keeps_two() {
        let mut value = Value::LineString(vec![
            vec![1.0, 1.0],
            vec![1.0, 1.0],
            vec![1.0, 1.0],
            vec![1.0, 1.0],
        ]);
        dedupe_only().apply(&mut value);
        assert_eq!(value, Value::LineString(vec![vec![1.0, 1.0], vec![1.0, 1.0]]));
    }

    #[test]
    fn multipoint_collapses_to_one() {
        let mut value = Value::MultiPoint(vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![2.0, 1.0]]);
        dedupe_only().apply(&mut value);
        assert_eq!(value, Value::MultiPoint(vec![vec![1.0, 1.0], vec![2.0, 1.0]]));

        let mut value = Value::MultiPoint(vec![vec![1.0, 1.0], vec![1.0, 1.0]]);
        dedupe_only().apply(&mut value);
        assert_eq!(value, Value::MultiPoint(vec![vec![1.0, 1.0]]));
    }

    #[test]
    fn non_consecutive_duplicates_are_kept() {
        let mut value = Value::LineString(vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 0.0]]);
        let expected = value.clone();
        dedupe_only().apply(&mut value);
        assert_eq!(value, expected);
    }

    #[test]
    fn polygon_ring_stays_closed() {
        let mut value = Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![1.0, 0.0],
            vec![0.0, 0.0],
        ]]);
        dedupe_only().apply(&mut value);

        let Value::Polygon(rings) = value else {
            panic!("not a polygon");
        };
        assert_eq!(rings[0].len(), 5);
        assert_eq!(rings[0].first(), rings[0].last());
        assert_eq!(rings[0][1], vec![0.0, 1.0]);
        assert_eq!(rings[0][2], vec![1.0, 1.0]);
    }

    #[test]
    fn degenerate_ring_gets_duplicated_point() {
        let mut value = Value::Polygon(vec![vec![vec![2.0, 2.0], vec![2.0, 2.0], vec![2.0, 2.0]]]);
        dedupe_only().apply(&mut value);
        assert_eq!(value, Value::Polygon(vec![vec![vec![2.0, 2.0], vec![2.0, 2.0]]]));
    }

    #[test]
    fn rounding_runs_before_dedupe() {
        let mut value = Value::LineString(vec![
            vec![10.001, 10.0],
            vec![10.002, 10.0],
            vec![11.0, 10.0],
        ]);
        CoordinateProcessing::new()
            .with_precision(Some(2))
            .with_remove_duplicates(true)
            .apply(&mut value);
        assert_eq!(value, Value::LineString(vec![vec![10.0, 10.0], vec![11.0, 10.0]]));
    }

    #[test]
    fn collection_members_use_their_own_type() {
        let mut value = Value::GeometryCollection(vec![
            Geometry::new(Value::Point(vec![1.0, 1.0])),
            Geometry::new(Value::LineString(vec![vec![1.0, 1.0], vec![1.0, 1.0]])),
            Geometry::new(Value::MultiPoint(vec![vec![1.0, 1.0], vec![1.0, 1.0]])),
        ]);
        dedupe_only().apply(&mut value);

        assert_eq!(
            value,
            Value::GeometryCollection(vec![
                Geometry::new(Value::Point(vec![1.0, 1.0])),
                Geometry::new(Value::LineString(vec![vec![1.0, 1.0], vec![1.0, 1.0]])),
                Geometry::new(Value::MultiPoint(vec![vec![1.0, 1.0]])),
            ])
        );
    }
}
