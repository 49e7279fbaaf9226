//! Geometry field codec.
//!
//! [`GeometryField`] converts native [`geo_types::Geometry`] values into GeoJSON geometry
//! objects and parses client input (GeoJSON, WKT, EWKT or HEXEWKB) back into native geometries.

mod decode;
mod encode;

use std::fmt::{Display, Formatter};

use geo::HasDimensions;
use geo_types::{Geometry, Point};
use georest_types::{CoordinateProcessing, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use decode::parse_geometry;
pub use encode::{encode_geometry, geometry_extent};

/// Geometry type a field is declared with.
///
/// [`GeometryKind::Geometry`] accepts any geometry; every other kind accepts only itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    /// Any geometry type.
    Geometry,
    /// Single point.
    Point,
    /// Line string.
    LineString,
    /// Polygon with optional holes.
    Polygon,
    /// Set of points.
    MultiPoint,
    /// Set of line strings.
    MultiLineString,
    /// Set of polygons.
    MultiPolygon,
    /// Heterogeneous collection of geometries.
    GeometryCollection,
}

impl GeometryKind {
    /// GeoJSON `type` name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            GeometryKind::Geometry => "Geometry",
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::GeometryCollection => "GeometryCollection",
        }
    }

    /// Kind of a native geometry. `Line`, `Rect` and `Triangle` map onto the GeoJSON type they
    /// are serialized as.
    pub fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::Line(_) | Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {
                GeometryKind::Polygon
            }
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }

    /// Returns true if a field of this kind can hold a geometry of the `other` kind.
    pub fn accepts(&self, other: GeometryKind) -> bool {
        *self == GeometryKind::Geometry || *self == other
    }
}

impl Display for GeometryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Point standing for `POINT EMPTY`. As in WKB, both of its coordinates are NaN.
pub fn empty_point() -> Point<f64> {
    Point::new(f64::NAN, f64::NAN)
}

/// Returns true if the geometry has no coordinates, including the [`empty_point`].
pub fn is_empty_geometry(geometry: &Geometry<f64>) -> bool {
    match geometry {
        Geometry::Point(p) => p.x().is_nan() && p.y().is_nan(),
        other => other.is_empty(),
    }
}

/// Error decoding geometry input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryDecodeError {
    /// Input looks like geometry text but could not be parsed.
    #[error("Invalid format: string or unicode input unrecognized as GeoJSON, WKT EWKT or HEXEWKB.")]
    UnrecognizedFormat,
    /// Input has a wrong type or structure.
    #[error("Unable to convert to object: {0}")]
    Conversion(String),
}

/// Codec of a single geometry field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryField {
    /// Declared geometry kind of the field.
    pub kind: GeometryKind,
    /// Post-processing applied to encoded coordinates.
    pub processing: CoordinateProcessing,
    /// Attach a `bbox` member to every encoded geometry.
    pub auto_bbox: bool,
}

impl Default for GeometryField {
    fn default() -> Self {
        Self::new(GeometryKind::Geometry)
    }
}

impl GeometryField {
    /// Codec for a field of the given kind without any post-processing.
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            processing: CoordinateProcessing::default(),
            auto_bbox: false,
        }
    }

    /// Sets rounding precision of encoded coordinates.
    pub fn with_precision(mut self, precision: Option<u32>) -> Self {
        self.processing.precision = precision;
        self
    }

    /// Enables removal of consecutive duplicate points in encoded coordinates.
    pub fn with_remove_duplicates(mut self, remove_duplicates: bool) -> Self {
        self.processing.remove_duplicates = remove_duplicates;
        self
    }

    /// Attaches `bbox` to encoded geometries.
    pub fn with_auto_bbox(mut self, auto_bbox: bool) -> Self {
        self.auto_bbox = auto_bbox;
        self
    }

    /// Encodes a native geometry into a GeoJSON geometry object.
    pub fn encode(&self, geometry: &Geometry<f64>) -> serde_json::Value {
        encode_geometry(geometry, &self.processing, self.auto_bbox)
    }

    /// Decodes client input into a native geometry.
    ///
    /// `null` and an empty string decode into `None`; whether that is acceptable is decided by the
    /// caller. A decoded geometry of a kind the field does not accept is a
    /// [`GeometryDecodeError::Conversion`] error.
    pub fn decode(
        &self,
        value: &serde_json::Value,
    ) -> Result<Option<Geometry<f64>>, GeometryDecodeError> {
        let Some(geometry) = parse_geometry(value)? else {
            return Ok(None);
        };

        let kind = GeometryKind::of(&geometry);
        if !self.kind.accepts(kind) {
            return Err(GeometryDecodeError::Conversion(format!(
                "Expected {} geometry, got {kind}",
                self.kind
            )));
        }

        Ok(Some(geometry))
    }

    /// Extent of a geometry, if it has any coordinates.
    pub fn extent(&self, geometry: &Geometry<f64>) -> Option<Rect> {
        geometry_extent(geometry)
    }
}
