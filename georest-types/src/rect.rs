use std::str::FromStr;

use geo_types::{coord, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::GeoRestTypesError;

/// Axis-aligned bounding box.
///
/// For geographic data the fields are `west, south, east, north` (`minLon, minLat, maxLon,
/// maxLat`). This is also the order of the GeoJSON `bbox` member and of the `in_bbox` query
/// parameter.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum x (west).
    pub x_min: f64,
    /// Minimum y (south).
    pub y_min: f64,
    /// Maximum x (east).
    pub x_max: f64,
    /// Maximum y (north).
    pub y_max: f64,
}

impl Rect {
    /// Creates a new rectangle. The values are taken as is, no reordering is done.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// West edge.
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// East edge.
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// South edge.
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    /// North edge.
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Extent along the x axis.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Extent along the y axis.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Extent of a set of GeoJSON positions. Only the first two ordinates of every position are
    /// considered. Returns `None` if there are no positions with at least two ordinates.
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a [f64]>) -> Option<Self> {
        let mut positions = positions.into_iter().filter(|p| p.len() >= 2);
        let first = positions.next()?;
        let mut x_min = first[0];
        let mut y_min = first[1];
        let mut x_max = first[0];
        let mut y_max = first[1];

        for p in positions {
            if x_min > p[0] {
                x_min = p[0];
            }
            if y_min > p[1] {
                y_min = p[1];
            }
            if x_max < p[0] {
                x_max = p[0];
            }
            if y_max < p[1] {
                y_max = p[1];
            }
        }

        Some(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// Returns true if `other` lies completely inside `self`. Shared edges count as inside.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.x_min <= other.x_min
            && self.y_min <= other.y_min
            && self.x_max >= other.x_max
            && self.y_max >= other.y_max
    }

    /// Returns true if the two rectangles share at least one point.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }

    /// Converts the rectangle into a closed polygon ring starting at the `(x_min, y_min)` corner.
    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                coord! { x: self.x_min, y: self.y_min },
                coord! { x: self.x_min, y: self.y_max },
                coord! { x: self.x_max, y: self.y_max },
                coord! { x: self.x_max, y: self.y_min },
                coord! { x: self.x_min, y: self.y_min },
            ]),
            vec![],
        )
    }

    /// `[x_min, y_min, x_max, y_max]`, the GeoJSON `bbox` layout.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }
}

impl From<[f64; 4]> for Rect {
    fn from(value: [f64; 4]) -> Self {
        Self::new(value[0], value[1], value[2], value[3])
    }
}

impl From<geo_types::Rect<f64>> for Rect {
    fn from(value: geo_types::Rect<f64>) -> Self {
        Self::new(value.min().x, value.min().y, value.max().x, value.max().y)
    }
}

impl FromStr for Rect {
    type Err = GeoRestTypesError;

    /// Parses `minx,miny,maxx,maxy`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = parse_numbers(s)
            .filter(|v| v.len() == 4)
            .ok_or_else(|| GeoRestTypesError::InvalidBbox(s.to_string()))?;
        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }
}

/// Parses a point given as `x,y`.
pub fn parse_point(s: &str) -> Result<geo_types::Point<f64>, GeoRestTypesError> {
    match parse_numbers(s).as_deref() {
        Some([x, y]) => Ok(geo_types::Point::new(*x, *y)),
        _ => Err(GeoRestTypesError::InvalidPoint(s.to_string())),
    }
}

fn parse_numbers(s: &str) -> Option<Vec<f64>> {
    s.split(',')
        .map(|part| part.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect()
}
