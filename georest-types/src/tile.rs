//! Slippy map tile addressing.
//!
//! Converts `zoom/x/y` tile addresses (OSM/Google scheme, `Y == 0` at the top of the map) into
//! geographic bounding boxes. See <https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames>.

use std::f64::consts::PI;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeoRestTypesError;
use crate::rect::Rect;

/// Tile index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileIndex {
    /// X index.
    pub x: i32,
    /// Y index.
    pub y: i32,
    /// Z index.
    pub z: u32,
}

impl TileIndex {
    /// Create a new index instance.
    pub fn new(x: i32, y: i32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Geographic bounding box of the tile.
    ///
    /// Indices outside of `0..2^z` are not rejected: the formula is evaluated as is.
    pub fn bbox(&self) -> Rect {
        tile_edges(self.x, self.y, self.z)
    }
}

impl From<TileIndex> for Rect {
    fn from(value: TileIndex) -> Self {
        value.bbox()
    }
}

impl FromStr for TileIndex {
    type Err = GeoRestTypesError;

    /// Parses a `Z/X/Y` address. Exactly three integer parts are required.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || GeoRestTypesError::InvalidTile(s.to_string());

        let mut parts = s.split('/');
        let (Some(z), Some(x), Some(y), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(err());
        };

        let z = z.trim().parse::<u32>().map_err(|_| err())?;
        let x = x.trim().parse::<i32>().map_err(|_| err())?;
        let y = y.trim().parse::<i32>().map_err(|_| err())?;

        Ok(Self { x, y, z })
    }
}

/// Number of tiles along one axis at the zoom level `z`.
pub fn num_tiles(z: u32) -> f64 {
    2f64.powf(z as f64)
}

/// Converts a mercator `y` in radians into latitude in degrees.
pub fn mercator_to_lat(mercator_y: f64) -> f64 {
    mercator_y.sinh().atan().to_degrees()
}

/// Returns `(north, south)` latitudes of the tile row `y`.
pub fn lat_edges(y: i32, z: u32) -> (f64, f64) {
    let unit = 1.0 / num_tiles(z);
    let rel_y1 = y as f64 * unit;
    let rel_y2 = rel_y1 + unit;
    let lat1 = mercator_to_lat(PI * (1.0 - 2.0 * rel_y1));
    let lat2 = mercator_to_lat(PI * (1.0 - 2.0 * rel_y2));
    (lat1, lat2)
}

/// Returns `(west, east)` longitudes of the tile column `x`.
pub fn lon_edges(x: i32, z: u32) -> (f64, f64) {
    let unit = 360.0 / num_tiles(z);
    let lon1 = -180.0 + x as f64 * unit;
    let lon2 = lon1 + unit;
    (lon1, lon2)
}

/// Bounding box `(west, south, east, north)` of the tile `(x, y)` at zoom `z`.
pub fn tile_edges(x: i32, y: i32, z: u32) -> Rect {
    let (lat1, lat2) = lat_edges(y, z);
    let (lon1, lon2) = lon_edges(x, z);
    Rect::new(lon1, lat2, lon2, lat1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    const MAX_LAT: f64 = 85.0511287798066;

    #[test]
    fn root_tile() {
        let rect = tile_edges(0, 0, 0);
        assert_abs_diff_eq!(rect.x_min, -180.0);
        assert_abs_diff_eq!(rect.x_max, 180.0);
        assert_abs_diff_eq!(rect.y_min, -MAX_LAT, epsilon = 1e-9);
        assert_abs_diff_eq!(rect.y_max, MAX_LAT, epsilon = 1e-9);
    }

    #[test]
    fn north_east_quarter() {
        let rect = tile_edges(1, 0, 1);
        assert_abs_diff_eq!(rect.x_min, 0.0);
        assert_abs_diff_eq!(rect.y_min, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rect.x_max, 180.0);
        assert_abs_diff_eq!(rect.y_max, 85.0511287798, epsilon = 1e-9);
    }

    #[test]
    fn south_west_quarter() {
        let rect = tile_edges(0, 1, 1);
        assert_abs_diff_eq!(rect.x_min, -180.0);
        assert_abs_diff_eq!(rect.y_min, -MAX_LAT, epsilon = 1e-9);
        assert_abs_diff_eq!(rect.x_max, 0.0);
        assert_abs_diff_eq!(rect.y_max, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn out_of_range_tile_is_computed() {
        let rect = tile_edges(2, 0, 1);
        assert_abs_diff_eq!(rect.x_min, 180.0);
        assert_abs_diff_eq!(rect.x_max, 360.0);
    }

    #[test]
    fn parse_tile() {
        let tile: TileIndex = "1/1/0".parse().unwrap();
        assert_eq!(tile, TileIndex::new(1, 0, 1));
        assert_eq!(Rect::from(tile), tile_edges(1, 0, 1));
    }

    #[test]
    fn parse_tile_invalid() {
        for s in ["", "1/1", "1/1/1/1", "a/0/0", "1/0.5/0", "-1/0/0", "1,1,0"] {
            assert_matches!(s.parse::<TileIndex>(), Err(GeoRestTypesError::InvalidTile(_)));
        }
    }
}
