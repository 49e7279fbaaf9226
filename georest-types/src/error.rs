//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoRestTypesError {
    /// Bounding box string is not four comma separated finite numbers.
    #[error("invalid bounding box: {0:?}")]
    InvalidBbox(String),
    /// Tile address is not `Z/X/Y` with integer components.
    #[error("invalid tile address: {0:?}")]
    InvalidTile(String),
    /// Point string is not two comma separated finite numbers.
    #[error("invalid point: {0:?}")]
    InvalidPoint(String),
}
