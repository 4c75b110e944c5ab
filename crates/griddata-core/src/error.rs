//! Error types for grid resolution and gridpoint fetches.

use thiserror::Error;

use crate::types::GridCell;

/// Result type alias using GriddataError.
pub type Result<T> = std::result::Result<T, GriddataError>;

/// Errors arising from the point-lookup and gridpoint-data services.
///
/// None of these escape [`refresh`](crate::coordinator::ObservationCoordinator::refresh):
/// the coordinator logs each one and converts it into "cycle produced no
/// update", adjusting its cached cell where the variant calls for it.
#[derive(Debug, Error)]
pub enum GriddataError {
    /// The point-lookup service was unreachable, timed out, returned an
    /// unexpected status, or produced a body without a usable grid cell.
    #[error("grid resolution failed: {0}")]
    Resolution(String),

    /// The gridpoint service reported the cached cell no longer resolves.
    #[error("grid cell {cell} is no longer valid")]
    CellInvalidated { cell: GridCell },

    /// The gridpoint service answered for a different cell than requested.
    #[error("gridpoint returned grid id {got}, expected {expected}")]
    CellDrifted { expected: String, got: String },

    /// The gridpoint service was unreachable, timed out, or returned an
    /// unexpected status or malformed body.
    #[error("gridpoint fetch failed: {0}")]
    Fetch(String),

    /// The HTTP client itself could not be constructed.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}
