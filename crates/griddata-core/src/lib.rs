//! Grid resolution and observation coordination for api.weather.gov.
//!
//! This crate resolves a geographic coordinate to an NWS forecast grid cell,
//! fetches the gridpoint observation time-series for that cell, and
//! republishes the latest values:
//!
//! - [`client`] — the point-lookup and gridpoint-data HTTP client, behind
//!   the [`GriddataApi`](client::GriddataApi) trait so the coordinator can
//!   be driven by fakes in tests.
//! - [`coordinator`] — the stateful core: cached cell, refresh cycle,
//!   drift/invalidation recovery, and listener notification.
//! - [`sensor`] — quantity-parameterized read-only views over the latest
//!   snapshot.
//!
//! All upstream failures are absorbed inside
//! [`ObservationCoordinator::refresh`](coordinator::ObservationCoordinator::refresh);
//! consumers only ever observe that the snapshot did or did not change.

pub mod client;
pub mod coordinator;
pub mod error;
pub mod sensor;
pub mod types;

pub use client::{GriddataApi, GridpointData, NwsClient, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use coordinator::ObservationCoordinator;
pub use error::{GriddataError, Result};
pub use sensor::{GridSensor, SensorAttributes};
pub use types::{
    Coordinate, GridCell, ObservationSnapshot, Quantity, QuantitySeries, TimedValue,
};
