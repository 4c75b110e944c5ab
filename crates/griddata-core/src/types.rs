//! Core data types for grid resolution and gridpoint observations.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic coordinate.
///
/// Range validation (latitude -90..=90, longitude -180..=180) happens in the
/// configuration layer before a coordinate reaches the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// A forecast grid cell: an NWS office identifier plus integer grid offsets.
///
/// A cell may become invalid if the upstream service re-partitions its grid;
/// the coordinator drops it on a 404 or a mismatched identifier and resolves
/// a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub grid_id: String,
    pub grid_x: i64,
    pub grid_y: i64,
}

impl GridCell {
    pub fn new(grid_id: impl Into<String>, grid_x: i64, grid_y: i64) -> Self {
        Self {
            grid_id: grid_id.into(),
            grid_x,
            grid_y,
        }
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{},{}", self.grid_id, self.grid_x, self.grid_y)
    }
}

/// A measured quantity in the gridpoint time-series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quantity {
    WindSpeed,
    WindDirection,
    Temperature,
}

impl Quantity {
    pub const ALL: [Quantity; 3] = [
        Quantity::WindSpeed,
        Quantity::WindDirection,
        Quantity::Temperature,
    ];

    /// Key used in the upstream JSON properties object.
    pub fn key(&self) -> &'static str {
        match self {
            Quantity::WindSpeed => "windSpeed",
            Quantity::WindDirection => "windDirection",
            Quantity::Temperature => "temperature",
        }
    }

    /// Human-readable name, e.g. "Wind Speed".
    pub fn display_name(&self) -> &'static str {
        match self {
            Quantity::WindSpeed => "Wind Speed",
            Quantity::WindDirection => "Wind Direction",
            Quantity::Temperature => "Temperature",
        }
    }

    /// Snake-case slug for identifiers, e.g. "wind_speed".
    pub fn slug(&self) -> &'static str {
        match self {
            Quantity::WindSpeed => "wind_speed",
            Quantity::WindDirection => "wind_direction",
            Quantity::Temperature => "temperature",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One time-stamped entry in a quantity series.
///
/// `valid_time` is the upstream ISO 8601 interval string (e.g.
/// "2024-01-15T12:00:00+00:00/PT1H"); it is passed through untouched.
/// `value` can be null upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedValue {
    #[serde(default)]
    pub valid_time: String,
    #[serde(default)]
    pub value: Option<f64>,
}

/// An ordered series of timed values plus its unit-of-measure label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantitySeries {
    pub values: Vec<TimedValue>,
    pub uom: Option<String>,
}

/// The latest complete data bundle fetched from the gridpoint service.
///
/// Replaced atomically on each successful fetch and never partially mutated.
/// Default-empty until the first successful fetch; a failed cycle leaves the
/// previous snapshot in place as last known good, so staleness shows up only
/// as an unchanged `update_time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObservationSnapshot {
    pub update_time: Option<DateTime<Utc>>,
    /// The cell the data was fetched for; always matches the cell used for
    /// the fetch that produced this snapshot.
    pub cell: Option<GridCell>,
    pub wind_speed: QuantitySeries,
    pub wind_direction: QuantitySeries,
    pub temperature: QuantitySeries,
}

impl ObservationSnapshot {
    /// The series for a measured quantity.
    pub fn series(&self, quantity: Quantity) -> &QuantitySeries {
        match quantity {
            Quantity::WindSpeed => &self.wind_speed,
            Quantity::WindDirection => &self.wind_direction,
            Quantity::Temperature => &self.temperature,
        }
    }
}
