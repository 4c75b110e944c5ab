//! Sensor-style presentation over the coordinator's snapshot.
//!
//! One configurable type covers all three measured quantities; the quantity
//! enum picks the series to read, so there is no per-quantity subtype.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::types::{Coordinate, ObservationSnapshot, Quantity, TimedValue};

/// Attributes exposed alongside a sensor's state.
#[derive(Debug, Clone, Serialize)]
pub struct SensorAttributes {
    pub grid_id: Option<String>,
    pub grid_x: Option<i64>,
    pub grid_y: Option<i64>,
    pub update_time: Option<DateTime<Utc>>,
    pub uom: Option<String>,
    pub values: Vec<TimedValue>,
}

/// A read-only view of one measured quantity in the latest snapshot.
///
/// Sensors never trigger fetches; they read whatever snapshot the
/// coordinator last installed. The watch receiver keeps them decoupled from
/// the coordinator's lifetime and mutation.
#[derive(Debug, Clone)]
pub struct GridSensor {
    quantity: Quantity,
    coordinate: Coordinate,
    snapshot: watch::Receiver<ObservationSnapshot>,
}

impl GridSensor {
    pub fn new(
        quantity: Quantity,
        coordinate: Coordinate,
        snapshot: watch::Receiver<ObservationSnapshot>,
    ) -> Self {
        Self {
            quantity,
            coordinate,
            snapshot,
        }
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Display name, e.g. "NWS Wind Speed 40.7,-74".
    pub fn name(&self) -> String {
        format!("NWS {} {}", self.quantity.display_name(), self.coordinate)
    }

    /// Stable identifier, e.g. "nws_wind_speed_40.7_-74".
    pub fn unique_id(&self) -> String {
        format!(
            "nws_{}_{}_{}",
            self.quantity.slug(),
            self.coordinate.latitude,
            self.coordinate.longitude
        )
    }

    /// Numeric state: the count of values in this quantity's series.
    pub fn state(&self) -> usize {
        self.snapshot.borrow().series(self.quantity).values.len()
    }

    /// The series, its unit label, and the cell/update-time of the current
    /// snapshot.
    pub fn attributes(&self) -> SensorAttributes {
        let snapshot = self.snapshot.borrow();
        let series = snapshot.series(self.quantity);

        SensorAttributes {
            grid_id: snapshot.cell.as_ref().map(|c| c.grid_id.clone()),
            grid_x: snapshot.cell.as_ref().map(|c| c.grid_x),
            grid_y: snapshot.cell.as_ref().map(|c| c.grid_y),
            update_time: snapshot.update_time,
            uom: series.uom.clone(),
            values: series.values.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GridCell, QuantitySeries};

    fn snapshot_with_wind() -> ObservationSnapshot {
        ObservationSnapshot {
            update_time: None,
            cell: Some(GridCell::new("OKX", 30, 80)),
            wind_speed: QuantitySeries {
                values: vec![
                    TimedValue {
                        valid_time: "t0".into(),
                        value: Some(5.0),
                    },
                    TimedValue {
                        valid_time: "t1".into(),
                        value: Some(7.0),
                    },
                ],
                uom: Some("km/h".into()),
            },
            ..Default::default()
        }
    }

    #[test]
    fn state_counts_series_values() {
        let (tx, rx) = watch::channel(snapshot_with_wind());
        let sensor = GridSensor::new(Quantity::WindSpeed, Coordinate::new(40.7, -74.0), rx);
        assert_eq!(sensor.state(), 2);
        drop(tx);
    }

    #[test]
    fn attributes_expose_uom_values_and_cell() {
        let (_tx, rx) = watch::channel(snapshot_with_wind());
        let sensor = GridSensor::new(Quantity::WindSpeed, Coordinate::new(40.7, -74.0), rx);

        let attrs = sensor.attributes();
        assert_eq!(attrs.grid_id.as_deref(), Some("OKX"));
        assert_eq!(attrs.grid_x, Some(30));
        assert_eq!(attrs.grid_y, Some(80));
        assert_eq!(attrs.uom.as_deref(), Some("km/h"));
        assert_eq!(attrs.values.len(), 2);
        assert_eq!(attrs.values[1].value, Some(7.0));
    }

    #[test]
    fn empty_snapshot_yields_zero_state_and_empty_attributes() {
        let (_tx, rx) = watch::channel(ObservationSnapshot::default());
        let sensor = GridSensor::new(Quantity::Temperature, Coordinate::new(40.7, -74.0), rx);

        assert_eq!(sensor.state(), 0);
        let attrs = sensor.attributes();
        assert!(attrs.grid_id.is_none());
        assert!(attrs.uom.is_none());
        assert!(attrs.values.is_empty());
    }

    #[test]
    fn names_follow_the_quantity_and_coordinate() {
        let (_tx, rx) = watch::channel(ObservationSnapshot::default());
        let sensor = GridSensor::new(Quantity::WindDirection, Coordinate::new(40.7, -74.0), rx);

        assert_eq!(sensor.name(), "NWS Wind Direction 40.7,-74");
        assert_eq!(sensor.unique_id(), "nws_wind_direction_40.7_-74");
    }
}
