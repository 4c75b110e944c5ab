//! Observation coordinator: cell cache, refresh cycle, and listener fan-out.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::client::{GriddataApi, GridpointData};
use crate::error::{GriddataError, Result};
use crate::types::{Coordinate, GridCell, ObservationSnapshot};

/// A zero-argument notification callback.
pub type Listener = Box<dyn Fn() + Send + Sync>;

/// Coordinates grid resolution and gridpoint refreshes for one location.
///
/// Owns exactly one [`Coordinate`], at most one cached [`GridCell`], the
/// current [`ObservationSnapshot`], and the listener registry. All mutation
/// happens inside [`refresh`](Self::refresh) or
/// [`add_listener`](Self::add_listener), both of which take `&mut self`, so
/// cycles cannot overlap as long as a single task drives the coordinator.
///
/// Every refresh cycle runs resolve-if-absent, fetch, drift check, snapshot
/// install. Failures never escape `refresh`; a failed cycle simply leaves
/// the previous snapshot in place and is retried on the next tick.
pub struct ObservationCoordinator {
    coordinate: Coordinate,
    api: Arc<dyn GriddataApi>,
    cell: Option<GridCell>,
    snapshot: watch::Sender<ObservationSnapshot>,
    listeners: Vec<Listener>,
}

impl ObservationCoordinator {
    pub fn new(coordinate: Coordinate, api: Arc<dyn GriddataApi>) -> Self {
        let (snapshot, _) = watch::channel(ObservationSnapshot::default());
        Self {
            coordinate,
            api,
            cell: None,
            snapshot,
            listeners: Vec::new(),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// The cached grid cell, if one is known and valid-as-of-last-check.
    pub fn grid_cell(&self) -> Option<&GridCell> {
        self.cell.as_ref()
    }

    /// A clone of the current snapshot.
    pub fn snapshot(&self) -> ObservationSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A read-side handle onto the snapshot for presentation objects.
    ///
    /// The receiver always observes a complete snapshot: replacement goes
    /// through the watch channel in one send.
    pub fn subscribe(&self) -> watch::Receiver<ObservationSnapshot> {
        self.snapshot.subscribe()
    }

    /// Register a notification callback.
    ///
    /// Callbacks run synchronously, in registration order, after each
    /// successful snapshot replacement. Duplicate registration is allowed
    /// and produces duplicate notifications.
    pub fn add_listener(&mut self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Run one refresh cycle.
    ///
    /// Called once at startup before any consumer reads data, then on every
    /// scheduler tick. Errors are absorbed here: invalidation and drift log
    /// warnings, network and parse failures log errors, and in all cases
    /// the cycle produces no update.
    #[instrument(skip(self), fields(coordinate = %self.coordinate))]
    pub async fn refresh(&mut self) {
        counter!("griddata_refresh_cycles_total").increment(1);

        if let Err(err) = self.run_cycle().await {
            counter!("griddata_refresh_failures_total").increment(1);
            match &err {
                GriddataError::CellInvalidated { .. } | GriddataError::CellDrifted { .. } => {
                    warn!(error = %err, "refresh cycle skipped");
                }
                _ => {
                    error!(error = %err, "refresh cycle failed");
                }
            }
        }
    }

    async fn run_cycle(&mut self) -> Result<()> {
        let cell = match self.cell.clone() {
            Some(cell) => cell,
            None => self.resolve_cell().await?,
        };

        match self.fetch_and_install(cell).await {
            Err(GriddataError::CellDrifted { expected, got }) => {
                // The cached cell is already cleared; re-resolve once within
                // this cycle. A second drift or a failed resolution ends the
                // cycle and leaves recovery to the next tick.
                warn!(
                    expected = %expected,
                    got = %got,
                    "grid identifier changed, re-resolving"
                );
                counter!("griddata_cell_drift_total").increment(1);
                let cell = self.resolve_cell().await?;
                self.fetch_and_install(cell).await
            }
            other => other,
        }
    }

    /// Resolve the coordinate to a grid cell and cache it.
    async fn resolve_cell(&mut self) -> Result<GridCell> {
        let resolved = self.api.resolve_point(self.coordinate).await?;

        match resolved {
            Some(cell) => {
                info!(cell = %cell, "resolved grid cell");
                self.cell = Some(cell.clone());
                Ok(cell)
            }
            None => Err(GriddataError::Resolution(format!(
                "no grid cell available for {}",
                self.coordinate
            ))),
        }
    }

    /// Fetch gridpoint data for `cell` and, if it matches, install it as the
    /// new snapshot and notify listeners.
    ///
    /// On a 404 or a drifted identifier the cached cell is cleared and the
    /// fetched body discarded, leaving the previous snapshot in place.
    async fn fetch_and_install(&mut self, cell: GridCell) -> Result<()> {
        let fetched = self.api.fetch_gridpoint(&cell).await;

        let data = match fetched {
            Ok(data) => data,
            Err(err) => {
                if matches!(err, GriddataError::CellInvalidated { .. }) {
                    counter!("griddata_cell_invalidated_total").increment(1);
                    self.cell = None;
                }
                return Err(err);
            }
        };

        if let Some(got) = data.grid_id.as_deref() {
            if got != cell.grid_id {
                self.cell = None;
                return Err(GriddataError::CellDrifted {
                    expected: cell.grid_id,
                    got: got.to_string(),
                });
            }
        }

        self.install_snapshot(cell, data);
        Ok(())
    }

    fn install_snapshot(&mut self, cell: GridCell, data: GridpointData) {
        info!(
            cell = %cell,
            update_time = ?data.update_time,
            "installing new observation snapshot"
        );

        let snapshot = ObservationSnapshot {
            update_time: data.update_time,
            cell: Some(cell),
            wind_speed: data.wind_speed,
            wind_direction: data.wind_direction,
            temperature: data.temperature,
        };

        self.snapshot.send_replace(snapshot);
        counter!("griddata_snapshot_updates_total").increment(1);

        for listener in &self.listeners {
            listener();
        }
    }
}
