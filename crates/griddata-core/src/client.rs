//! HTTP client for the api.weather.gov point-lookup and gridpoint services.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::{GriddataError, Result};
use crate::types::{Coordinate, GridCell, QuantitySeries};

/// Default service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.weather.gov";

/// Default User-Agent; api.weather.gov rejects requests without one.
pub const DEFAULT_USER_AGENT: &str = concat!("griddata-core/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout for both services.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The gridpoint response body the coordinator consumes: the returned grid
/// identifier (for drift detection) plus the three measured-quantity series.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridpointData {
    pub grid_id: Option<String>,
    pub update_time: Option<DateTime<Utc>>,
    pub wind_speed: QuantitySeries,
    pub wind_direction: QuantitySeries,
    pub temperature: QuantitySeries,
}

/// Access to the point-lookup and gridpoint-data services.
///
/// The coordinator only talks to this trait, so tests can script responses
/// without a network.
#[async_trait]
pub trait GriddataApi: Send + Sync {
    /// Map a coordinate to a grid cell.
    ///
    /// `Ok(None)` means the response was well-formed but carried no grid
    /// identifier; the caller must treat that as "no cell available".
    async fn resolve_point(&self, coordinate: Coordinate) -> Result<Option<GridCell>>;

    /// Fetch the observation time-series for a cell.
    ///
    /// A 404 maps to [`GriddataError::CellInvalidated`]; every other failure
    /// maps to [`GriddataError::Fetch`].
    async fn fetch_gridpoint(&self, cell: &GridCell) -> Result<GridpointData>;
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct PointProperties {
    grid_id: Option<String>,
    grid_x: Option<i64>,
    grid_y: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GridpointResponse {
    properties: GridpointData,
}

/// Client for api.weather.gov.
///
/// The underlying `reqwest::Client` is cheap to clone and carries no
/// coordinator-specific state, so one instance can serve any number of
/// coordinators.
#[derive(Debug, Clone)]
pub struct NwsClient {
    http: Client,
    base_url: String,
}

impl NwsClient {
    /// Create a client against the default endpoint.
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, user_agent)
    }

    /// Create a client against a specific endpoint (tests, proxies).
    pub fn with_base_url(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn points_url(&self, coordinate: Coordinate) -> String {
        format!("{}/points/{}", self.base_url, coordinate)
    }

    fn gridpoint_url(&self, cell: &GridCell) -> String {
        format!(
            "{}/gridpoints/{}/{},{}",
            self.base_url, cell.grid_id, cell.grid_x, cell.grid_y
        )
    }
}

#[async_trait]
impl GriddataApi for NwsClient {
    async fn resolve_point(&self, coordinate: Coordinate) -> Result<Option<GridCell>> {
        let url = self.points_url(coordinate);
        debug!(url = %url, "resolving point");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| GriddataError::Resolution(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(GriddataError::Resolution(format!(
                "point lookup for {coordinate} returned {status}"
            )));
        }

        let body: PointResponse = response
            .json()
            .await
            .map_err(|e| GriddataError::Resolution(format!("malformed point response: {e}")))?;

        let props = body.properties;
        match (props.grid_id, props.grid_x, props.grid_y) {
            (Some(grid_id), Some(grid_x), Some(grid_y)) => {
                Ok(Some(GridCell::new(grid_id, grid_x, grid_y)))
            }
            _ => Ok(None),
        }
    }

    async fn fetch_gridpoint(&self, cell: &GridCell) -> Result<GridpointData> {
        let url = self.gridpoint_url(cell);
        debug!(url = %url, "fetching gridpoint data");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| GriddataError::Fetch(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GriddataError::CellInvalidated { cell: cell.clone() });
        }
        if status != StatusCode::OK {
            return Err(GriddataError::Fetch(format!(
                "gridpoint fetch for {cell} returned {status}"
            )));
        }

        let body: GridpointResponse = response
            .json()
            .await
            .map_err(|e| GriddataError::Fetch(format!("malformed gridpoint response: {e}")))?;

        Ok(body.properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> NwsClient {
        NwsClient::new(DEFAULT_USER_AGENT).unwrap()
    }

    #[test]
    fn points_url_embeds_coordinate() {
        let url = client().points_url(Coordinate::new(40.7, -74.0));
        assert_eq!(url, "https://api.weather.gov/points/40.7,-74");
    }

    #[test]
    fn gridpoint_url_embeds_cell() {
        let url = client().gridpoint_url(&GridCell::new("OKX", 30, 80));
        assert_eq!(url, "https://api.weather.gov/gridpoints/OKX/30,80");
    }

    #[test]
    fn point_response_parses_nested_properties() {
        let json = r#"{
            "id": "https://api.weather.gov/points/40.7,-74",
            "properties": {
                "gridId": "OKX",
                "gridX": 30,
                "gridY": 80,
                "forecast": "https://api.weather.gov/gridpoints/OKX/30,80/forecast"
            }
        }"#;
        let body: PointResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.properties.grid_id.as_deref(), Some("OKX"));
        assert_eq!(body.properties.grid_x, Some(30));
        assert_eq!(body.properties.grid_y, Some(80));
    }

    #[test]
    fn point_response_with_missing_fields_parses_to_none() {
        let json = r#"{"properties": {"forecast": "something"}}"#;
        let body: PointResponse = serde_json::from_str(json).unwrap();
        assert!(body.properties.grid_id.is_none());
        assert!(body.properties.grid_x.is_none());
    }

    #[test]
    fn gridpoint_response_parses_series_and_uom() {
        let json = r#"{
            "properties": {
                "gridId": "OKX",
                "updateTime": "2024-01-15T12:34:56+00:00",
                "windSpeed": {
                    "uom": "km/h",
                    "values": [
                        {"validTime": "2024-01-15T12:00:00+00:00/PT1H", "value": 5.0},
                        {"validTime": "2024-01-15T13:00:00+00:00/PT1H", "value": 7.0}
                    ]
                },
                "windDirection": {"uom": "degree (angle)", "values": []},
                "temperature": {"uom": "degC", "values": [{"validTime": "x", "value": null}]}
            }
        }"#;
        let body: GridpointResponse = serde_json::from_str(json).unwrap();
        let data = body.properties;
        assert_eq!(data.grid_id.as_deref(), Some("OKX"));
        assert!(data.update_time.is_some());
        assert_eq!(data.wind_speed.values.len(), 2);
        assert_eq!(data.wind_speed.uom.as_deref(), Some("km/h"));
        assert_eq!(data.wind_speed.values[0].value, Some(5.0));
        assert_eq!(data.temperature.values[0].value, None);
    }

    #[test]
    fn gridpoint_response_tolerates_absent_series() {
        let json = r#"{"properties": {"gridId": "OKX"}}"#;
        let body: GridpointResponse = serde_json::from_str(json).unwrap();
        assert!(body.properties.wind_speed.values.is_empty());
        assert!(body.properties.update_time.is_none());
    }
}
