//! Bus Tracker API client.
//!
//! The `get_*` methods are the consumer-facing calls: any failure is logged
//! and collapses to `None`. The matching `try_*` methods return the error.

use reqwest::Url;
use serde_json::Value;
use tracing::{error, info};

use crate::config::BusTrackerConfig;
use crate::envelope;
use crate::error::{BusTrackerError, ErrorKind, Result};
use crate::fetch::{BasicClient, HttpClient, UrlParam, fetch_text};
use crate::records::{Route, Stop, Table, Vehicle};
use crate::xml;

/// One of the three supported API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Routes,
    Vehicles,
    Stops,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Routes => "getroutes",
            Endpoint::Vehicles => "getvehicles",
            Endpoint::Stops => "getstops",
        }
    }

    /// Envelope key holding the records. The JSON encoding pluralizes some.
    pub fn record_key(self, format: Format) -> &'static str {
        match (self, format) {
            (Endpoint::Routes, Format::Json) => "routes",
            (Endpoint::Routes, Format::Xml) => "route",
            (Endpoint::Vehicles, _) => "vehicle",
            (Endpoint::Stops, Format::Json) => "stops",
            (Endpoint::Stops, Format::Xml) => "stop",
        }
    }
}

/// Response encoding. XML is what the API returns without a `format` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    fn query_value(self) -> Option<&'static str> {
        match self {
            Format::Json => Some("json"),
            Format::Xml => None,
        }
    }

    fn parse(self, body: &str) -> Result<Value> {
        match self {
            Format::Json => Ok(serde_json::from_str(body)?),
            Format::Xml => xml::to_value(body),
        }
    }
}

pub struct BusTracker<C = BasicClient> {
    http: C,
    config: BusTrackerConfig,
}

impl BusTracker<BasicClient> {
    pub fn new(config: BusTrackerConfig) -> Self {
        Self::with_client(BasicClient::new(), config)
    }
}

impl<C: HttpClient> BusTracker<C> {
    pub fn with_client(http: C, config: BusTrackerConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &BusTrackerConfig {
        &self.config
    }

    /// Fetches one endpoint and normalizes its records into a [`Table`].
    #[tracing::instrument(skip_all, fields(endpoint = endpoint.path(), format = ?format))]
    pub async fn fetch_table(
        &self,
        endpoint: Endpoint,
        format: Format,
        api_key: &str,
        params: &[(&str, &str)],
    ) -> Result<Table> {
        let url = self.endpoint_url(endpoint, format, params)?;
        let client = UrlParam::api_key(&self.http, api_key);

        let body = fetch_text(&client, url).await?;
        let tree = format.parse(&body)?;
        let envelope = envelope::unwrap_root(&tree)?;
        let table = envelope::normalize_table(envelope, endpoint.record_key(format))?;

        info!(rows = table.len(), columns = table.columns.len(), "Response normalized");
        Ok(table)
    }

    fn endpoint_url(&self, endpoint: Endpoint, format: Format, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .config
            .base_url
            .join(endpoint.path())
            .map_err(|e| BusTrackerError::InvalidUrl(format!("{}: {e}", endpoint.path())))?;

        let format_param = format.query_value().map(|f| ("format", f));
        let pairs: Vec<(&str, &str)> = params.iter().copied().chain(format_param).collect();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// All routes as JSON, using the configured key.
    pub async fn try_get_routes(&self) -> Result<Vec<Route>> {
        let key = self.config.api_key()?;
        self.fetch_table(Endpoint::Routes, Format::Json, key, &[])
            .await?
            .typed()
    }

    pub async fn get_routes(&self) -> Option<Vec<Route>> {
        absent_on_error("routes", self.try_get_routes().await)
    }

    /// Current positions for `vehicle_ids`, as JSON with second-resolution timestamps.
    pub async fn try_get_vehicles<S: AsRef<str>>(&self, vehicle_ids: &[S]) -> Result<Vec<Vehicle>> {
        let key = self.config.api_key()?;
        let vid = vehicle_ids
            .iter()
            .map(|v| v.as_ref().trim())
            .collect::<Vec<_>>()
            .join(",");
        self.fetch_table(
            Endpoint::Vehicles,
            Format::Json,
            key,
            &[("vid", vid.as_str()), ("tmres", "s")],
        )
        .await?
        .typed()
    }

    pub async fn get_vehicles<S: AsRef<str>>(&self, vehicle_ids: &[S]) -> Option<Vec<Vehicle>> {
        absent_on_error("vehicles", self.try_get_vehicles(vehicle_ids).await)
    }

    /// All routes as XML, using `api_key` instead of the configured key.
    pub async fn try_get_routes_with_key(&self, api_key: &str) -> Result<Vec<Route>> {
        self.fetch_table(Endpoint::Routes, Format::Xml, api_key, &[])
            .await?
            .typed()
    }

    pub async fn get_routes_with_key(&self, api_key: &str) -> Option<Vec<Route>> {
        absent_on_error("routes", self.try_get_routes_with_key(api_key).await)
    }

    /// Stops served by `route` in `direction` (e.g. `Northbound`), as XML.
    pub async fn try_get_stops_with_key(
        &self,
        api_key: &str,
        route: &str,
        direction: &str,
    ) -> Result<Vec<Stop>> {
        self.fetch_table(
            Endpoint::Stops,
            Format::Xml,
            api_key,
            &[("rt", route), ("dir", direction)],
        )
        .await?
        .typed()
    }

    pub async fn get_stops_with_key(
        &self,
        api_key: &str,
        route: &str,
        direction: &str,
    ) -> Option<Vec<Stop>> {
        absent_on_error(
            "stops",
            self.try_get_stops_with_key(api_key, route, direction).await,
        )
    }
}

fn absent_on_error<T>(operation: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            match e.kind() {
                ErrorKind::Transport => error!(operation, error = %e, "Bus Tracker request failed"),
                ErrorKind::UpstreamData => {
                    error!(operation, error = %e, "Bus Tracker returned unusable data")
                }
                ErrorKind::Config => error!(operation, error = %e, "Bus Tracker client not configured"),
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> BusTracker {
        let config = BusTrackerConfig::new(None, "https://example.test/bustime/api/v3").unwrap();
        BusTracker::new(config)
    }

    #[test]
    fn test_record_keys() {
        assert_eq!(Endpoint::Routes.record_key(Format::Json), "routes");
        assert_eq!(Endpoint::Routes.record_key(Format::Xml), "route");
        assert_eq!(Endpoint::Vehicles.record_key(Format::Json), "vehicle");
        assert_eq!(Endpoint::Vehicles.record_key(Format::Xml), "vehicle");
        assert_eq!(Endpoint::Stops.record_key(Format::Xml), "stop");
    }

    #[test]
    fn test_endpoint_url_json_adds_format() {
        let url = tracker()
            .endpoint_url(Endpoint::Vehicles, Format::Json, &[("vid", "1,2"), ("tmres", "s")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/bustime/api/v3/getvehicles?vid=1%2C2&tmres=s&format=json"
        );
    }

    #[test]
    fn test_endpoint_url_xml_without_params_has_no_query() {
        let url = tracker()
            .endpoint_url(Endpoint::Routes, Format::Xml, &[])
            .unwrap();
        assert_eq!(url.as_str(), "https://example.test/bustime/api/v3/getroutes");
    }

    #[test]
    fn test_absent_on_error() {
        let ok: Result<u8> = Ok(3);
        assert_eq!(absent_on_error("test", ok), Some(3));
        let err: Result<u8> = Err(BusTrackerError::Config("missing".to_string()));
        assert_eq!(absent_on_error("test", err), None);
    }

    #[tokio::test]
    async fn test_missing_configured_key_is_absent() {
        assert!(tracker().get_routes().await.is_none());
        assert!(tracker().get_vehicles(&["1934"]).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_configured_key_is_config_error() {
        let err = tracker().try_get_routes().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
