use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// What the handler needs to know about an inbound request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub path: Option<String>,
    pub remote_addr: Option<IpAddr>,
}

impl Request {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: Some(path.into()), remote_addr: None }
    }

    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }
}

/// Coordinates as returned by the geolocation service, kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub latitude: String,
    pub longitude: String,
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub city: String,
    /// Always carries an explicit sign, e.g. "+31.09" or "-3.5".
    pub temp: String,
    pub conditions: String,
}

/// Error response body; the status is repeated inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub reason: String,
    pub status: u16,
}
