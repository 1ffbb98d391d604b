use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, header::ACCEPT};
use serde::Deserialize;
use std::sync::LazyLock;

use crate::{
    error::{ResolveError, truncate_body},
    model::Location,
};

use super::LocationResolver;

static LOC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?[0-9]+\.?[0-9]*),(-?[0-9]+\.?[0-9]*)$").expect("valid loc regex")
});

/// Geolocation via the ipinfo.io details API.
#[derive(Debug, Clone)]
pub struct IpinfoResolver {
    base_url: String,
    token: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpinfoDetails {
    loc: Option<String>,
}

impl IpinfoResolver {
    pub fn new(http: Client, base_url: &str, token: String) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), token, http }
    }

    fn details_url(&self, ip: Option<&str>) -> String {
        match ip {
            Some(ip) => format!("{}/{}/json", self.base_url, ip),
            None => format!("{}/json", self.base_url),
        }
    }
}

/// Split a `loc` value such as "-6.2146,106.8451" into its two halves.
pub fn parse_loc(loc: &str) -> Option<Location> {
    let caps = LOC.captures(loc)?;
    Some(Location { latitude: caps[1].to_string(), longitude: caps[2].to_string() })
}

#[async_trait]
impl LocationResolver for IpinfoResolver {
    async fn resolve(&self, ip: Option<&str>) -> Result<Location, ResolveError> {
        let res = self
            .http
            .get(self.details_url(ip))
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(ResolveError::Transport)?;

        let status = res.status();
        let body = res.text().await.map_err(ResolveError::Transport)?;

        if !status.is_success() {
            return Err(ResolveError::Status { status, body: truncate_body(&body) });
        }

        let details: IpinfoDetails = serde_json::from_str(&body)
            .map_err(|source| ResolveError::Payload { body: truncate_body(&body), source })?;

        tracing::debug!(ip = ?ip, loc = ?details.loc, "ipinfo response");

        details
            .loc
            .as_deref()
            .and_then(parse_loc)
            .ok_or_else(|| ResolveError::BadLocationFormat { raw: truncate_body(&body) })
    }
}
