use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{FetchError, truncate_body},
    model::{Location, WeatherResult},
};

use super::WeatherFetcher;

/// Current weather from the OpenWeather `/weather` endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherFetcher {
    url: String,
    api_key: String,
    lang: String,
    http: Client,
}

impl OpenWeatherFetcher {
    pub fn new(http: Client, url: &str, api_key: String, lang: String) -> Self {
        Self { url: url.to_string(), api_key, lang, http }
    }
}

// Every field is optional upstream; missing ones degrade to empty strings.
#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    #[serde(default)]
    temp: Option<serde_json::Number>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    description: Option<String>,
}

impl From<OwCurrentResponse> for WeatherResult {
    fn from(parsed: OwCurrentResponse) -> Self {
        let temp = parsed.main.and_then(|m| m.temp);
        if temp.is_none() {
            tracing::warn!("OpenWeather response has no main.temp");
        }

        let conditions = parsed
            .weather
            .into_iter()
            .next()
            .and_then(|w| w.description)
            .unwrap_or_default();

        WeatherResult {
            city: parsed.name.unwrap_or_default(),
            temp: temp.map(|t| signed_temp(&t.to_string())).unwrap_or_default(),
            conditions,
        }
    }
}

/// Prefix `+` unless the value already carries a minus sign.
pub fn signed_temp(raw: &str) -> String {
    if raw.starts_with('-') { raw.to_string() } else { format!("+{raw}") }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherFetcher {
    async fn fetch(&self, location: &Location) -> Result<WeatherResult, FetchError> {
        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("lat", location.latitude.as_str()),
                ("lon", location.longitude.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", self.lang.as_str()),
            ])
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = res.status();
        let body = res.text().await.map_err(FetchError::Transport)?;

        tracing::info!(%status, "openweathermap response");

        if !status.is_success() {
            return Err(FetchError::Status { status, body: truncate_body(&body) });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|source| FetchError::Payload { body: truncate_body(&body), source })?;

        Ok(parsed.into())
    }
}
