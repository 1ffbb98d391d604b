use crate::{
    config::{Config, Credentials},
    error::{ConfigError, FetchError, ResolveError},
    model::{Location, WeatherResult},
    provider::{ipinfo::IpinfoResolver, openweather::OpenWeatherFetcher},
};
use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;

pub mod ipinfo;
pub mod openweather;

/// Maps an IP address to coordinates.
#[async_trait]
pub trait LocationResolver: Send + Sync + Debug {
    /// `None` asks the service for the location of the caller's own address.
    async fn resolve(&self, ip: Option<&str>) -> Result<Location, ResolveError>;
}

/// Current conditions at a pair of coordinates.
#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    async fn fetch(&self, location: &Location) -> Result<WeatherResult, FetchError>;
}

/// Build the HTTP client shared by both upstream providers.
pub fn http_client(config: &Config) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(config.upstream.timeout())
        .user_agent(concat!("ip2w/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ConfigError::Client)
}

/// Construct both providers from config.
pub fn providers_from_config(
    config: &Config,
) -> Result<(Box<dyn LocationResolver>, Box<dyn WeatherFetcher>), ConfigError> {
    let Credentials { ipinfo_token, openweathermap_apikey } = config.credentials()?;
    let http = http_client(config)?;

    let resolver = IpinfoResolver::new(http.clone(), &config.upstream.ipinfo_url, ipinfo_token);
    let fetcher = OpenWeatherFetcher::new(
        http,
        &config.upstream.openweather_url,
        openweathermap_apikey,
        config.upstream.lang.clone(),
    );

    Ok((Box::new(resolver), Box::new(fetcher)))
}
