//! Core library for the `ip2w` service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Request path parsing
//! - Location (ipinfo) and weather (OpenWeather) providers
//! - Response encoding and the request handler tying them together
//!
//! It is used by `ip2w-server`, but the [`Handler`] can be hosted by any
//! HTTP stack that can hand it a path and a remote address.

pub mod config;
pub mod error;
pub mod handler;
pub mod model;
pub mod path;
pub mod provider;
pub mod response;

pub use config::{Config, Credentials};
pub use error::{ConfigError, FetchError, HandlerError, ParseError, ResolveError};
pub use handler::Handler;
pub use model::{ErrorBody, Location, Request, WeatherResult};
pub use provider::{LocationResolver, WeatherFetcher};
pub use response::Response;
