use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Configuration could not be loaded or is incomplete.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoConfigDir,

    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no value configured for `tokens.{0}`")]
    MissingToken(&'static str),

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("invalid logging configuration: {message}")]
    Logging {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// The inbound path does not carry the `/ip2w/[<ipv4>]` shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no path in request")]
    MissingPath,

    #[error("wrong path: {0}")]
    MalformedPath(String),
}

/// The geolocation lookup failed.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to send request to ipinfo")]
    Transport(#[source] reqwest::Error),

    #[error("ipinfo request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to parse ipinfo JSON: {body}")]
    Payload {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("can't get location info from response: {raw}")]
    BadLocationFormat { raw: String },
}

/// The weather lookup failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to send request to OpenWeather")]
    Transport(#[source] reqwest::Error),

    #[error("OpenWeather request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to parse OpenWeather JSON: {body}")]
    Payload {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Any failure of a single request, one variant per client-visible category.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Config(#[from] std::sync::Arc<ConfigError>),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HandlerError::Parse(_) => StatusCode::BAD_REQUEST,
            HandlerError::Resolve(_) | HandlerError::Fetch(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Fixed message sent to the client; details stay in the logs.
    pub fn reason(&self) -> &'static str {
        match self {
            HandlerError::Config(_) => "can't finish app configuration",
            HandlerError::Parse(_) => "can't get ip address from request",
            HandlerError::Resolve(_) => "can't get location by IP",
            HandlerError::Fetch(_) => "can't get weather info by location",
        }
    }
}

/// Cut an upstream body down to something that fits in a log line.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
