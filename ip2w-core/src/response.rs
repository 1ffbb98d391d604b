//! Turns the outcome of a request into status, headers and a JSON body.

use reqwest::StatusCode;
use serde::Serialize;

use crate::{
    error::HandlerError,
    model::{ErrorBody, WeatherResult},
};

pub const CONTENT_TYPE: &str = "application/json";

/// A fully encoded HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl Response {
    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    /// Byte length of the encoded body.
    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}

pub fn build(outcome: &Result<WeatherResult, HandlerError>) -> Response {
    match outcome {
        Ok(weather) => encode(StatusCode::OK, weather),
        Err(err) => {
            let status = err.status();
            let body = ErrorBody { reason: err.reason().to_string(), status: status.as_u16() };
            encode(status, &body)
        }
    }
}

fn encode<T: Serialize>(status: StatusCode, body: &T) -> Response {
    // serde_json writes non-ASCII characters as literal UTF-8.
    match serde_json::to_vec(body) {
        Ok(body) => Response { status, body },
        Err(err) => {
            tracing::error!(error = ?err, "failed to encode response body");
            Response {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: br#"{"reason":"internal error","status":500}"#.to_vec(),
            }
        }
    }
}
