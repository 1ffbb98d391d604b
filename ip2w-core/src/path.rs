//! Extracts the optional IPv4 address from an `/ip2w/` request path.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::ParseError;

// Syntactic dotted-quad only; octets above 255 are accepted.
static IP2W_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/ip2w/((?:[0-9]{1,3}\.){3}[0-9]{1,3})?$").expect("valid path regex")
});

/// Parse `/ip2w/` (no address) or `/ip2w/<a.b.c.d>`.
pub fn parse(path: Option<&str>) -> Result<Option<String>, ParseError> {
    let path = path.ok_or(ParseError::MissingPath)?;

    let caps = IP2W_PATH
        .captures(path)
        .ok_or_else(|| ParseError::MalformedPath(path.to_string()))?;

    Ok(caps.get(1).map(|m| m.as_str().to_string()))
}
