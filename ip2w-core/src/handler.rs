//! Request orchestration: parse the path, resolve the location, fetch the
//! weather, and encode the outcome. Each step short-circuits on failure.

use std::{net::IpAddr, sync::Arc};

use crate::{
    config::Config,
    error::{ConfigError, HandlerError},
    model::{Request, WeatherResult},
    path,
    provider::{LocationResolver, WeatherFetcher, providers_from_config},
    response::{self, Response},
};

#[derive(Debug)]
struct Pipeline {
    resolver: Box<dyn LocationResolver>,
    fetcher: Box<dyn WeatherFetcher>,
}

/// Immutable per-process handler; safe to share between concurrent requests.
#[derive(Debug)]
pub struct Handler {
    pipeline: Result<Pipeline, Arc<ConfigError>>,
}

impl Handler {
    pub fn new(resolver: Box<dyn LocationResolver>, fetcher: Box<dyn WeatherFetcher>) -> Self {
        Self { pipeline: Ok(Pipeline { resolver, fetcher }) }
    }

    /// A handler that answers every request with a configuration error.
    pub fn misconfigured(err: ConfigError) -> Self {
        Self { pipeline: Err(Arc::new(err)) }
    }

    /// Build from a config load result; configuration failures are kept and
    /// reported per request instead of aborting the process.
    pub fn from_config(config: Result<&Config, ConfigError>) -> Self {
        match config.and_then(providers_from_config) {
            Ok((resolver, fetcher)) => Self::new(resolver, fetcher),
            Err(err) => {
                tracing::error!(error = ?err, "can't finish app configuration");
                Self::misconfigured(err)
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.pipeline.is_ok()
    }

    pub async fn handle(&self, request: &Request) -> Response {
        let outcome = self.run(request).await;
        if let Err(err) = &outcome {
            tracing::error!(error = ?err, status = err.status().as_u16(), "{}", err.reason());
        }
        response::build(&outcome)
    }

    async fn run(&self, request: &Request) -> Result<WeatherResult, HandlerError> {
        let pipeline = self.pipeline.as_ref().map_err(Arc::clone)?;

        let ip = path::parse(request.path.as_deref())?
            .or_else(|| request.remote_addr.filter(is_public).map(|addr| addr.to_string()));
        tracing::debug!(ip = ?ip, "got IP address from request");

        let location = pipeline.resolver.resolve(ip.as_deref()).await?;
        tracing::debug!(?location, "got location from IP address");

        let weather = pipeline.fetcher.fetch(&location).await?;
        tracing::debug!(?weather, "got weather info");

        Ok(weather)
    }
}

/// Whether the geolocation service can say anything useful about `addr`.
fn is_public(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_multicast())
        }
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public(&IpAddr::V4(v4)),
            None => {
                let unique_local = (v6.segments()[0] & 0xfe00) == 0xfc00;
                let link_local = (v6.segments()[0] & 0xffc0) == 0xfe80;
                !(v6.is_loopback()
                    || v6.is_unspecified()
                    || v6.is_multicast()
                    || unique_local
                    || link_local)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{FetchError, ResolveError},
        model::Location,
    };
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeResolver {
        fail: bool,
        seen: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl LocationResolver for FakeResolver {
        async fn resolve(&self, ip: Option<&str>) -> Result<Location, ResolveError> {
            self.seen.lock().unwrap().push(ip.map(str::to_string));
            if self.fail {
                return Err(ResolveError::BadLocationFormat { raw: "{}".into() });
            }
            Ok(Location { latitude: "-6.2146".into(), longitude: "106.8451".into() })
        }
    }

    #[derive(Debug, Default)]
    struct FakeFetcher {
        fail: bool,
    }

    #[async_trait]
    impl WeatherFetcher for FakeFetcher {
        async fn fetch(&self, location: &Location) -> Result<WeatherResult, FetchError> {
            if self.fail {
                return Err(FetchError::Status {
                    status: StatusCode::UNAUTHORIZED,
                    body: String::new(),
                });
            }
            Ok(WeatherResult {
                city: format!("{},{}", location.latitude, location.longitude),
                temp: "+1".into(),
                conditions: "ясно".into(),
            })
        }
    }

    fn handler(resolver: FakeResolver, fetcher: FakeFetcher) -> Handler {
        Handler::new(Box::new(resolver), Box::new(fetcher))
    }

    #[tokio::test]
    async fn success_returns_weather() {
        let h = handler(FakeResolver::default(), FakeFetcher::default());
        let response = h.handle(&Request::new("/ip2w/1.2.3.4")).await;

        assert_eq!(response.status, StatusCode::OK);
        let body: WeatherResult = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body.city, "-6.2146,106.8451");
    }

    #[tokio::test]
    async fn bad_path_short_circuits_before_upstreams() {
        let resolver = Arc::new(FakeResolver::default());
        let h = Handler::new(
            Box::new(SharedResolver(resolver.clone())),
            Box::new(FakeFetcher::default()),
        );

        let response = h.handle(&Request::new("/ip2w/abc")).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let response = h.handle(&Request::default()).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        assert!(resolver.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failures_map_to_503() {
        let h = handler(FakeResolver { fail: true, ..Default::default() }, FakeFetcher::default());
        let response = h.handle(&Request::new("/ip2w/")).await;
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.body,
            br#"{"reason":"can't get location by IP","status":503}"#.to_vec()
        );

        let h = handler(FakeResolver::default(), FakeFetcher { fail: true });
        let response = h.handle(&Request::new("/ip2w/")).await;
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.body,
            br#"{"reason":"can't get weather info by location","status":503}"#.to_vec()
        );
    }

    #[tokio::test]
    async fn misconfigured_handler_answers_500() {
        let h = Handler::misconfigured(ConfigError::MissingToken("ipinfo_token"));
        assert!(!h.is_configured());

        let response = h.handle(&Request::new("/ip2w/1.2.3.4")).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body,
            br#"{"reason":"can't finish app configuration","status":500}"#.to_vec()
        );
    }

    #[tokio::test]
    async fn remote_addr_fills_in_only_when_public() {
        let resolver = Arc::new(FakeResolver::default());
        let h = Handler::new(
            Box::new(SharedResolver(resolver.clone())),
            Box::new(FakeFetcher::default()),
        );

        let public: IpAddr = "81.2.69.142".parse().unwrap();
        let private: IpAddr = "192.168.1.10".parse().unwrap();

        h.handle(&Request::new("/ip2w/").with_remote_addr(public)).await;
        h.handle(&Request::new("/ip2w/").with_remote_addr(private)).await;
        h.handle(&Request::new("/ip2w/1.2.3.4").with_remote_addr(public)).await;

        let seen = resolver.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![Some("81.2.69.142".to_string()), None, Some("1.2.3.4".to_string())]
        );
    }

    #[derive(Debug)]
    struct SharedResolver(Arc<FakeResolver>);

    #[async_trait]
    impl LocationResolver for SharedResolver {
        async fn resolve(&self, ip: Option<&str>) -> Result<Location, ResolveError> {
            self.0.resolve(ip).await
        }
    }

    #[test]
    fn is_public_filters_local_ranges() {
        for addr in [
            "127.0.0.1",
            "10.0.0.1",
            "172.16.5.4",
            "169.254.0.1",
            "0.0.0.0",
            "::1",
            "fe80::1",
            "fd00::1",
            "::ffff:10.0.0.1",
        ] {
            let addr: IpAddr = addr.parse().unwrap();
            assert!(!is_public(&addr), "{addr} should not be public");
        }
        for addr in ["8.8.8.8", "2a00:1450:4001:80b::200e", "::ffff:8.8.8.8"] {
            let addr: IpAddr = addr.parse().unwrap();
            assert!(is_public(&addr), "{addr} should be public");
        }
    }
}
