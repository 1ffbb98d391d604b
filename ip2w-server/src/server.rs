use anyhow::Context;
use axum::{
    Router,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use ip2w_core::Handler;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;

/// Every method and path goes to the handler; it rejects bad paths itself.
pub fn router(handler: Arc<Handler>) -> Router {
    Router::new().fallback(handle).with_state(handler)
}

async fn handle(State(handler): State<Arc<Handler>>, req: Request) -> Response {
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let request = ip2w_core::Request { path: Some(req.uri().path().to_string()), remote_addr };

    into_response(handler.handle(&request).await)
}

fn into_response(response: ip2w_core::Response) -> Response {
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(response.content_type())),
        (header::CONTENT_LENGTH, HeaderValue::from(response.content_length())),
    ];
    (response.status, headers, response.body).into_response()
}

pub async fn serve(handler: Arc<Handler>, bind: SocketAddr) -> anyhow::Result<()> {
    if !handler.is_configured() {
        tracing::warn!("serving without a usable configuration; all requests will fail with 500");
    }

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(handler).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("got SIGINT, shutting down"),
        Err(err) => tracing::error!(error = ?err, "could not listen for SIGINT"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::StatusCode;
    use ip2w_core::{Config, ConfigError};
    use tower::ServiceExt;

    fn configured_handler() -> Arc<Handler> {
        let mut cfg = Config::default();
        cfg.tokens.ipinfo_token = "TOKEN".into();
        cfg.tokens.openweathermap_apikey = "KEY".into();
        // Unreachable upstreams; these tests never get past path parsing.
        cfg.upstream.ipinfo_url = "http://127.0.0.1:9".into();
        cfg.upstream.openweather_url = "http://127.0.0.1:9/weather".into();
        Arc::new(Handler::from_config(Ok(&cfg)))
    }

    async fn call(
        handler: Arc<Handler>,
        method: &str,
        uri: &str,
    ) -> (StatusCode, String, String, String) {
        let req = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let res = router(handler).oneshot(req).await.unwrap();

        let status = res.status();
        let content_type = res.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        let content_length = res.headers()[header::CONTENT_LENGTH].to_str().unwrap().to_string();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();

        assert_eq!(content_length, body.len().to_string());
        (status, content_type, content_length, body)
    }

    #[tokio::test]
    async fn malformed_path_is_400_json() {
        let (status, content_type, _, body) = call(configured_handler(), "GET", "/ip2w/abc").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type, "application/json");
        assert_eq!(body, r#"{"reason":"can't get ip address from request","status":400}"#);
    }

    #[tokio::test]
    async fn any_method_and_path_reaches_the_handler() {
        let (status, _, _, _) = call(configured_handler(), "POST", "/somewhere/else").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn misconfigured_server_answers_500() {
        let handler = Arc::new(Handler::misconfigured(ConfigError::NoConfigDir));
        let (status, _, _, body) = call(handler, "GET", "/ip2w/8.8.8.8").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"reason":"can't finish app configuration","status":500}"#);
    }
}
