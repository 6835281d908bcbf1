//! Here we expose prometheus metrics about the poll loop
use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Response, StatusCode},
    routing::get,
    Extension, Router,
};
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryEndpointSettings {
    pub bind_address: IpAddr,
    pub port: u16,
}

impl TelemetryEndpointSettings {
    pub fn to_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

async fn metrics_handler(
    Extension(registry): Extension<Registry>,
) -> Result<Response<Body>, StatusCode> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    encoder.encode(&metric_families, &mut buffer).map_err(|err| {
        tracing::warn!("failed to encode metrics: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, encoder.format_type())
        .body(Body::from(buffer))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

fn router(registry: Registry) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .layer(Extension(registry))
}

pub async fn run_telemetry_endpoint(settings: TelemetryEndpointSettings, registry: Registry) -> Result<()> {
    let addr = settings.to_socket_addr();
    tracing::info!("serving metrics on http://{}/metrics", addr);

    axum::Server::try_bind(&addr)
        .with_context(|| format!("failed to bind telemetry endpoint to {}", addr))?
        .serve(router(registry).into_make_service())
        .await
        .context("telemetry endpoint crashed")
}

#[cfg(test)]
mod tests {
    use prometheus::{IntCounter, Opts};

    use super::*;

    #[tokio::test]
    async fn serves_registered_metrics() {
        let registry = Registry::new();
        let counter = IntCounter::with_opts(Opts::new("probe_total", "test counter")).unwrap();
        registry.register(Box::new(counter.clone())).unwrap();
        counter.inc_by(3);

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = axum::Server::from_tcp(listener)
            .unwrap()
            .serve(router(registry).into_make_service());
        tokio::spawn(server);

        let response = reqwest::get(format!("http://{}/metrics", addr)).await.unwrap();
        assert!(response.status().is_success());

        let body = response.text().await.unwrap();
        assert!(body.contains("probe_total 3"));
    }
}
