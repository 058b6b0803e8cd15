//! Logging setup plus the health and metrics listeners.
//!
//! The two listeners run on their own tasks so they keep answering while a
//! sweep is blocked on a slow HipChat call.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use metrics_process::Collector;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hipchat_janitor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Install the global Prometheus recorder behind the `metrics` macros
pub fn install_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Collector::default().describe();
    Ok(handle)
}

/// State behind `/metrics`: process counters are sampled on every scrape
#[derive(Clone)]
struct MetricsState {
    handle: PrometheusHandle,
    collector: Collector,
}

pub fn health_router() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
}

pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(MetricsState {
            handle,
            collector: Collector::default(),
        })
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn render_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    state.collector.collect();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}

pub async fn bind(name: &str, addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {} listener on {}", name, addr))
}

/// Serve `app` on its own task. The task only finishes when the server has
/// stopped, and then always with an error.
pub fn spawn_server(name: &'static str, listener: TcpListener, app: Router) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Serving {} on {}", name, addr);
        }

        match axum::serve(listener, app).await {
            Ok(()) => Err(anyhow::anyhow!("{} server stopped", name)),
            Err(e) => Err(anyhow::Error::new(e).context(format!("{} server failed", name))),
        }
    })
}
