use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use axum::routing::get;

use crate::pipeline::{Health, Pipeline};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const INDEX_HTML: &str = r#"<h1>Satisfactory Metrics Server</h1>
<hr>
<p><a href="/metrics">Prometheus Metrics</a></p>
<p><a href="/health">Health Check</a></p>
"#;

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(pipeline)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn metrics(State(pipeline): State<Arc<Pipeline>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        pipeline.registry().render(),
    )
}

async fn health(State(pipeline): State<Arc<Pipeline>>) -> (StatusCode, String) {
    match pipeline.health() {
        Health::Healthy { at } => {
            let source = pipeline
                .snapshot()
                .map(|snapshot| format!(" from {}", snapshot.source.display()))
                .unwrap_or_default();
            (
                StatusCode::OK,
                format!("healthy: last refresh at {}{source}\n", at.to_rfc3339()),
            )
        }
        Health::Starting => (
            StatusCode::SERVICE_UNAVAILABLE,
            "starting: no successful refresh yet\n".into(),
        ),
        Health::Failing { error, failures } => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("unhealthy after {failures} failed refresh(es): {error}\n"),
        ),
    }
}
