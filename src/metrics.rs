//! Prometheus metrics.
//!
//! Served on their own listener ([`Config::metrics_listen_addr`][crate::config::Config]) next to
//! a small landing page.
//!
//! # Metrics
//!
//! - `porkbun_webhook_requests_total{handler,status}`: webhook requests by handler and outcome.
//! - `porkbun_webhook_registrar_calls_total{operation,outcome}`: Porkbun API calls by operation
//!   and outcome.
//! - `porkbun_webhook_build_info{version}`: always 1, labelled with the crate version.

use crate::config::SharedConfig;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{CounterVec, Encoder, IntGaugeVec, Opts, Registry, TextEncoder};
use std::future::Future;

const METRICS_NAMESPACE: &str = "porkbun_webhook";

lazy_static! {
    pub static ref METRICS_REGISTRY: Registry = Registry::new();
    static ref REQUESTS_TOTAL: CounterVec = register_counter(
        "requests_total",
        "Webhook requests by handler and outcome",
        &["handler", "status"],
    );
    static ref REGISTRAR_CALLS_TOTAL: CounterVec = register_counter(
        "registrar_calls_total",
        "Porkbun API calls by operation and outcome",
        &["operation", "outcome"],
    );
    static ref BUILD_INFO: IntGaugeVec = register_build_info();
}

fn register<C: Collector + Clone + 'static>(collector: C) -> C {
    let boxed = Box::new(collector.clone());
    METRICS_REGISTRY.register(boxed).unwrap();
    collector
}

fn register_counter(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let opts = Opts::new(name, help).namespace(METRICS_NAMESPACE);
    register(CounterVec::new(opts, labels).unwrap())
}

fn register_build_info() -> IntGaugeVec {
    let opts = Opts::new("build_info", "Version of the running webhook, always 1")
        .namespace(METRICS_NAMESPACE);
    let gauge = register(IntGaugeVec::new(opts, &["version"]).unwrap());
    gauge.with_label_values(&[env!("CARGO_PKG_VERSION")]).set(1);
    gauge
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "success"
    } else {
        "error"
    }
}

pub fn record_request(handler: &str, ok: bool) {
    REQUESTS_TOTAL
        .with_label_values(&[handler, outcome(ok)])
        .inc();
}

pub fn record_registrar_call(operation: &str, ok: bool) {
    REGISTRAR_CALLS_TOTAL
        .with_label_values(&[operation, outcome(ok)])
        .inc();
}

/// Render every registered metric in the Prometheus text format.
pub fn gather() -> String {
    lazy_static::initialize(&BUILD_INFO);
    let mut buffer = Vec::new();
    if let Err(err) = TextEncoder::new().encode(&METRICS_REGISTRY.gather(), &mut buffer) {
        tracing::error!("failed to encode metrics: {err}");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/metrics", get(metrics))
}

pub fn new(config: &SharedConfig) -> impl Future<Output = hyper::Result<()>> {
    axum::Server::bind(&config.metrics_listen_addr).serve(router().into_make_service())
}

#[allow(clippy::unused_async)]
async fn metrics() -> impl IntoResponse {
    ([(CONTENT_TYPE, TextEncoder::new().format_type().to_string())], gather())
}

#[allow(clippy::unused_async)]
async fn landing_page() -> Html<&'static str> {
    Html(concat!(
        "<html><head><title>porkbun-webhook</title></head><body>",
        "<h1>porkbun-webhook</h1>",
        "<p>external-dns webhook provider for Porkbun (version ",
        env!("CARGO_PKG_VERSION"),
        ")</p>",
        "<ul><li><a href=\"/metrics\">Metrics</a></li></ul>",
        "</body></html>",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        record_request("records", true);
        record_registrar_call("ping", false);
        let text = gather();
        assert!(text.contains("porkbun_webhook_requests_total"));
        assert!(text.contains("handler=\"records\""));
        assert!(text.contains("porkbun_webhook_registrar_calls_total"));
    }

    #[test]
    fn build_info_carries_the_version() {
        let text = gather();
        let expected = format!(
            "porkbun_webhook_build_info{{version=\"{}\"}} 1",
            env!("CARGO_PKG_VERSION")
        );
        assert!(text.contains(&expected), "{text}");
    }
}
