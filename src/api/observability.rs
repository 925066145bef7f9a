//! Request spans, HTTP metrics and response hardening.

use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{sync::Arc, time::Instant};
use tracing::{Span, field::Empty, info, info_span};
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::AssetId;

/// Coarse grouping of routes, used as a metrics label and a span field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Auth,
    Catalog,
    Lending,
    Ledger,
    Events,
    System,
}

impl Area {
    #[must_use]
    pub fn of(route: &str) -> Self {
        let route = route.strip_prefix("/api").unwrap_or(route);
        match route {
            "/register" | "/login" | "/logout" => Self::Auth,
            r if r.starts_with("/me") => Self::Auth,
            r if r.starts_with("/assets") => Self::Catalog,
            r if r.starts_with("/borrow")
                || r.starts_with("/return")
                || r.starts_with("/log_asset")
                || r.starts_with("/dashboard") =>
            {
                Self::Lending
            }
            r if r.starts_with("/transactions") => Self::Ledger,
            "/events" => Self::Events,
            _ => Self::System,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Catalog => "catalog",
            Self::Lending => "lending",
            Self::Ledger => "ledger",
            Self::Events => "events",
            Self::System => "system",
        }
    }
}

fn route_of(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map_or_else(|| req.uri().path().to_string(), |mp| mp.as_str().to_string())
}

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Span for the `TraceLayer`. `user_id` is filled by the auth middleware and
/// `asset_id` by the lending handlers.
pub fn request_span(req: &Request) -> Span {
    let route = route_of(req);
    info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %req.method(),
        route = %route,
        area = Area::of(&route).as_str(),
        user_id = Empty,
        asset_id = Empty,
    )
}

/// Tags the current request span with the asset being acted on.
pub fn record_asset(asset_id: AssetId) {
    Span::current().record("asset_id", asset_id.value());
}

/// Records HTTP metrics by route and area, then logs one event per request.
/// Runs inside the span opened by [`request_span`].
pub async fn track_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = route_of(&req);
    let area = Area::of(&route);

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    let status = response.status();

    let labels = [
        ("method", method),
        ("route", route),
        ("area", area.as_str().to_string()),
        ("status", status.as_u16().to_string()),
    ];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels).record(elapsed.as_secs_f64());

    let outcome = if status.is_server_error() {
        "error"
    } else if status == axum::http::StatusCode::CONFLICT && area == Area::Lending {
        "lending_conflict"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "success"
    };

    info!(
        event = "http_request_finished",
        duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        status_code = status.as_u16(),
        outcome,
        "Request finished"
    );

    response
}

/// The API only serves JSON and SSE, so nothing may be framed or loaded.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in [
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("referrer-policy", "no-referrer"),
        ("cache-control", "no-store"),
        (
            "content-security-policy",
            "default-src 'none'; frame-ancestors 'none'; base-uri 'none'",
        ),
    ] {
        headers.insert(name, HeaderValue::from_static(value));
    }

    response
}
