use super::routes::Route;
use super::service::QueryService;

use axum::Router;
use axum::extract::{OriginalUri, Query, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::any::Any;
use std::collections::HashMap;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

const NOT_FOUND_BODY: &str = "Route not found\n";
const SERVER_ERROR_BODY: &str = "Server error\n";
const CACHEABLE: &str = "public, max-age=3600";

/// Builds the HTTP app. Every path goes through `dispatch`.
pub fn router(service: QueryService) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn dispatch(State(service): State<QueryService>, OriginalUri(uri): OriginalUri) -> Response {
    let Some(route) = Route::from_path(uri.path()) else {
        return not_found();
    };

    // A query string that does not parse is treated as empty.
    let params = Query::<HashMap<String, String>>::try_from_uri(&uri)
        .map(|Query(params)| params)
        .unwrap_or_default();

    match handle(route, &service, &params).await {
        Ok(body) => json_response(route, body),
        Err(e) => {
            tracing::error!("Error processing request {}: {:#}", uri, e);
            server_error()
        }
    }
}

async fn handle(
    route: Route,
    service: &QueryService,
    params: &HashMap<String, String>,
) -> anyhow::Result<String> {
    let body = match route {
        Route::Search => {
            let query = params.get("query").map(String::as_str).unwrap_or("");
            let limit = params.get("limit").and_then(|value| parse_limit(value));
            serde_json::to_string(&service.search(query, limit).await)?
        }
        Route::Update => serde_json::to_string(&service.refresh().await)?,
        Route::Total => serde_json::to_string(&service.total().await)?,
        Route::Browse => serde_json::to_string(&service.browse().await)?,
    };
    Ok(body)
}

/// Reads the leading decimal digits of `value`, so `"10abc"` is 10 and `"lots"` is `None`.
fn parse_limit(value: &str) -> Option<usize> {
    let trimmed = value.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

fn json_response(route: Route, body: String) -> Response {
    let mut response = (StatusCode::OK, format!("{}\n", body)).into_response();
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if !route.is_volatile() {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHEABLE));
    }
    response
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY).into_response()
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!("Request handler panicked: {}", detail);
    server_error()
}
