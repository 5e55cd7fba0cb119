//! HTTP routes
//!
//! - `GET /{customer}/{project}/snapshot/{key}/{timestamp}`
//! - `GET /{customer}/{project}/timeseries/{key}?period=&from=&to=`
//! - `GET /metrics`
//!
//! Validation failures map to 400 and backend failures to 500, with a JSON
//! body carrying the error and, where one exists, a hint. A failed request
//! never takes the server down.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::Error;
use crate::metrics::MetricsSnapshot;
use crate::query::QueryOrchestrator;
use crate::shard::SeriesKey;

/// Build the router serving the query endpoints
pub fn router(query: QueryOrchestrator) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/:customer/:project/snapshot/:key/:timestamp", get(snapshot))
        .route("/:customer/:project/timeseries/:key", get(timeseries))
        .with_state(query)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = match self.suggestion() {
            Some(hint) => json!({ "error": self.to_string(), "hint": hint }),
            None => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotPath {
    customer: String,
    project: String,
    key: String,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct SeriesPath {
    customer: String,
    project: String,
    key: String,
}

/// Raw query parameters; a missing one is passed on empty and rejected by
/// the query path
#[derive(Debug, Default, Deserialize)]
struct TimeseriesParams {
    period: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

async fn snapshot(
    State(query): State<QueryOrchestrator>,
    Path(path): Path<SnapshotPath>,
) -> Result<Response, Error> {
    let series = SeriesKey::new(path.customer, path.project, path.key);
    let samples = query.snapshot(&series, &path.timestamp).await?;
    Ok(Json(samples).into_response())
}

async fn timeseries(
    State(query): State<QueryOrchestrator>,
    Path(path): Path<SeriesPath>,
    Query(params): Query<TimeseriesParams>,
) -> Result<Response, Error> {
    let series = SeriesKey::new(path.customer, path.project, path.key);
    let period = params.period.unwrap_or_default();
    let from = params.from.unwrap_or_default();
    let to = params.to.unwrap_or_default();

    let samples = query.run(&series, &period, &from, &to).await?;
    Ok(Json(samples).into_response())
}

async fn metrics(State(query): State<QueryOrchestrator>) -> Json<MetricsSnapshot> {
    Json(query.metrics().snapshot())
}
