//! REST API handlers for the shift scheduler.

use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::demo_data::{self, DemoData};
use crate::dto::ScheduleRequest;
use crate::error::ScheduleError;
use crate::solver;

/// Creates the API router.
pub fn router() -> Router {
    Router::new()
        .route("/", get(info))
        .route("/health", get(health))
        .route("/demo-data", get(list_demo_data))
        .route("/demo-data/{id}", get(get_demo_data))
        .route("/schedule", post(schedule))
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET / - Service info.
async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        status: "Shift Scheduling API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health - Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// GET /demo-data - List available demo data sets.
async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(demo_data::list_demo_data())
}

/// GET /demo-data/{id} - Get a specific demo request.
async fn get_demo_data(Path(id): Path<String>) -> Result<Json<ScheduleRequest>, StatusCode> {
    match id.parse::<DemoData>() {
        Ok(demo) => Ok(Json(demo_data::generate(demo))),
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}

/// POST /schedule - Generate a multi-week schedule.
///
/// Returns the schedule payload, or `{success: false, error}` carrying the
/// infeasibility diagnostic.
async fn schedule(payload: Result<Json<ScheduleRequest>, JsonRejection>) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return ScheduleError::BadRequest(rejection.body_text()).into_response();
        }
    };

    let span = tracing::info_span!("schedule_request", id = %Uuid::new_v4());
    let outcome = tokio::task::spawn_blocking(move || {
        span.in_scope(|| {
            let problem = request.to_domain()?;
            solver::generate_schedule(&problem)
        })
    })
    .await;

    match outcome {
        Ok(Ok(response)) => Json(response).into_response(),
        Ok(Err(error)) => error.into_response(),
        Err(join_error) => ScheduleError::Internal(join_error.to_string()).into_response(),
    }
}
