//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path/body parameters via axum extractors,
//! interacts with AppState services, and returns JSON responses.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use auris_aggregate::RunOutcome;
use auris_core::types::AggregationResult;
use auris_storage::SummaryRepository;

use crate::error::ApiError;
use crate::registry::{ProgressReporter, RunRecord};
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub device_id: String,
    /// Target date, `YYYY-MM-DD`.
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct StartRunResponse {
    pub task_id: Uuid,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RunListResponse {
    pub runs: Vec<RunRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct DeleteRunResponse {
    pub message: String,
}

fn parse_date(date: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("date must be in YYYY-MM-DD format".to_string()))
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health - liveness probe.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// POST /analysis/runs - start an aggregation run in the background.
pub async fn start_run(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<StartRunResponse>, ApiError> {
    if request.device_id.trim().is_empty() {
        return Err(ApiError::BadRequest("device_id must not be empty".to_string()));
    }
    let date = parse_date(&request.date)?;

    let record = state.registry.create(&request.device_id, &request.date);
    let task_id = record.task_id;
    info!(
        task_id = %task_id,
        device_id = %request.device_id,
        date = %request.date,
        "analysis run accepted"
    );

    let run_state = state.clone();
    let device_id = request.device_id.clone();
    tokio::spawn(async move {
        let reporter = ProgressReporter::new(Arc::clone(&run_state.registry), task_id);
        let outcome = run_state
            .pipeline
            .run_observed(&device_id, date, &reporter)
            .await;
        match outcome {
            RunOutcome::Completed(result) => {
                let payload = serde_json::json!({
                    "device_id": device_id,
                    "date": date.format("%Y-%m-%d").to_string(),
                    "total_events": result.total_events(),
                    "active_slots": result.active_slot_count(),
                    "ranking_entries": result.summary_ranking.len(),
                });
                run_state.registry.complete(task_id, payload);
            }
            RunOutcome::Failed(failure) => {
                run_state
                    .registry
                    .fail(task_id, failure.reason.as_str(), failure.message);
            }
        }
    });

    Ok(Json(StartRunResponse {
        task_id,
        status: "started".to_string(),
        message: format!(
            "analysis of {}/{} started",
            request.device_id, request.date
        ),
    }))
}

/// GET /analysis/runs/{id} - poll one run.
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunRecord>, ApiError> {
    state
        .registry
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("run {} not found", id)))
}

/// GET /analysis/runs - list all tracked runs, newest first.
pub async fn list_runs(State(state): State<AppState>) -> Json<RunListResponse> {
    let runs = state.registry.list();
    let total = runs.len();
    Json(RunListResponse { runs, total })
}

/// DELETE /analysis/runs/{id} - remove a finished run.
pub async fn delete_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteRunResponse>, ApiError> {
    match state.registry.delete(id) {
        Ok(true) => Ok(Json(DeleteRunResponse {
            message: format!("run {} deleted", id),
        })),
        Ok(false) => Err(ApiError::NotFound(format!("run {} not found", id))),
        Err(status) => Err(ApiError::Conflict(format!(
            "run {} is still {}; wait for it to finish",
            id, status
        ))),
    }
}

/// GET /summaries/{device_id}/{date} - read a persisted aggregation result.
pub async fn get_summary(
    State(state): State<AppState>,
    Path((device_id, date)): Path<(String, String)>,
) -> Result<Json<AggregationResult>, ApiError> {
    let date = parse_date(&date)?;
    let repo = SummaryRepository::new(Arc::clone(&state.database));
    match repo.find(&device_id, date)? {
        Some(result) => Ok(Json(result)),
        None => Err(ApiError::NotFound(format!(
            "no summary for {}/{}",
            device_id, date
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use auris_aggregate::Pipeline;
    use auris_core::config::{AggregationConfig, AurisConfig};
    use auris_core::types::TimeSlot;
    use auris_storage::{Database, SlotEventRepository, SummaryRepository};

    use crate::routes::create_router;

    fn test_state() -> AppState {
        let database = Arc::new(Database::in_memory().unwrap());
        let mut config = AurisConfig::default();
        config.aggregation = AggregationConfig {
            translate: false,
            ..AggregationConfig::default()
        };
        let pipeline = Pipeline::new(
            Arc::new(SlotEventRepository::new(Arc::clone(&database))),
            Arc::new(SummaryRepository::new(Arc::clone(&database))),
            &config.aggregation,
        );
        AppState::new(config, database, pipeline)
    }

    fn seed_day(state: &AppState, device_id: &str, date: &str) {
        let repo = SlotEventRepository::new(Arc::clone(&state.database));
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        repo.save_slot(
            device_id,
            date,
            TimeSlot::parse("09-00").unwrap(),
            &json!([
                {"label": "Speech", "prob": 0.9},
                {"label": "Speech", "prob": 0.8},
                {"label": "Cough", "prob": 0.7},
            ]),
        )
        .unwrap();
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn poll_until_terminal(state: &AppState, task_id: Uuid) -> RunRecord {
        for _ in 0..100 {
            if let Some(record) = state.registry.get(task_id) {
                if record.status.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run {} never reached a terminal state", task_id);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = create_router(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_start_run_rejects_bad_date() {
        let response = create_router(test_state())
            .oneshot(
                Request::post("/analysis/runs")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"device_id": "d1", "date": "09/26/2025"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_run_with_no_data_fails_with_reason() {
        let state = test_state();
        let response = create_router(state.clone())
            .oneshot(
                Request::post("/analysis/runs")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"device_id": "d1", "date": "2025-09-26"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let task_id: Uuid = body["task_id"].as_str().unwrap().parse().unwrap();
        assert_eq!(body["status"], "started");

        let record = poll_until_terminal(&state, task_id).await;
        assert_eq!(record.status, crate::registry::RunStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("no_data"));
    }

    #[tokio::test]
    async fn test_run_completes_and_summary_is_readable() {
        let state = test_state();
        seed_day(&state, "d1", "2025-09-26");

        let response = create_router(state.clone())
            .oneshot(
                Request::post("/analysis/runs")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"device_id": "d1", "date": "2025-09-26"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        let task_id: Uuid = body["task_id"].as_str().unwrap().parse().unwrap();

        let record = poll_until_terminal(&state, task_id).await;
        assert_eq!(record.status, crate::registry::RunStatus::Completed);
        let result = record.result.unwrap();
        assert_eq!(result["total_events"], 3);
        assert_eq!(result["active_slots"], 1);

        // The persisted artifact is served back with all 48 slots.
        let response = create_router(state.clone())
            .oneshot(
                Request::get("/summaries/d1/2025-09-26")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["time_blocks"].as_object().unwrap().len(), 48);
        assert!(body["time_blocks"]["00-00"].is_null());
        assert_eq!(body["time_blocks"]["09-00"][0]["event"], "Speech");
        assert_eq!(body["time_blocks"]["09-00"][0]["count"], 2);
        // Biometric outranks voice under the default policy.
        assert_eq!(body["summary_ranking"][0]["event"], "Cough");
        assert_eq!(body["summary_ranking"][0]["category"], "biometric");
    }

    #[tokio::test]
    async fn test_get_unknown_run_is_404() {
        let response = create_router(test_state())
            .oneshot(
                Request::get(format!("/analysis/runs/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_in_flight_run_conflicts() {
        let state = test_state();
        let record = state.registry.create("d1", "2025-09-26");
        let response = create_router(state.clone())
            .oneshot(
                Request::delete(format!("/analysis/runs/{}", record.task_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        state.registry.fail(record.task_id, "unexpected", "boom");
        let response = create_router(state.clone())
            .oneshot(
                Request::delete(format!("/analysis/runs/{}", record.task_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_summary_is_404() {
        let response = create_router(test_state())
            .oneshot(
                Request::get("/summaries/d1/2025-09-26")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_runs_reports_total() {
        let state = test_state();
        state.registry.create("d1", "2025-09-25");
        state.registry.create("d1", "2025-09-26");
        let response = create_router(state)
            .oneshot(Request::get("/analysis/runs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["runs"].as_array().unwrap().len(), 2);
    }
}
