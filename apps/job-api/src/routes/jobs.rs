//! Job creation endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::error::{ApiError, ApiErrorBody};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/createJob", get(create_job).post(create_job))
}

/// `GET /createJob`: start a job and return its id as plain text.
///
/// `POST` is accepted as well. Watch the returned id over `/jobMonitor` to
/// learn when it completes.
#[utoipa::path(
    get,
    path = "/createJob",
    tag = "Jobs",
    responses(
        (status = 200, description = "Id of the new job", body = String, content_type = "text/plain"),
        (status = 500, description = "Job id could not be generated", body = ApiErrorBody),
    ),
)]
pub async fn create_job(State(state): State<AppState>) -> Result<String, ApiError> {
    let id = state.registry.create()?;
    state.backend.start(id.clone());

    tracing::debug!(job_id = %id, "job created");

    Ok(id.into_string())
}
