pub mod health;
pub mod jobs;

use axum::Router;
use utoipa::OpenApi;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(jobs::router())
        .merge(crate::gateway::server::router())
}

#[derive(OpenApi)]
#[openapi(
    paths(health::health, jobs::create_job),
    components(schemas(
        crate::error::ApiErrorBody,
        crate::error::ApiErrorDetail,
        health::HealthResponse,
    )),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Jobs", description = "Job creation"),
    )
)]
pub struct ApiDoc;
