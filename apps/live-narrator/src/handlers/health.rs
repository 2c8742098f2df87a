use axum::http::StatusCode;
use tracing::instrument;

#[instrument(name = "health")]
pub async fn health() -> StatusCode {
	StatusCode::OK
}
