use crate::session::LiveSessionManager;
use axum::{
	extract::{Path, State},
	Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Outcome of a channel switch. Always served with HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResponse {
	pub success: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[instrument(name = "connect", skip(session))]
pub async fn connect(State(session): State<LiveSessionManager>, Path(username): Path<String>) -> Json<ConnectResponse> {
	let response = match session.switch_channel(&username).await {
		Ok(username) => ConnectResponse {
			success: true,
			username: Some(username),
			error: None,
		},
		Err(e) => ConnectResponse {
			success: false,
			username: None,
			error: Some(e.to_string()),
		},
	};

	Json(response)
}
