use crate::{websocket::handle_socket, AppState};
use axum::{
	extract::{State, WebSocketUpgrade},
	response::IntoResponse,
};

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
	ws.on_upgrade(|socket| handle_socket(socket, state))
}
