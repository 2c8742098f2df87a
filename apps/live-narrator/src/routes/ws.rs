use crate::handlers::ws as routes;
use crate::AppState;
use axum::{extract::FromRef, routing::get, Router};

pub fn get_ws<S>() -> Router<S>
where
	S: Clone + Send + Sync + 'static,
	AppState: FromRef<S>,
{
	Router::new().route("/ws", get(routes::websocket_handler))
}
