use crate::handlers::connect as routes;
use crate::session::LiveSessionManager;
use axum::routing::get;
use axum::{extract::FromRef, http::Method, Router};
use tower_http::cors::{Any, CorsLayer};

pub fn get_connect<S>() -> Router<S>
where
	S: Clone + Send + Sync + 'static,
	LiveSessionManager: FromRef<S>,
{
	let cors = CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]).allow_headers(Any);

	Router::new().route("/connect/:username", get(routes::connect)).layer(cors)
}
