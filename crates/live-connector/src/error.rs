use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectorError {
	#[error("Invalid channel name: {0:?}")]
	InvalidUsername(String),

	#[error("Failed to connect to live relay: {0}")]
	WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

	#[error("Connection timeout after {0:?}")]
	Timeout(Duration),

	#[error("{0}")]
	Rejected(String),

	#[error("Live relay closed the connection before the session was confirmed")]
	Closed,
}
