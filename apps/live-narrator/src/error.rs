use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
};
use live_connector::ConnectorError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Speech synthesis setup failed: {0}")]
	Synthesis(#[from] narration::SynthesisError),

	#[error("Metrics encoding failed: {0}")]
	Metrics(#[from] prometheus::Error),

	#[error("Metrics output is not UTF-8: {0}")]
	MetricsEncoding(#[from] std::string::FromUtf8Error),
}

impl Error {
	const fn status_code(&self) -> StatusCode {
		match self {
			Self::Io(_) | Self::Synthesis(_) | Self::Metrics(_) | Self::MetricsEncoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		tracing::error!("Request failed: {}", self);
		(self.status_code(), self.to_string()).into_response()
	}
}

/// Failure to switch the watched channel. The message is shown to the dashboard as is.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
	#[error(transparent)]
	Connect(#[from] ConnectorError),

	#[error("Server is shutting down")]
	ShuttingDown,
}
