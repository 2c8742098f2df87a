use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthesisError {
	#[error("TTS request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("TTS endpoint returned HTTP {0}")]
	Status(reqwest::StatusCode),

	#[error("TTS endpoint returned an empty payload")]
	EmptyPayload,

	#[error("Failed to persist audio artifact: {0}")]
	Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PlaybackError {
	#[error("Failed to launch {program}: {source}")]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},

	#[error("{program} exited with {status}")]
	ExitStatus { program: String, status: ExitStatus },

	#[error("No playback program available (tried: {0})")]
	NoPlayerAvailable(String),

	#[error("Invalid media path: {0}")]
	InvalidPath(String),
}
