use super::SpeechSynthesizer;
use crate::{ArtifactNamer, AudioArtifact, SynthesisError};
use async_trait::async_trait;
use reqwest::Client;
use std::{path::PathBuf, time::Duration};
use tracing::{debug, error, info, instrument};

pub const DEFAULT_TTS_URL: &str = "https://translate.google.com/translate_tts";
pub const DEFAULT_TTS_LANGUAGE: &str = "th";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone)]
pub struct GoogleTtsConfig {
	pub endpoint: String,
	pub language: String,
	pub timeout: Duration,
	pub audio_dir: PathBuf,
}

impl GoogleTtsConfig {
	pub fn new(audio_dir: impl Into<PathBuf>) -> Self {
		Self {
			endpoint: DEFAULT_TTS_URL.to_string(),
			language: DEFAULT_TTS_LANGUAGE.to_string(),
			timeout: DEFAULT_TIMEOUT,
			audio_dir: audio_dir.into(),
		}
	}
}

/// Google Translate's public speech endpoint.
///
/// Every synthesized comment lands in `audio_dir` as its own mp3 file.
pub struct GoogleTts {
	client: Client,
	config: GoogleTtsConfig,
	namer: ArtifactNamer,
}

impl GoogleTts {
	pub fn new(config: GoogleTtsConfig) -> Result<Self, SynthesisError> {
		let client = Client::builder().timeout(config.timeout).user_agent(USER_AGENT).build()?;

		Ok(Self {
			client,
			config,
			namer: ArtifactNamer::new(),
		})
	}

	pub const fn config(&self) -> &GoogleTtsConfig {
		&self.config
	}

	pub fn request_url(&self, text: &str) -> String {
		format!(
			"{}?ie=UTF-8&q={}&tl={}&client=tw-ob",
			self.config.endpoint,
			urlencoding::encode(text),
			urlencoding::encode(&self.config.language)
		)
	}

	/// Download the speech for `text` and persist it as a new artifact.
	#[instrument(skip(self, text), fields(chars = text.chars().count()))]
	pub async fn fetch(&self, text: &str) -> Result<AudioArtifact, SynthesisError> {
		let response = self.client.get(self.request_url(text)).send().await?;

		let status = response.status();
		if !status.is_success() {
			return Err(SynthesisError::Status(status));
		}

		let body = response.bytes().await?;
		if body.is_empty() {
			return Err(SynthesisError::EmptyPayload);
		}

		tokio::fs::create_dir_all(&self.config.audio_dir).await?;
		let artifact = write_artifact(self.config.audio_dir.join(self.namer.next_name("mp3")), &body).await?;

		debug!(path = %artifact.path().display(), bytes = body.len(), "Audio artifact written");
		Ok(artifact)
	}
}

/// The artifact owns `path` before the write starts, so a failed write leaves nothing behind.
async fn write_artifact(path: PathBuf, body: &[u8]) -> Result<AudioArtifact, SynthesisError> {
	let artifact = AudioArtifact::new(path);
	tokio::fs::write(artifact.path(), body).await?;
	Ok(artifact)
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
	async fn synthesize(&self, text: &str) -> Option<AudioArtifact> {
		match self.fetch(text).await {
			Ok(artifact) => {
				info!("🎵 Google TTS completed");
				Some(artifact)
			}
			Err(e) => {
				error!("❌ Google TTS error: {}", e);
				None
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{extract::Query, http::StatusCode, routing::get, Router};
	use std::collections::HashMap;
	use tokio::net::TcpListener;

	async fn spawn_mock(router: Router) -> String {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, router).await.unwrap();
		});
		format!("http://{addr}/translate_tts")
	}

	fn tts_for(endpoint: String, dir: &std::path::Path) -> GoogleTts {
		let mut config = GoogleTtsConfig::new(dir);
		config.endpoint = endpoint;
		config.timeout = Duration::from_millis(500);
		GoogleTts::new(config).unwrap()
	}

	#[test]
	fn test_request_url_percent_encodes_text() {
		let dir = tempfile::tempdir().unwrap();
		let tts = tts_for(DEFAULT_TTS_URL.to_string(), dir.path());

		let url = tts.request_url("สวัสดี & hi?");
		assert!(url.starts_with("https://translate.google.com/translate_tts?ie=UTF-8&q="));
		assert!(url.ends_with("&tl=th&client=tw-ob"));
		assert!(url.contains("%20%26%20hi%3F"));
		assert!(!url.contains("สวัสดี"));
	}

	#[tokio::test]
	async fn test_successful_synthesis_writes_artifact() {
		let router = Router::new().route(
			"/translate_tts",
			get(|Query(params): Query<HashMap<String, String>>| async move {
				assert_eq!(params.get("q").map(String::as_str), Some("hello world"));
				assert_eq!(params.get("tl").map(String::as_str), Some("th"));
				assert_eq!(params.get("client").map(String::as_str), Some("tw-ob"));
				vec![0x49_u8, 0x44, 0x33, 0x04]
			}),
		);
		let dir = tempfile::tempdir().unwrap();
		let tts = tts_for(spawn_mock(router).await, dir.path());

		let artifact = tts.synthesize("hello world").await.expect("artifact");
		assert!(artifact.path().starts_with(dir.path()));
		assert_eq!(std::fs::read(artifact.path()).unwrap(), vec![0x49, 0x44, 0x33, 0x04]);

		let path = artifact.path().to_path_buf();
		drop(artifact);
		assert!(!path.exists());
	}

	#[tokio::test]
	async fn test_error_status_yields_none() {
		let router = Router::new().route("/translate_tts", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "nope") }));
		let dir = tempfile::tempdir().unwrap();
		let tts = tts_for(spawn_mock(router).await, dir.path());

		assert!(matches!(tts.fetch("x").await, Err(SynthesisError::Status(StatusCode::INTERNAL_SERVER_ERROR))));
		assert!(tts.synthesize("x").await.is_none());
		assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
	}

	#[tokio::test]
	async fn test_empty_payload_yields_none() {
		let router = Router::new().route("/translate_tts", get(|| async { "" }));
		let dir = tempfile::tempdir().unwrap();
		let tts = tts_for(spawn_mock(router).await, dir.path());

		assert!(matches!(tts.fetch("x").await, Err(SynthesisError::EmptyPayload)));
		assert!(tts.synthesize("x").await.is_none());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_failed_write_leaves_no_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("1-0.mp3");
		// Dangling link: the write resolves it into a missing directory and fails
		std::os::unix::fs::symlink(dir.path().join("missing").join("target.mp3"), &path).unwrap();

		assert!(matches!(write_artifact(path.clone(), b"ID3").await, Err(SynthesisError::Io(_))));
		assert!(std::fs::symlink_metadata(&path).is_err());
		assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
	}

	#[tokio::test]
	async fn test_slow_endpoint_times_out() {
		let router = Router::new().route(
			"/translate_tts",
			get(|| async {
				tokio::time::sleep(Duration::from_secs(5)).await;
				"late"
			}),
		);
		let dir = tempfile::tempdir().unwrap();
		let tts = tts_for(spawn_mock(router).await, dir.path());

		let started = std::time::Instant::now();
		assert!(tts.synthesize("x").await.is_none());
		assert!(started.elapsed() < Duration::from_secs(4));
	}
}
