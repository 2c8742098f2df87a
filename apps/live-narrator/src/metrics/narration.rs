use async_trait::async_trait;
use lazy_static::lazy_static;
use narration::{AudioArtifact, PlaybackBackend, PlaybackError, SpeechSynthesizer};
use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge};
use std::{path::Path, sync::Arc};

lazy_static! {
	pub static ref COMMENTS_RECEIVED: IntCounter = register_int_counter!("comments_received_total", "Chat comments received from the live session").expect("Failed to register COMMENTS_RECEIVED");
	pub static ref COMMENTS_NARRATED: IntCounter = register_int_counter!("comments_narrated_total", "Comments that finished narration").expect("Failed to register COMMENTS_NARRATED");
	pub static ref SYNTHESIS_FAILURES: IntCounter =
		register_int_counter!("synthesis_failures_total", "Comments for which no audio could be synthesized").expect("Failed to register SYNTHESIS_FAILURES");
	pub static ref PLAYBACK_FALLBACKS: IntCounter =
		register_int_counter!("playback_fallbacks_total", "Playbacks handed to the fallback player").expect("Failed to register PLAYBACK_FALLBACKS");
	pub static ref NARRATION_QUEUE_DEPTH: IntGauge = register_int_gauge!("narration_queue_depth", "Comments waiting to be narrated").expect("Failed to register NARRATION_QUEUE_DEPTH");
}

/// Counts synthesis failures of the wrapped synthesizer.
pub struct MeteredSynthesizer {
	inner: Arc<dyn SpeechSynthesizer>,
}

impl MeteredSynthesizer {
	pub fn new(inner: Arc<dyn SpeechSynthesizer>) -> Self {
		Self { inner }
	}
}

#[async_trait]
impl SpeechSynthesizer for MeteredSynthesizer {
	async fn synthesize(&self, text: &str) -> Option<AudioArtifact> {
		let artifact = self.inner.synthesize(text).await;
		if artifact.is_none() {
			SYNTHESIS_FAILURES.inc();
		}
		artifact
	}
}

/// Counts every playback routed to the wrapped fallback backend.
pub struct MeteredFallback {
	inner: Arc<dyn PlaybackBackend>,
}

impl MeteredFallback {
	pub fn new(inner: Arc<dyn PlaybackBackend>) -> Self {
		Self { inner }
	}
}

#[async_trait]
impl PlaybackBackend for MeteredFallback {
	fn name(&self) -> &str {
		self.inner.name()
	}

	async fn play(&self, path: &Path) -> Result<(), PlaybackError> {
		PLAYBACK_FALLBACKS.inc();
		self.inner.play(path).await
	}
}
