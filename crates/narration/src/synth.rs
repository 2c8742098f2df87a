mod google;

pub use google::{GoogleTts, GoogleTtsConfig, DEFAULT_TTS_LANGUAGE, DEFAULT_TTS_URL};

use crate::AudioArtifact;
use async_trait::async_trait;

/// Converts text into a playable audio artifact.
///
/// Failures never escape as errors: an unusable result is reported as `None`
/// after being logged, and the caller skips playback for that job.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + 'static {
	async fn synthesize(&self, text: &str) -> Option<AudioArtifact>;
}
