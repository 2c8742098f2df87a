mod command;

pub use command::{CommandBackend, GenericCommandBackend, PowerShellMediaPlayer, FILE_PLACEHOLDER, GENERIC_PLAYERS};

use crate::{AudioArtifact, PlaybackError};
use async_trait::async_trait;
use std::{path::Path, sync::Arc, time::Duration};
use tokio::time::timeout;
use tracing::{info, warn};

pub const DEFAULT_PRIMARY_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can play an audio file to completion.
#[async_trait]
pub trait PlaybackBackend: Send + Sync + 'static {
	fn name(&self) -> &str;

	/// Resolve once playback has finished or failed.
	async fn play(&self, path: &Path) -> Result<(), PlaybackError>;
}

/// How a playback attempt ended. Every variant counts as "finished".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
	Primary,
	PrimaryTimedOut,
	Fallback,
	FallbackFailed,
	FallbackTimedOut,
}

impl PlaybackOutcome {
	pub const fn used_fallback(self) -> bool {
		matches!(self, Self::Fallback | Self::FallbackFailed | Self::FallbackTimedOut)
	}
}

/// Plays through a primary backend, falling back once to a secondary one.
///
/// `play` never fails and never hangs past
/// `primary_timeout + fallback_timeout`.
#[derive(Clone)]
pub struct AudioPlayer {
	primary: Arc<dyn PlaybackBackend>,
	fallback: Arc<dyn PlaybackBackend>,
	primary_timeout: Duration,
	fallback_timeout: Duration,
}

impl AudioPlayer {
	pub fn new(primary: Arc<dyn PlaybackBackend>, fallback: Arc<dyn PlaybackBackend>) -> Self {
		Self {
			primary,
			fallback,
			primary_timeout: DEFAULT_PRIMARY_TIMEOUT,
			fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
		}
	}

	#[must_use]
	pub const fn with_timeouts(mut self, primary: Duration, fallback: Duration) -> Self {
		self.primary_timeout = primary;
		self.fallback_timeout = fallback;
		self
	}

	/// Media player for the host platform, with a generic command-line player as fallback.
	pub fn platform_default() -> Self {
		let (primary, fallback) = Self::platform_backends();
		Self::new(primary, fallback)
	}

	/// The `(primary, fallback)` pair used by [`platform_default`](Self::platform_default).
	pub fn platform_backends() -> (Arc<dyn PlaybackBackend>, Arc<dyn PlaybackBackend>) {
		let primary: Arc<dyn PlaybackBackend> = if cfg!(windows) {
			Arc::new(PowerShellMediaPlayer::new())
		} else if cfg!(target_os = "macos") {
			Arc::new(CommandBackend::new("afplay", "afplay", [FILE_PLACEHOLDER]))
		} else {
			Arc::new(CommandBackend::new("ffplay", "ffplay", ["-nodisp", "-autoexit", "-loglevel", "quiet", FILE_PLACEHOLDER]))
		};

		(primary, Arc::new(GenericCommandBackend::default()))
	}

	pub fn primary_name(&self) -> &str {
		self.primary.name()
	}

	pub fn fallback_name(&self) -> &str {
		self.fallback.name()
	}

	pub async fn play(&self, artifact: &AudioArtifact) -> PlaybackOutcome {
		self.play_path(artifact.path()).await
	}

	pub async fn play_path(&self, path: &Path) -> PlaybackOutcome {
		match timeout(self.primary_timeout, self.primary.play(path)).await {
			Ok(Ok(())) => {
				info!("🔊 Audio played via {}", self.primary.name());
				return PlaybackOutcome::Primary;
			}
			Ok(Err(e)) => {
				warn!("⚠️ {} fallback: {}", self.primary.name(), e);
			}
			Err(_) => {
				// The primary may already have been audible; replaying would double the speech
				warn!("⚠️ {} did not finish within {:?}, moving on", self.primary.name(), self.primary_timeout);
				return PlaybackOutcome::PrimaryTimedOut;
			}
		}

		match timeout(self.fallback_timeout, self.fallback.play(path)).await {
			Ok(Ok(())) => {
				info!("🔊 Audio played via {}", self.fallback.name());
				PlaybackOutcome::Fallback
			}
			Ok(Err(e)) => {
				warn!("⚠️ {} error: {}", self.fallback.name(), e);
				PlaybackOutcome::FallbackFailed
			}
			Err(_) => {
				warn!("⚠️ {} timeout, forcing resolve", self.fallback.name());
				PlaybackOutcome::FallbackTimedOut
			}
		}
	}
}

impl std::fmt::Debug for AudioPlayer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AudioPlayer")
			.field("primary", &self.primary.name())
			.field("fallback", &self.fallback.name())
			.field("primary_timeout", &self.primary_timeout)
			.field("fallback_timeout", &self.fallback_timeout)
			.finish()
	}
}
