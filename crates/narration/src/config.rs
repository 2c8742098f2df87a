use std::time::Duration;

/// Grace delay before a played audio file is deleted.
pub const DEFAULT_CLEANUP_DELAY: Duration = Duration::from_secs(2);

/// Pause between two consecutive narrations.
pub const DEFAULT_INTER_COMMENT_DELAY: Duration = Duration::from_millis(500);

/// When an [`AudioArtifact`](crate::AudioArtifact) deletes its file once released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupPolicy {
	/// Delete synchronously on release.
	Immediate,
	/// Delete in a background task after the delay; falls back to immediate
	/// deletion when no tokio runtime is available.
	AfterDelay(Duration),
}

impl CleanupPolicy {
	/// `0` means immediate deletion.
	pub const fn from_millis(millis: u64) -> Self {
		if millis == 0 {
			Self::Immediate
		} else {
			Self::AfterDelay(Duration::from_millis(millis))
		}
	}
}

impl Default for CleanupPolicy {
	fn default() -> Self {
		Self::AfterDelay(DEFAULT_CLEANUP_DELAY)
	}
}

#[derive(Debug, Clone)]
pub struct NarrationConfig {
	pub inter_comment_delay: Duration,
	pub cleanup: CleanupPolicy,
}

impl Default for NarrationConfig {
	fn default() -> Self {
		Self {
			inter_comment_delay: DEFAULT_INTER_COMMENT_DELAY,
			cleanup: CleanupPolicy::default(),
		}
	}
}
