use crate::CleanupPolicy;
use chrono::Utc;
use std::{
	path::{Path, PathBuf},
	sync::atomic::{AtomicU64, Ordering},
};
use tracing::debug;

/// A transient audio file owned by one narration.
///
/// The file is removed when the artifact is dropped, following its
/// [`CleanupPolicy`]. Removal errors are swallowed.
#[derive(Debug)]
pub struct AudioArtifact {
	path: PathBuf,
	cleanup: CleanupPolicy,
}

impl AudioArtifact {
	pub const fn new(path: PathBuf) -> Self {
		Self {
			path,
			cleanup: CleanupPolicy::Immediate,
		}
	}

	#[must_use]
	pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
		self.cleanup = cleanup;
		self
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub const fn cleanup(&self) -> CleanupPolicy {
		self.cleanup
	}
}

impl Drop for AudioArtifact {
	fn drop(&mut self) {
		let path = std::mem::take(&mut self.path);

		match self.cleanup {
			CleanupPolicy::Immediate => remove_quietly(&path),
			CleanupPolicy::AfterDelay(delay) => match tokio::runtime::Handle::try_current() {
				Ok(handle) => {
					handle.spawn(async move {
						tokio::time::sleep(delay).await;
						remove_quietly(&path);
					});
				}
				Err(_) => remove_quietly(&path),
			},
		}
	}
}

fn remove_quietly(path: &Path) {
	if let Err(e) = std::fs::remove_file(path) {
		debug!(path = %path.display(), error = %e, "Audio artifact cleanup skipped");
	}
}

/// Produces unique, timestamp-based artifact file names (`<unix-millis>-<seq>.<ext>`).
#[derive(Debug, Default)]
pub struct ArtifactNamer {
	seq: AtomicU64,
}

impl ArtifactNamer {
	pub const fn new() -> Self {
		Self { seq: AtomicU64::new(0) }
	}

	pub fn next_name(&self, extension: &str) -> String {
		let seq = self.seq.fetch_add(1, Ordering::Relaxed);
		format!("{}-{}.{}", Utc::now().timestamp_millis(), seq, extension)
	}
}
