use std::sync::{
	atomic::{AtomicBool, Ordering},
	Arc,
};

/// Whether new comments are read aloud. Jobs already queued are unaffected.
#[derive(Debug, Clone)]
pub struct VoiceSettings {
	enabled: Arc<AtomicBool>,
}

impl VoiceSettings {
	pub fn new(enabled: bool) -> Self {
		Self {
			enabled: Arc::new(AtomicBool::new(enabled)),
		}
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled.load(Ordering::SeqCst)
	}

	/// Returns the previous value.
	pub fn set(&self, enabled: bool) -> bool {
		self.enabled.swap(enabled, Ordering::SeqCst)
	}
}
