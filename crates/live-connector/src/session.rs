use crate::LiveEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// An open live session.
///
/// Events arrive in upstream order. The stream ends after a
/// [`LiveEvent::Disconnected`] or once [`disconnect`](Self::disconnect) was called.
#[derive(Debug)]
pub struct LiveSession {
	events: mpsc::Receiver<LiveEvent>,
	cancel: CancellationToken,
}

impl LiveSession {
	pub const fn new(events: mpsc::Receiver<LiveEvent>, cancel: CancellationToken) -> Self {
		Self { events, cancel }
	}

	pub async fn next_event(&mut self) -> Option<LiveEvent> {
		tokio::select! {
			biased;
			() = self.cancel.cancelled() => None,
			event = self.events.recv() => event,
		}
	}

	/// Token that ends the session when cancelled, usable after the session
	/// itself has moved into a reader task.
	pub fn cancel_token(&self) -> CancellationToken {
		self.cancel.clone()
	}

	pub fn disconnect(&self) {
		self.cancel.cancel();
	}

	pub fn is_disconnected(&self) -> bool {
		self.cancel.is_cancelled()
	}
}

impl Drop for LiveSession {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}
