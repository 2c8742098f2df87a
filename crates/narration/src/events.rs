use crate::JobId;
use tokio::sync::{broadcast, mpsc};

/// State transitions reported by the narration queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationEvent {
	/// A job was dequeued and is now on air.
	ReadingStarted { id: JobId },
	/// The job left the air (played, or dropped after a failure).
	ReadingFinished { id: JobId },
	/// Number of jobs still waiting after a narration completed.
	QueueDepth { count: usize },
}

/// Receives narration progress. Implementations must not block.
pub trait NarrationNotifier: Send + Sync + 'static {
	fn notify(&self, event: NarrationEvent);
}

impl NarrationNotifier for mpsc::UnboundedSender<NarrationEvent> {
	fn notify(&self, event: NarrationEvent) {
		let _ = self.send(event);
	}
}

impl NarrationNotifier for broadcast::Sender<NarrationEvent> {
	fn notify(&self, event: NarrationEvent) {
		// No subscribers is not an error for a progress feed
		let _ = self.send(event);
	}
}
