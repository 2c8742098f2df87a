use crate::{
	events::{ClientMessage, ServerEvent},
	metrics::narration::{COMMENTS_NARRATED, NARRATION_QUEUE_DEPTH},
	AppState,
};
use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::StreamExt};
use narration::{NarrationEvent, NarrationNotifier};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

const HUB_CAPACITY: usize = 256;

/// Fans dashboard events out to every connected websocket.
#[derive(Debug, Clone)]
pub struct DashboardHub {
	tx: broadcast::Sender<ServerEvent>,
}

impl Default for DashboardHub {
	fn default() -> Self {
		Self::new()
	}
}

impl DashboardHub {
	pub fn new() -> Self {
		let (tx, _) = broadcast::channel(HUB_CAPACITY);
		Self { tx }
	}

	/// Returns how many dashboards the event was queued for.
	pub fn broadcast(&self, event: ServerEvent) -> usize {
		// No dashboards open is the normal idle state
		self.tx.send(event).unwrap_or(0)
	}

	pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
		self.tx.subscribe()
	}

	pub fn client_count(&self) -> usize {
		self.tx.receiver_count()
	}
}

impl NarrationNotifier for DashboardHub {
	fn notify(&self, event: NarrationEvent) {
		match event {
			NarrationEvent::ReadingFinished { .. } => COMMENTS_NARRATED.inc(),
			NarrationEvent::QueueDepth { count } => NARRATION_QUEUE_DEPTH.set(i64::try_from(count).unwrap_or(i64::MAX)),
			NarrationEvent::ReadingStarted { .. } => {}
		}
		self.broadcast(event.into());
	}
}

fn encode(event: &ServerEvent) -> Option<Message> {
	match serde_json::to_string(event) {
		Ok(text) => Some(Message::Text(text)),
		Err(err) => {
			error!("Failed to serialize event: {}", err);
			None
		}
	}
}

/// Drive one dashboard connection until either side goes away or the server shuts down.
pub async fn handle_socket(socket: WebSocket, state: AppState) {
	let (mut sender, mut receiver) = socket.split();

	// Subscribe before reading the snapshot so nothing falls between the two
	let mut events = state.realtime.hub.subscribe();
	info!("🌐 Client connected. Total clients: {}", state.realtime.hub.client_count());

	let snapshot = state.snapshot().await;
	let replayed = last_comment_seq(&snapshot);
	for event in snapshot {
		let Some(message) = encode(&event) else { continue };
		if sender.send(message).await.is_err() {
			debug!("Client left during initial snapshot");
			return;
		}
	}

	let shutdown = state.core.cancel_token.clone();
	let mut forward_task = tokio::spawn(async move {
		loop {
			tokio::select! {
				() = shutdown.cancelled() => {
					let _ = sender.send(Message::Close(None)).await;
					break;
				}
				received = events.recv() => match received {
					Ok(event) => {
						if already_replayed(&event, replayed) {
							continue;
						}
						let Some(message) = encode(&event) else { continue };
						if let Err(err) = sender.send(message).await {
							debug!("Failed to forward event to WebSocket: {}", err);
							break;
						}
					}
					Err(RecvError::Lagged(skipped)) => warn!("Dashboard lagging, skipped {} events", skipped),
					Err(RecvError::Closed) => break,
				},
			}
		}
	});

	let recv_state = state.clone();
	let mut recv_task = tokio::spawn(async move {
		while let Some(Ok(message)) = receiver.next().await {
			match message {
				Message::Text(text) => handle_client_message(&recv_state, &text),
				Message::Close(_) => break,
				_ => {}
			}
		}
	});

	tokio::select! {
		_ = &mut forward_task => recv_task.abort(),
		_ = &mut recv_task => forward_task.abort(),
	}

	info!("🌐 Client disconnected");
}

/// Sequence number of the newest comment in a snapshot.
fn last_comment_seq(events: &[ServerEvent]) -> Option<u64> {
	events
		.iter()
		.filter_map(|event| match event {
			ServerEvent::NewComment(job) => Some(job.id.seq()),
			_ => None,
		})
		.max()
}

// A comment arriving between subscribe and snapshot is both replayed and broadcast
fn already_replayed(event: &ServerEvent, replayed: Option<u64>) -> bool {
	match (event, replayed) {
		(ServerEvent::NewComment(job), Some(last)) => job.id.seq() <= last,
		_ => false,
	}
}

fn handle_client_message(state: &AppState, text: &str) {
	match serde_json::from_str::<ClientMessage>(text) {
		Ok(ClientMessage::ToggleVoice { enabled }) => {
			state.narration.voice.set(enabled);
			info!("🔊 Voice: {}", if enabled { "ON" } else { "OFF" });
			state.realtime.hub.broadcast(ServerEvent::VoiceStatus { enabled });
		}
		Err(err) => warn!("Ignoring dashboard message: {}", err),
	}
}
