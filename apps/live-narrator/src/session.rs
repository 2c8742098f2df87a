use crate::{
	error::SessionError,
	events::{ConnectionStatus, ServerEvent},
	relay::CommentRelay,
	websocket::DashboardHub,
};
use live_connector::{LiveConnector, LiveEvent, LiveSession};
use std::{
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
	time::Duration,
};
use tokio::{sync::Mutex, sync::RwLock, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

const PUMP_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

struct ActiveSession {
	cancel: CancellationToken,
	pump: JoinHandle<()>,
}

/// Owns the single upstream live session and swaps it on channel changes.
///
/// Switches are serialized; a new connect only starts once the previous
/// session was told to stop. Narration already queued is left alone.
#[derive(Clone)]
pub struct LiveSessionManager {
	connector: Arc<dyn LiveConnector>,
	relay: CommentRelay,
	hub: DashboardHub,
	active: Arc<Mutex<Option<ActiveSession>>>,
	connected: Arc<AtomicBool>,
	username: Arc<RwLock<Option<String>>>,
	shutdown: CancellationToken,
}

impl LiveSessionManager {
	pub fn new(connector: Arc<dyn LiveConnector>, relay: CommentRelay, hub: DashboardHub, shutdown: CancellationToken) -> Self {
		Self {
			connector,
			relay,
			hub,
			active: Arc::new(Mutex::new(None)),
			connected: Arc::new(AtomicBool::new(false)),
			username: Arc::new(RwLock::new(None)),
			shutdown,
		}
	}

	pub fn is_connected(&self) -> bool {
		self.connected.load(Ordering::SeqCst)
	}

	/// The channel most recently asked for, connected or not.
	pub async fn username(&self) -> Option<String> {
		self.username.read().await.clone()
	}

	pub async fn status(&self) -> ConnectionStatus {
		ConnectionStatus {
			connected: self.is_connected(),
			username: self.username().await,
			error: None,
		}
	}

	/// Drop the current session (if any) and connect to `username`.
	///
	/// The outcome is broadcast as `connection-status` either way.
	#[instrument(skip(self))]
	pub async fn switch_channel(&self, username: &str) -> Result<String, SessionError> {
		if self.shutdown.is_cancelled() {
			return Err(SessionError::ShuttingDown);
		}

		let mut active = self.active.lock().await;
		if let Some(previous) = active.take() {
			previous.cancel.cancel();
			self.connected.store(false, Ordering::SeqCst);
			self.relay.reset_room().await;
			info!("🔌 Disconnected previous live session");
		}

		*self.username.write().await = Some(username.to_string());

		match self.connector.connect(username).await {
			Ok(session) => {
				info!("✅ Connected to live channel: {}", username);
				self.connected.store(true, Ordering::SeqCst);
				self.hub.broadcast(ServerEvent::ConnectionStatus(ConnectionStatus::connected(username)));

				let cancel = session.cancel_token();
				let pump = tokio::spawn(pump_events(session, self.relay.clone(), self.hub.clone(), self.connected.clone()));
				*active = Some(ActiveSession { cancel, pump });

				Ok(username.to_string())
			}
			Err(e) => {
				error!("❌ Connection failed: {}", e);
				self.hub.broadcast(ServerEvent::ConnectionStatus(ConnectionStatus::failed(e.to_string())));
				Err(e.into())
			}
		}
	}

	/// Stop the current session without broadcasting a disconnect.
	pub async fn disconnect(&self) {
		let Some(previous) = self.active.lock().await.take() else {
			return;
		};

		previous.cancel.cancel();
		self.connected.store(false, Ordering::SeqCst);

		if tokio::time::timeout(PUMP_SHUTDOWN_TIMEOUT, previous.pump).await.is_err() {
			warn!("Live event pump did not stop in time");
		}
		info!("🔌 Live session closed");
	}
}

async fn pump_events(mut session: LiveSession, relay: CommentRelay, hub: DashboardHub, connected: Arc<AtomicBool>) {
	while let Some(event) = session.next_event().await {
		match event {
			LiveEvent::Disconnected { reason } => {
				// Cancelled sessions were replaced on purpose; only upstream loss is news
				if !session.is_disconnected() {
					info!("❌ Disconnected");
					connected.store(false, Ordering::SeqCst);
					relay.reset_room().await;
					hub.broadcast(ServerEvent::ConnectionStatus(ConnectionStatus {
						connected: false,
						username: None,
						error: reason,
					}));
				}
				break;
			}
			other => relay.handle(other).await,
		}
	}
}
