use crate::{
	parse::{parse_frame, Frame},
	ConnectorError, LiveConnector, LiveEvent, LiveSession,
};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::{net::TcpStream, sync::mpsc, time::timeout};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:8081/live";

type RelayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct RelayConfig {
	/// Base websocket URL; the channel name is appended as the last path segment.
	pub url: String,
	/// Bound on the handshake plus the relay's session confirmation.
	pub connect_timeout: Duration,
	pub channel_capacity: usize,
}

impl Default for RelayConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_RELAY_URL.to_string(),
			connect_timeout: Duration::from_secs(15),
			channel_capacity: 256,
		}
	}
}

/// Websocket relay client.
///
/// After the handshake the relay answers with either a `connected` frame or an
/// `error` frame; only the former yields a session.
#[derive(Debug, Clone, Default)]
pub struct RelayConnector {
	config: RelayConfig,
}

impl RelayConnector {
	pub const fn new(config: RelayConfig) -> Self {
		Self { config }
	}

	pub fn session_url(&self, username: &str) -> String {
		format!("{}/{}", self.config.url.trim_end_matches('/'), urlencoding::encode(username))
	}

	async fn open(&self, url: &str) -> Result<(RelayStream, LiveEvent), ConnectorError> {
		let (mut stream, _) = connect_async(url).await?;

		// The first event is the relay's verdict; anything other than an error confirms the session
		while let Some(message) = stream.next().await {
			let text = match message? {
				Message::Text(text) => text,
				Message::Close(frame) => {
					debug!(?frame, "Relay closed during session setup");
					return Err(ConnectorError::Closed);
				}
				_ => continue,
			};

			match parse_frame(text.as_str()) {
				Ok(Frame::Event(event)) => return Ok((stream, event)),
				Ok(Frame::Error(message)) => return Err(ConnectorError::Rejected(message)),
				Ok(Frame::Ignored(_)) => {}
				Err(e) => warn!("Malformed relay frame during setup: {}", e),
			}
		}

		Err(ConnectorError::Closed)
	}
}

#[async_trait]
impl LiveConnector for RelayConnector {
	#[instrument(skip(self))]
	async fn connect(&self, username: &str) -> Result<LiveSession, ConnectorError> {
		let username = username.trim().trim_start_matches('@');
		if username.is_empty() {
			return Err(ConnectorError::InvalidUsername(username.to_string()));
		}

		let url = self.session_url(username);
		let (stream, first) = timeout(self.config.connect_timeout, self.open(&url))
			.await
			.map_err(|_| ConnectorError::Timeout(self.config.connect_timeout))??;

		info!("✅ Connected to live relay for {}", username);

		let (tx, rx) = mpsc::channel(self.config.channel_capacity);
		let cancel = CancellationToken::new();

		// Fresh channel, the first slot is always free
		let _ = tx.try_send(first);

		tokio::spawn(read_frames(stream, tx, cancel.clone()));

		Ok(LiveSession::new(rx, cancel))
	}
}

async fn read_frames(mut stream: RelayStream, tx: mpsc::Sender<LiveEvent>, cancel: CancellationToken) {
	let reason = loop {
		tokio::select! {
			() = cancel.cancelled() => {
				debug!("Live session cancelled, closing relay socket");
				let _ = stream.close(None).await;
				return;
			}
			message = stream.next() => {
				let text = match message {
					Some(Ok(Message::Text(text))) => text,
					Some(Ok(Message::Close(frame))) => break frame.map(|f| f.reason.as_str().to_string()).filter(|r| !r.is_empty()),
					Some(Ok(_)) => continue,
					Some(Err(e)) => break Some(e.to_string()),
					None => break None,
				};

				let event = match parse_frame(text.as_str()) {
					Ok(Frame::Event(event)) => event,
					Ok(Frame::Error(message)) => break Some(message),
					Ok(Frame::Ignored(kind)) => {
						debug!(kind = %kind, "Ignoring relay frame");
						continue;
					}
					Err(e) => {
						warn!("Malformed relay frame: {}", e);
						continue;
					}
				};

				let ends_session = matches!(event, LiveEvent::Disconnected { .. });
				if tx.send(event).await.is_err() {
					let _ = stream.close(None).await;
					return;
				}
				if ends_session {
					let _ = stream.close(None).await;
					return;
				}
			}
		}
	};

	let _ = tx.send(LiveEvent::Disconnected { reason }).await;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_session_url_appends_encoded_channel() {
		let connector = RelayConnector::new(RelayConfig {
			url: "ws://relay.local/live/".into(),
			..RelayConfig::default()
		});

		assert_eq!(connector.session_url("tonkungtv"), "ws://relay.local/live/tonkungtv");
		assert_eq!(connector.session_url("a b"), "ws://relay.local/live/a%20b");
	}

	#[tokio::test]
	async fn test_blank_username_is_rejected_before_dialing() {
		let connector = RelayConnector::default();

		assert!(matches!(connector.connect("  @ ").await, Err(ConnectorError::InvalidUsername(_))));
	}
}
