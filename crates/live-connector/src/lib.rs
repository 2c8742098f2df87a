//! # Live connector
//!
//! Ingests a live stream's comment feed. A [`LiveConnector`] opens a
//! [`LiveSession`] for a channel; the session yields [`LiveEvent`]s until it
//! is disconnected or the upstream goes away.
//!
//! [`RelayConnector`] talks to a websocket relay that forwards the platform's
//! webcast events as JSON frames.

mod error;
mod event;
pub mod parse;
mod relay;
mod session;

pub use error::ConnectorError;
pub use event::{ChatMessage, LiveEvent};
pub use relay::{RelayConfig, RelayConnector, DEFAULT_RELAY_URL};
pub use session::LiveSession;

use async_trait::async_trait;

/// Opens live sessions for a channel identifier.
#[async_trait]
pub trait LiveConnector: Send + Sync + 'static {
	/// Resolves once the upstream confirmed the session, or with the reason it refused.
	async fn connect(&self, username: &str) -> Result<LiveSession, ConnectorError>;
}
