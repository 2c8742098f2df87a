use serde::{Deserialize, Serialize};

/// A single viewer comment with its author fields already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
	pub user: String,
	pub nickname: String,
	pub comment: String,
	pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
	Chat(ChatMessage),
	ViewerCount(u64),
	Connected { room_id: Option<String> },
	Disconnected { reason: Option<String> },
}
