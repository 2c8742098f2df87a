//! Dashboard wire format: JSON frames `{"event": <name>, "data": <payload>}`.

use narration::{CommentJob, JobId, NarrationEvent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
	ConnectionStatus(ConnectionStatus),
	ViewerCount {
		count: u64,
	},
	NewComment(CommentJob),
	ReadingComment {
		id: JobId,
	},
	FinishedReading {
		id: JobId,
	},
	QueueUpdate {
		count: usize,
	},
	VoiceStatus {
		enabled: bool,
	},
	RoomInfo {
		#[serde(rename = "roomId")]
		room_id: String,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionStatus {
	pub connected: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl ConnectionStatus {
	pub fn connected(username: impl Into<String>) -> Self {
		Self {
			connected: true,
			username: Some(username.into()),
			error: None,
		}
	}

	pub fn failed(error: impl Into<String>) -> Self {
		Self {
			connected: false,
			username: None,
			error: Some(error.into()),
		}
	}
}

/// Commands a dashboard may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
	ToggleVoice { enabled: bool },
}

impl From<NarrationEvent> for ServerEvent {
	fn from(event: NarrationEvent) -> Self {
		match event {
			NarrationEvent::ReadingStarted { id } => Self::ReadingComment { id },
			NarrationEvent::ReadingFinished { id } => Self::FinishedReading { id },
			NarrationEvent::QueueDepth { count } => Self::QueueUpdate { count },
		}
	}
}
