//! Relay frame decoding.
//!
//! Frames are JSON objects tagged by `type`; the webcast payload sits under
//! `data` or, for flat relays, directly on the frame. Platform payloads are
//! inconsistent about where author fields live, so every field is resolved
//! through an ordered list of candidate paths. Empty strings count as missing.

use crate::{ChatMessage, LiveEvent};
use serde_json::Value;

pub const UNKNOWN_USER: &str = "unknown";

/// A decoded relay frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
	Event(LiveEvent),
	/// The relay refused or lost the upstream session.
	Error(String),
	/// Valid JSON the relay sent for something this client does not consume.
	Ignored(String),
}

/// Decode one text frame.
pub fn parse_frame(text: &str) -> Result<Frame, serde_json::Error> {
	let value: Value = serde_json::from_str(text)?;
	let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
	let data = value.get("data").unwrap_or(&value);

	let frame = match kind {
		"chat" => Frame::Event(LiveEvent::Chat(resolve_chat(data))),
		"roomUser" => Frame::Event(LiveEvent::ViewerCount(data.get("viewerCount").and_then(as_count).unwrap_or(0))),
		"connected" => Frame::Event(LiveEvent::Connected {
			room_id: data.get("roomId").and_then(as_id),
		}),
		"disconnected" => Frame::Event(LiveEvent::Disconnected { reason: first_str(data, &[&["reason"], &["message"]]) }),
		"error" => Frame::Error(first_str(data, &[&["message"], &["error"]]).unwrap_or_else(|| "Live relay reported an error".to_string())),
		other => Frame::Ignored(other.to_string()),
	};

	Ok(frame)
}

/// Resolve author and text fields of a chat payload.
pub fn resolve_chat(data: &Value) -> ChatMessage {
	let user = first_str(data, &[&["uniqueId"], &["user", "uniqueId"], &["user", "displayId"]]).unwrap_or_else(|| UNKNOWN_USER.to_string());
	let nickname = first_str(data, &[&["nickname"], &["user", "nickname"]]).unwrap_or_else(|| user.clone());
	let avatar_url = first_str(
		data,
		&[
			&["profilePictureUrl"],
			&["user", "profilePictureUrl"],
			&["user", "avatarLarger"],
			&["user", "avatarThumb"],
			&["user", "avatarMedium"],
		],
	)
	.unwrap_or_else(|| generated_avatar_url(&nickname));
	let comment = data.get("comment").and_then(Value::as_str).unwrap_or_default().to_string();

	ChatMessage {
		user,
		nickname,
		comment,
		avatar_url,
	}
}

/// Placeholder avatar rendered from the viewer's initials.
pub fn generated_avatar_url(nickname: &str) -> String {
	format!("https://ui-avatars.com/api/?name={}&background=random&size=128&bold=true", urlencoding::encode(nickname))
}

fn first_str(data: &Value, paths: &[&[&str]]) -> Option<String> {
	paths.iter().find_map(|path| {
		path.iter()
			.try_fold(data, |node, key| node.get(key))
			.and_then(Value::as_str)
			.filter(|s| !s.is_empty())
			.map(str::to_string)
	})
}

fn as_count(value: &Value) -> Option<u64> {
	value.as_u64().or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

// Room ids exceed 2^53 and arrive as strings or numbers depending on the relay
fn as_id(value: &Value) -> Option<String> {
	match value {
		Value::String(s) if !s.is_empty() => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}
