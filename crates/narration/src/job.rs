use chrono::{Local, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
	fmt,
	str::FromStr,
	sync::atomic::{AtomicU64, Ordering},
};

/// Identifier of a comment job.
///
/// Combines the arrival time in unix milliseconds with a sequence number drawn
/// from a [`JobIdGenerator`], so two comments arriving in the same millisecond
/// still get distinct ids. Rendered as `"<millis>-<seq>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId {
	arrived_ms: i64,
	seq: u64,
}

impl JobId {
	pub const fn new(arrived_ms: i64, seq: u64) -> Self {
		Self { arrived_ms, seq }
	}

	pub const fn arrived_ms(&self) -> i64 {
		self.arrived_ms
	}

	pub const fn seq(&self) -> u64 {
		self.seq
	}
}

impl fmt::Display for JobId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}-{}", self.arrived_ms, self.seq)
	}
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid job id: {0}")]
pub struct ParseJobIdError(String);

impl FromStr for JobId {
	type Err = ParseJobIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (millis, seq) = s.split_once('-').ok_or_else(|| ParseJobIdError(s.to_string()))?;
		let arrived_ms = millis.parse().map_err(|_| ParseJobIdError(s.to_string()))?;
		let seq = seq.parse().map_err(|_| ParseJobIdError(s.to_string()))?;
		Ok(Self { arrived_ms, seq })
	}
}

impl Serialize for JobId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for JobId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(serde::de::Error::custom)
	}
}

/// Hands out collision-free [`JobId`]s.
#[derive(Debug)]
pub struct JobIdGenerator {
	next_seq: AtomicU64,
}

impl JobIdGenerator {
	pub const fn new() -> Self {
		Self { next_seq: AtomicU64::new(1) }
	}

	pub fn next_id(&self) -> JobId {
		let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
		JobId::new(Utc::now().timestamp_millis(), seq)
	}
}

impl Default for JobIdGenerator {
	fn default() -> Self {
		Self::new()
	}
}

/// One live comment awaiting or undergoing narration.
///
/// Serializes to the dashboard's `new-comment` payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentJob {
	pub id: JobId,
	pub user: String,
	pub nickname: String,
	#[serde(rename = "comment")]
	pub text: String,
	#[serde(rename = "profilePictureUrl")]
	pub avatar_url: String,
	#[serde(rename = "timestamp")]
	pub arrival_timestamp: String,
}

impl CommentJob {
	/// Build a job stamped with the current local wall-clock time (`HH:MM:SS`).
	pub fn new(id: JobId, user: impl Into<String>, nickname: impl Into<String>, text: impl Into<String>, avatar_url: impl Into<String>) -> Self {
		Self {
			id,
			user: user.into(),
			nickname: nickname.into(),
			text: text.into(),
			avatar_url: avatar_url.into(),
			arrival_timestamp: Local::now().format("%H:%M:%S").to_string(),
		}
	}

	/// Whether there is anything to read aloud.
	pub fn is_narratable(&self) -> bool {
		!self.text.trim().is_empty()
	}
}
