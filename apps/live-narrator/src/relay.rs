use crate::{events::ServerEvent, metrics::narration::COMMENTS_RECEIVED, voice::VoiceSettings, websocket::DashboardHub};
use live_connector::{ChatMessage, LiveEvent};
use narration::{CommentJob, JobIdGenerator, NarrationQueue};
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// How many recent comments a newly opened dashboard is replayed.
pub const RECENT_COMMENTS: usize = 50;

/// Routes live session events to the dashboards and the narration queue.
#[derive(Clone)]
pub struct CommentRelay {
	ids: Arc<JobIdGenerator>,
	queue: NarrationQueue,
	voice: VoiceSettings,
	hub: DashboardHub,
	recent: Arc<RwLock<VecDeque<CommentJob>>>,
	room_id: Arc<RwLock<Option<String>>>,
}

impl CommentRelay {
	pub fn new(queue: NarrationQueue, voice: VoiceSettings, hub: DashboardHub) -> Self {
		Self {
			ids: Arc::new(JobIdGenerator::new()),
			queue,
			voice,
			hub,
			recent: Arc::new(RwLock::new(VecDeque::with_capacity(RECENT_COMMENTS))),
			room_id: Arc::new(RwLock::new(None)),
		}
	}

	pub async fn handle(&self, event: LiveEvent) {
		match event {
			LiveEvent::Chat(chat) => self.on_chat(chat).await,
			LiveEvent::ViewerCount(count) => {
				info!("👀 Viewers now: {}", count);
				self.hub.broadcast(ServerEvent::ViewerCount { count });
			}
			LiveEvent::Connected { room_id: Some(room_id) } => {
				info!("🏠 Room ID: {}", room_id);
				*self.room_id.write().await = Some(room_id.clone());
				self.hub.broadcast(ServerEvent::RoomInfo { room_id });
			}
			LiveEvent::Connected { room_id: None } => debug!("Live session confirmed without a room id"),
			LiveEvent::Disconnected { .. } => debug!("Disconnect is reported by the session manager"),
		}
	}

	async fn on_chat(&self, chat: ChatMessage) {
		let job = CommentJob::new(self.ids.next_id(), chat.user, chat.nickname, chat.comment, chat.avatar_url);
		info!(comment_id = %job.id, "💬 {} (@{}): {}", job.nickname, job.user, job.text);
		COMMENTS_RECEIVED.inc();

		self.hub.broadcast(ServerEvent::NewComment(job.clone()));
		self.remember(job.clone()).await;

		if self.voice.is_enabled() && job.is_narratable() {
			let count = self.queue.enqueue(job);
			info!(queue_len = count, "➕ Added to queue ({} comments waiting)", count);
			self.hub.broadcast(ServerEvent::QueueUpdate { count });
		}
	}

	async fn remember(&self, job: CommentJob) {
		let mut recent = self.recent.write().await;
		if recent.len() == RECENT_COMMENTS {
			recent.pop_front();
		}
		recent.push_back(job);
	}

	/// Recent comments, oldest first.
	pub async fn recent_comments(&self) -> Vec<CommentJob> {
		self.recent.read().await.iter().cloned().collect()
	}

	pub async fn room_id(&self) -> Option<String> {
		self.room_id.read().await.clone()
	}

	/// Forget room state of the previous channel.
	pub async fn reset_room(&self) {
		*self.room_id.write().await = None;
	}
}
