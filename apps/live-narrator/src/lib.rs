use crate::{
	events::ServerEvent,
	metrics::narration::{MeteredFallback, MeteredSynthesizer},
	relay::CommentRelay,
	session::LiveSessionManager,
	voice::VoiceSettings,
	websocket::DashboardHub,
};
use axum::{extract::FromRef, middleware, Router};
use live_connector::{LiveConnector, RelayConnector};
use narration::{AudioPlayer, GoogleTts, NarrationQueue, PlaybackBackend, SpeechSynthesizer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod relay;
pub mod routes;
pub mod session;
pub mod voice;
pub mod websocket;

pub use config::Config;
pub use error::{Error, SessionError};
pub use health::perform_health_check;

/// Core: configuration and process lifecycle
#[derive(Clone)]
pub struct CoreContext {
	pub config: Arc<Config>,
	pub cancel_token: CancellationToken,
}

/// Narration: the read-aloud pipeline and its on/off switch
#[derive(Clone)]
pub struct NarrationContext {
	pub queue: NarrationQueue,
	pub voice: VoiceSettings,
}

/// Realtime: the upstream live session and the dashboards fed from it
#[derive(Clone)]
pub struct RealtimeContext {
	pub hub: DashboardHub,
	pub relay: CommentRelay,
	pub session: LiveSessionManager,
}

#[derive(Clone)]
pub struct AppState {
	pub core: CoreContext,
	pub narration: NarrationContext,
	pub realtime: RealtimeContext,
}

impl AppState {
	/// Wire the production services from configuration.
	pub async fn build(config: Arc<Config>, cancel_token: CancellationToken) -> Result<Self, Error> {
		tokio::fs::create_dir_all(&config.audio_dir).await?;

		let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(GoogleTts::new(config.tts())?);
		let connector: Arc<dyn LiveConnector> = Arc::new(RelayConnector::new(config.relay()));
		let (primary, fallback) = AudioPlayer::platform_backends();
		let (primary_timeout, fallback_timeout) = config.playback_timeouts();
		let player = metered_player(primary, fallback).with_timeouts(primary_timeout, fallback_timeout);

		Ok(Self::from_parts(config, cancel_token, connector, synthesizer, player))
	}

	/// Wire the application around the given collaborators.
	pub fn from_parts(config: Arc<Config>, cancel_token: CancellationToken, connector: Arc<dyn LiveConnector>, synthesizer: Arc<dyn SpeechSynthesizer>, player: AudioPlayer) -> Self {
		let hub = DashboardHub::new();
		let voice = VoiceSettings::new(config.voice_enabled);

		let queue = NarrationQueue::new(Arc::new(MeteredSynthesizer::new(synthesizer)), player, Arc::new(hub.clone()), config.narration());
		let relay = CommentRelay::new(queue.clone(), voice.clone(), hub.clone());
		let session = LiveSessionManager::new(connector, relay.clone(), hub.clone(), cancel_token.clone());

		Self {
			core: CoreContext { config, cancel_token },
			narration: NarrationContext { queue, voice },
			realtime: RealtimeContext { hub, relay, session },
		}
	}

	/// State a freshly opened dashboard is brought up to date with.
	pub async fn snapshot(&self) -> Vec<ServerEvent> {
		let mut events = vec![
			ServerEvent::ConnectionStatus(self.realtime.session.status().await),
			ServerEvent::VoiceStatus {
				enabled: self.narration.voice.is_enabled(),
			},
			ServerEvent::QueueUpdate {
				count: self.narration.queue.len(),
			},
		];

		if let Some(room_id) = self.realtime.relay.room_id().await {
			events.push(ServerEvent::RoomInfo { room_id });
		}

		events.extend(self.realtime.relay.recent_comments().await.into_iter().map(ServerEvent::NewComment));
		events
	}
}

/// Wrap the fallback backend of a player so fallback use is counted.
pub fn metered_player(primary: Arc<dyn PlaybackBackend>, fallback: Arc<dyn PlaybackBackend>) -> AudioPlayer {
	AudioPlayer::new(primary, Arc::new(MeteredFallback::new(fallback)))
}

impl FromRef<AppState> for LiveSessionManager {
	fn from_ref(state: &AppState) -> Self {
		state.realtime.session.clone()
	}
}

/// Every route the server exposes, with the dashboard assets as fallback.
pub fn build_router(state: AppState) -> Router {
	let public_dir = state.core.config.public_dir.clone();

	Router::new()
		.merge(routes::connect::get_connect())
		.merge(routes::health::get_health())
		.merge(routes::ws::get_ws())
		.merge(routes::metrics::get_metrics())
		.fallback_service(ServeDir::new(public_dir))
		.with_state(state)
		.layer(middleware::from_fn(metrics::http::metrics_middleware))
		.layer(TraceLayer::new_for_http())
}
