use clap::{ArgAction, Parser};
use live_connector::RelayConfig;
use narration::{CleanupPolicy, GoogleTtsConfig, NarrationConfig};
use std::{path::PathBuf, time::Duration};

pub const DEFAULT_LOG_FILTER: &str = "live_narrator=info,narration=info,live_connector=info,tower_http=info";

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
	/// Use JSON formatting for tracing
	#[arg(long, env = "LOG_JSON", default_value = "false")]
	pub log_json: bool,

	/// Tracing filter directives
	#[arg(long, env = "RUST_LOG", default_value = DEFAULT_LOG_FILTER)]
	pub rust_log: String,

	/// Server host
	#[arg(long, env = "HOST", default_value = "127.0.0.1")]
	pub host: String,

	/// Server port
	#[arg(long, env = "PORT", default_value = "3000")]
	pub port: u16,

	/// Live channel to connect to at startup
	#[arg(long, env = "LIVE_CHANNEL")]
	pub channel: Option<String>,

	/// Websocket relay forwarding the live platform's events
	#[arg(long, env = "LIVE_RELAY_URL", default_value = live_connector::DEFAULT_RELAY_URL)]
	pub relay_url: String,

	/// Relay connection timeout in seconds
	#[arg(long, env = "LIVE_CONNECT_TIMEOUT_SECS", default_value = "15")]
	pub connect_timeout_secs: u64,

	/// Working directory for synthesized audio
	#[arg(long, env = "AUDIO_DIR", default_value = "./audio")]
	pub audio_dir: PathBuf,

	/// Dashboard static assets
	#[arg(long, env = "PUBLIC_DIR", default_value = "./public")]
	pub public_dir: PathBuf,

	/// Speech synthesis endpoint
	#[arg(long, env = "TTS_URL", default_value = narration::synth::DEFAULT_TTS_URL)]
	pub tts_url: String,

	/// Speech synthesis language
	#[arg(long, env = "TTS_LANG", default_value = narration::synth::DEFAULT_TTS_LANGUAGE)]
	pub tts_lang: String,

	/// Speech synthesis timeout in seconds
	#[arg(long, env = "TTS_TIMEOUT_SECS", default_value = "10")]
	pub tts_timeout_secs: u64,

	/// Fallback player timeout in seconds
	#[arg(long, env = "FALLBACK_TIMEOUT_SECS", default_value = "30")]
	pub fallback_timeout_secs: u64,

	/// Primary player ceiling in seconds
	#[arg(long, env = "PRIMARY_TIMEOUT_SECS", default_value = "120")]
	pub primary_timeout_secs: u64,

	/// Delay before a played audio file is deleted (0 deletes immediately)
	#[arg(long, env = "CLEANUP_DELAY_MS", default_value = "2000")]
	pub cleanup_delay_ms: u64,

	/// Pause between two narrated comments
	#[arg(long, env = "INTER_COMMENT_DELAY_MS", default_value = "500")]
	pub inter_comment_delay_ms: u64,

	/// Read comments aloud at startup
	#[arg(long, env = "VOICE_ENABLED", default_value = "true", action = ArgAction::Set)]
	pub voice_enabled: bool,

	/// Check a running instance's /health and exit
	#[arg(long)]
	pub health_check: bool,
}

impl Config {
	pub fn bind_addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}

	pub const fn narration(&self) -> NarrationConfig {
		NarrationConfig {
			inter_comment_delay: Duration::from_millis(self.inter_comment_delay_ms),
			cleanup: CleanupPolicy::from_millis(self.cleanup_delay_ms),
		}
	}

	pub fn tts(&self) -> GoogleTtsConfig {
		GoogleTtsConfig {
			endpoint: self.tts_url.clone(),
			language: self.tts_lang.clone(),
			timeout: Duration::from_secs(self.tts_timeout_secs),
			audio_dir: self.audio_dir.clone(),
		}
	}

	pub fn relay(&self) -> RelayConfig {
		RelayConfig {
			url: self.relay_url.clone(),
			connect_timeout: Duration::from_secs(self.connect_timeout_secs),
			..RelayConfig::default()
		}
	}

	/// `(primary, fallback)` playback bounds.
	pub const fn playback_timeouts(&self) -> (Duration, Duration) {
		(Duration::from_secs(self.primary_timeout_secs), Duration::from_secs(self.fallback_timeout_secs))
	}
}
