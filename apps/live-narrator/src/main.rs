use anyhow::Result;
use clap::Parser;
use live_narrator::{build_router, perform_health_check, AppState, Config};
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{filter::EnvFilter, fmt::format::JsonFields, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> Result<()> {
	dotenv::dotenv().ok();
	let config = Config::parse();

	if config.health_check {
		return perform_health_check(&config).await;
	}

	init_tracing(&config)?;

	let config = Arc::new(config);
	let shutdown_token = CancellationToken::new();

	let app_state = AppState::build(config.clone(), shutdown_token.clone()).await?;
	let app = build_router(app_state.clone());

	let listener = TcpListener::bind(config.bind_addr()).await?;
	tracing::info!("🚀 Server running at http://{}", listener.local_addr()?);
	tracing::info!("🔊 Voice: {}", if app_state.narration.voice.is_enabled() { "ON" } else { "OFF" });

	let signal_shutdown_token = shutdown_token.clone();
	tokio::spawn(async move {
		tokio::signal::ctrl_c().await.ok();
		tracing::info!("Received Ctrl+C, initiating shutdown...");
		signal_shutdown_token.cancel();
	});

	if let Some(channel) = config.channel.clone() {
		let session = app_state.realtime.session.clone();
		tokio::spawn(async move {
			// Failures are already broadcast to dashboards; the server keeps running
			if let Err(e) = session.switch_channel(&channel).await {
				tracing::warn!("Startup connect to {} failed: {}", channel, e);
			}
		});
	}

	let server_token = shutdown_token.clone();
	let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).with_graceful_shutdown(async move {
		server_token.cancelled().await;
	});

	server.await?;
	tracing::info!("Server stopped");

	tracing::info!("Starting cleanup...");
	let cleanup = async {
		app_state.realtime.session.disconnect().await;
		tracing::info!("Live session closed");
	};

	match tokio::time::timeout(Duration::from_secs(5), cleanup).await {
		Ok(()) => tracing::info!("Graceful shutdown completed"),
		Err(_) => tracing::error!("Shutdown timeout - forcing exit"),
	}

	tracing::info!("Shutdown complete");
	Ok(())
}

fn init_tracing(config: &Config) -> Result<()> {
	use tracing_subscriber::layer::SubscriberExt;

	let filter = EnvFilter::try_new(&config.rust_log)?;

	tracing_subscriber::registry()
		.with(if config.log_json {
			Box::new(
				tracing_subscriber::fmt::layer()
					.fmt_fields(JsonFields::default())
					.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false))
					.with_filter(filter),
			) as Box<dyn Layer<_> + Send + Sync>
		} else {
			Box::new(
				tracing_subscriber::fmt::layer()
					.event_format(tracing_subscriber::fmt::format().pretty())
					.with_filter(filter),
			)
		})
		.try_init()?;
	Ok(())
}
