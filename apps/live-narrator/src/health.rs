use crate::Config;
use anyhow::{bail, Context, Result};
use std::time::Duration;

/// URL of the local instance's health route. Wildcard binds are checked over loopback.
pub fn health_url(config: &Config) -> String {
	let host = match config.host.as_str() {
		"0.0.0.0" | "::" | "[::]" => "127.0.0.1",
		host => host,
	};
	format!("http://{}:{}/health", host, config.port)
}

/// Check a running server; an `Err` makes the process exit non-zero.
pub async fn perform_health_check(config: &Config) -> Result<()> {
	let url = health_url(config);

	let response = reqwest::Client::new()
		.get(&url)
		.timeout(Duration::from_secs(10))
		.send()
		.await
		.with_context(|| format!("Health check failed: {url} unreachable"))?;

	if !response.status().is_success() {
		bail!("Health check failed: HTTP {}", response.status());
	}

	println!("Health check passed");
	Ok(())
}
