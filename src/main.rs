//! watches the number of active weather alerts issued by the National Weather Service
//!
//! Features:
//! - polls the alert count endpoint at a fixed interval and prints one timestamped line per poll
//! - failed polls are printed as errors and retried on the next interval
//! - optional prometheus endpoint exposing the poll outcomes

use anyhow::{Context, Result};
use monitor::Monitor;
use prometheus::Registry;
use settings::Settings;
use tokio::signal;

mod log;
mod metrics;
mod monitor;
mod report;
mod settings;
mod telemetry_endpoint;

/// exit the complete program if one thread panics
fn setup_panic_handler() {
	let default_panic = std::panic::take_hook();
	std::panic::set_hook(Box::new(move |info| {
		default_panic(info);
		std::process::exit(1);
	}));
}

/// resolves on the first interrupt, never if listening for it fails
async fn interrupted() {
	if let Err(err) = signal::ctrl_c().await {
		tracing::error!("failed to listen for interrupt signal: {}", err);
		std::future::pending::<()>().await;
	}
}

/// the entry point of the program
#[tokio::main]
pub async fn main() -> Result<()> {
	setup_panic_handler();

	log::setup_logging().context("could not setup logging")?;

	let settings = Settings::global();
	let registry = Registry::new();

	let monitor = Monitor::new(settings, &registry).context("failed to construct monitor")?;

	if let Some(telemetry_settings) = settings.telemetry_endpoint.clone() {
		let registry = registry.clone();
		tokio::spawn(async move {
			if let Err(err) =
				telemetry_endpoint::run_telemetry_endpoint(telemetry_settings, registry).await
			{
				tracing::error!("{:#}", err);
			}
		});
	}

	let mut stdout = std::io::stdout();
	monitor.run(&mut stdout, interrupted()).await
}
