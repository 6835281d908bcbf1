//! The poll loop: fetch the alert count, print one line, sleep, repeat.
//!
//! Failures of a single poll are reported as a line of output and never end
//! the loop. Only the shutdown future does.

use std::{future::Future, io::Write, time::Duration};

use anyhow::{Context, Result};
use prometheus::Registry;
use tokio::time::Instant;
use url::Url;

use crate::{
	metrics::PollMetrics,
	report::{extract_total, PollError, Report},
	settings::Settings,
};

pub const BANNER: &str = "Weather Alerts Monitor Started\nPress Ctrl+C to stop\n";
pub const FAREWELL: &str = "\n\nMonitor stopped by user";

pub struct Monitor {
	client: reqwest::Client,
	url: Url,
	field: String,
	poll_interval: Duration,
	metrics: PollMetrics,
}

impl Monitor {
	pub fn new(settings: &Settings, registry: &Registry) -> Result<Self> {
		let client = reqwest::Client::builder()
			.timeout(settings.request_timeout)
			.build()
			.context("failed to construct http client")?;

		let metrics = PollMetrics::new(registry).context("failed to register poll metrics")?;

		Ok(Self {
			client,
			url: settings.url.clone(),
			field: settings.field.clone(),
			poll_interval: settings.poll_interval,
			metrics,
		})
	}

	async fn fetch(&self) -> Result<Option<i64>, PollError> {
		let response = self.client.get(self.url.clone()).send().await?.error_for_status()?;
		tracing::debug!("{} responded with {}", self.url, response.status());

		let body = response.bytes().await?;

		Ok(extract_total(&body, &self.field)?)
	}

	/// polls the endpoint exactly once, failures end up in the [Report]
	pub async fn poll_once(&self) -> Report {
		let start = Instant::now();
		let outcome = self.fetch().await;
		self.metrics.record_request(start.elapsed());

		if let Err(err) = &outcome {
			tracing::debug!("poll of {} failed: {:?}", self.url, err);
		}
		self.metrics.record_outcome(&outcome);

		Report::now(outcome)
	}

	/// Main loop, runs until `shutdown` completes.
	///
	/// An in-flight request or a pending sleep is abandoned as soon as
	/// `shutdown` resolves. Only failing to write to `out` is an error.
	pub async fn run<W, S>(&self, out: &mut W, shutdown: S) -> Result<()>
	where
		W: Write,
		S: Future<Output = ()>,
	{
		tokio::pin!(shutdown);

		writeln!(out, "{}", BANNER)?;
		out.flush()?;

		tracing::debug!("polling {} every {:?}", self.url, self.poll_interval);

		loop {
			let report = tokio::select! {
				_ = &mut shutdown => break,
				report = self.poll_once() => report,
			};

			writeln!(out, "{}", report).context("failed to write report")?;
			out.flush()?;

			tokio::select! {
				_ = &mut shutdown => break,
				_ = tokio::time::sleep(self.poll_interval) => {}
			}
		}

		tracing::debug!("shutting down");

		writeln!(out, "{}", FAREWELL)?;
		out.flush()?;

		Ok(())
	}
}
