//! prometheus meters for the poll loop

use std::time::Duration;

use prometheus::{
	exponential_buckets, histogram_opts, opts, register_histogram_with_registry,
	register_int_counter_vec_with_registry, register_int_gauge_with_registry, Histogram,
	IntCounterVec, IntGauge, Registry,
};

use crate::report::PollError;

#[derive(Debug, Clone)]
/// prometheus meters for the poll loop
pub(crate) struct PollMetrics {
	/// number of polls, labeled by outcome
	polls: IntCounterVec,
	/// last alert count reported by the endpoint
	active_alerts: IntGauge,
	/// time spent on a single request, body included
	request_duration: Histogram,
}

impl PollMetrics {
	/// construct prometheus meters
	pub(crate) fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
		let polls = register_int_counter_vec_with_registry!(
			opts!("polls_total", "total number of polls").namespace("nws_alerts").subsystem("monitor"),
			&["outcome"],
			registry
		)?;

		let active_alerts = register_int_gauge_with_registry!(
			opts!("active_alerts", "number of active alerts seen on the last successful poll")
				.namespace("nws_alerts")
				.subsystem("monitor"),
			registry
		)?;

		let request_duration = register_histogram_with_registry!(
			histogram_opts!(
				"request_duration_seconds",
				"total time of a poll request in seconds",
				exponential_buckets(0.01, 2., 12)?
			)
			.namespace("nws_alerts")
			.subsystem("monitor"),
			registry
		)?;

		Ok(Self { polls, active_alerts, request_duration })
	}

	pub(crate) fn record_request(&self, duration: Duration) {
		self.request_duration.observe(duration.as_secs_f64());
	}

	/// counts the poll and remembers the alert count if there is one
	pub(crate) fn record_outcome(&self, outcome: &Result<Option<i64>, PollError>) {
		let label = match outcome {
			Ok(total) => {
				if let Some(total) = total {
					self.active_alerts.set(*total);
				}
				"ok"
			}
			Err(err) => err.kind(),
		};

		self.polls.with_label_values(&[label]).inc();
	}
}
