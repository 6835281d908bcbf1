use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use config::Config;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_with::{serde_as, DurationSecondsWithFrac};
use url::Url;

use crate::{log::LogSettings, telemetry_endpoint::TelemetryEndpointSettings};

static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// endpoint returning the number of currently active NWS alerts
pub const DEFAULT_URL: &str = "https://api.weather.gov/alerts/active/count";

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
	/// the polled endpoint
	#[serde(default = "default_url")]
	pub url: Url,
	/// upper bound for a single request, connecting and reading the body included
	#[serde_as(as = "DurationSecondsWithFrac<f64>")]
	#[serde(default = "default_request_timeout")]
	pub request_timeout: Duration,
	/// pause between the end of one poll and the start of the next one
	#[serde_as(as = "DurationSecondsWithFrac<f64>")]
	#[serde(default = "default_poll_interval")]
	pub poll_interval: Duration,
	/// key of the response object holding the alert count
	#[serde(default = "default_field")]
	pub field: String,
	#[serde(default)]
	pub log: LogSettings,
	/// prometheus endpoint, disabled if missing
	#[serde(default)]
	pub telemetry_endpoint: Option<TelemetryEndpointSettings>,
}

#[allow(clippy::expect_used)]
fn default_url() -> Url {
	Url::parse(DEFAULT_URL).expect("DEFAULT_URL is a valid url")
}

fn default_request_timeout() -> Duration {
	Duration::from_secs(5)
}

fn default_poll_interval() -> Duration {
	Duration::from_secs(10)
}

fn default_field() -> String {
	"total".to_owned()
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			url: default_url(),
			request_timeout: default_request_timeout(),
			poll_interval: default_poll_interval(),
			field: default_field(),
			log: LogSettings::default(),
			telemetry_endpoint: None,
		}
	}
}

impl Settings {
	pub fn global() -> &'static Self {
		SETTINGS.get_or_init(|| {
			match Self::load().context("failed to load config and command line arguments") {
				Ok(settings) => settings,
				Err(err) => {
					// tracing wasn't setup yet
					panic!("{:#?}", err);
				}
			}
		})
	}

	fn load() -> Result<Self> {
		let opts = Command::new(clap::crate_name!())
			.version(clap::crate_version!())
			.about(clap::crate_description!())
			.author(clap::crate_authors!())
			.args([
				Arg::new("config")
					.help("path of config file, a missing file means all defaults")
					.takes_value(true)
					.short('c')
					.long("config")
					.default_value("./config.yaml"),
				Arg::new("level")
					.help("log level")
					.possible_values(["error", "warn", "info", "debug", "trace"])
					.ignore_case(true)
					.takes_value(true)
					.long("log"),
			])
			.get_matches();

		let config_path = opts.value_of("config").context("missing config path")?;

		let mut settings = Self::from_file(config_path)?;

		if let Some(level) = opts.value_of("level") {
			settings.log.level = level.to_string();
		}

		Ok(settings)
	}

	/// reads the settings from `path`, a missing file yields the defaults
	pub fn from_file(path: &str) -> Result<Self> {
		Config::builder()
			.add_source(config::File::with_name(path).required(false))
			.build()
			.context("can't load config")?
			.try_deserialize()
			.context("can't load config")
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	fn write_config(name: &str, content: &str) -> std::path::PathBuf {
		let path = std::env::temp_dir().join(format!("{}-{}.yaml", name, std::process::id()));
		let mut file = std::fs::File::create(&path).unwrap();
		file.write_all(content.as_bytes()).unwrap();
		path
	}

	#[test]
	fn missing_file_yields_defaults() {
		let settings = Settings::from_file("/nonexistent/nws-alerts-monitor/config.yaml").unwrap();

		assert_eq!(settings.url.as_str(), DEFAULT_URL);
		assert_eq!(settings.request_timeout, Duration::from_secs(5));
		assert_eq!(settings.poll_interval, Duration::from_secs(10));
		assert_eq!(settings.field, "total");
		assert_eq!(settings.log.level, "warn");
		assert!(settings.telemetry_endpoint.is_none());
	}

	#[test]
	fn file_overrides_defaults() {
		let path = write_config(
			"nws-alerts-monitor-overrides",
			"url: http://127.0.0.1:8080/count\n\
			 poll_interval: 2.5\n\
			 log:\n  level: debug\n\
			 telemetry_endpoint:\n  bind_address: 127.0.0.1\n  port: 9100\n",
		);

		let settings = Settings::from_file(path.to_str().unwrap()).unwrap();
		std::fs::remove_file(&path).unwrap();

		assert_eq!(settings.url.as_str(), "http://127.0.0.1:8080/count");
		assert_eq!(settings.poll_interval, Duration::from_millis(2500));
		assert_eq!(settings.request_timeout, Duration::from_secs(5));
		assert_eq!(settings.log.level, "debug");

		let telemetry = settings.telemetry_endpoint.unwrap();
		assert_eq!(telemetry.to_socket_addr().to_string(), "127.0.0.1:9100");
	}

	#[test]
	fn sub_second_durations_are_kept() {
		let path = write_config(
			"nws-alerts-monitor-sub-second",
			"request_timeout: 0.4\npoll_interval: 0.25\n",
		);

		let settings = Settings::from_file(path.to_str().unwrap()).unwrap();
		std::fs::remove_file(&path).unwrap();

		assert_eq!(settings.request_timeout, Duration::from_millis(400));
		assert_eq!(settings.poll_interval, Duration::from_millis(250));
	}

	#[test]
	fn invalid_url_is_rejected() {
		let path = write_config("nws-alerts-monitor-invalid", "url: not a url\n");

		let result = Settings::from_file(path.to_str().unwrap());
		std::fs::remove_file(&path).unwrap();

		assert!(result.is_err());
	}
}
