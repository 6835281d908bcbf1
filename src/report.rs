//! the outcome of a single poll and the line printed for it

use std::fmt;

use chrono::{DateTime, Local};
use serde_json::Value;
use thiserror::Error;

/// `MM/DD/YYYY HH:MM:SS`
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// printed in place of the count if the response lacks it
pub const MISSING_TOTAL: &str = "N/A";

/// Error occurring while interpreting a response body
#[derive(Error, Debug)]
pub enum ParseError {
	/// the body is not valid JSON
	#[error(transparent)]
	InvalidJson(#[from] serde_json::Error),
	/// the body is valid JSON but not an object
	#[error("expected a JSON object, found {0}")]
	NotAnObject(&'static str),
	/// the field is present but doesn't hold an integer
	#[error("expected an integer for field `{field}`, found {value}")]
	NotAnInteger { field: String, value: Value },
}

/// the two ways a poll can fail, neither of them ends the poll loop
#[derive(Error, Debug)]
pub enum PollError {
	/// no usable response: timeout, connection or DNS failure, non-success status
	#[error("Error fetching alerts: {0}")]
	Fetch(#[from] reqwest::Error),
	/// the response body could not be interpreted
	#[error("Error parsing response: {0}")]
	Parse(#[from] ParseError),
}

impl PollError {
	/// label used for the `outcome` metric dimension
	pub fn kind(&self) -> &'static str {
		match self {
			PollError::Fetch(_) => "fetch_error",
			PollError::Parse(_) => "parse_error",
		}
	}
}

fn json_type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

/// Looks up `field` in the JSON object `body`.
///
/// A missing field or an explicit `null` is not an error and yields
/// [None].
pub fn extract_total(body: &[u8], field: &str) -> Result<Option<i64>, ParseError> {
	let value: Value = serde_json::from_slice(body)?;

	let object = match value {
		Value::Object(object) => object,
		other => return Err(ParseError::NotAnObject(json_type_name(&other))),
	};

	match object.get(field) {
		None | Some(Value::Null) => Ok(None),
		Some(value) => value.as_i64().map(Some).ok_or_else(|| ParseError::NotAnInteger {
			field: field.to_owned(),
			value: value.clone(),
		}),
	}
}

/// one line of output, produced once per poll
#[derive(Debug)]
pub struct Report {
	pub timestamp: DateTime<Local>,
	pub outcome: Result<Option<i64>, PollError>,
}

impl Report {
	/// stamps `outcome` with the current local time
	pub fn now(outcome: Result<Option<i64>, PollError>) -> Self {
		Self { timestamp: Local::now(), outcome }
	}
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} – ", self.timestamp.format(TIMESTAMP_FORMAT))?;

		match &self.outcome {
			Ok(Some(total)) => write!(f, "Total {} active alerts", total),
			Ok(None) => write!(f, "Total {} active alerts", MISSING_TOTAL),
			Err(err) => write!(f, "{}", err),
		}
	}
}
