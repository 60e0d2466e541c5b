//! Error types for the Skaha client.

use std::path::PathBuf;

use thiserror::Error;

use crate::validate::ValidationError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the client.
///
/// Batch operations never return transport or decoding errors directly; those
/// surface per item inside [`ItemOutcome::Failure`](crate::ItemOutcome).
#[derive(Debug, Error)]
pub enum Error {
	/// Request rejected before any network call was made.
	#[error(transparent)]
	Validation(#[from] ValidationError),

	/// Server answered with a non-2xx status.
	#[error("server returned HTTP {status}: {body}")]
	Status { status: u16, body: String },

	/// Connection, TLS or timeout failure inside the HTTP client.
	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	/// Server answered 2xx with a payload the client cannot use.
	#[error("unexpected response: {0}")]
	Protocol(String),

	#[error("invalid server URL '{url}': {reason}")]
	InvalidServerUrl { url: String, reason: String },

	#[error("invalid certificate {}: {reason}", .path.display())]
	InvalidCertificate { path: PathBuf, reason: String },

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// The batch was cancelled before this item completed.
	#[error("operation cancelled")]
	Cancelled,

	/// The item's operation panicked.
	#[error("batch item panicked: {0}")]
	Panicked(String),

	/// No outcome was recorded for the item at this position.
	#[error("no outcome recorded for batch item {0}")]
	MissingOutcome(usize),
}

impl Error {
	/// Returns `true` if the request never reached the network.
	pub fn is_validation(&self) -> bool {
		matches!(self, Error::Validation(_))
	}

	pub fn is_cancelled(&self) -> bool {
		matches!(self, Error::Cancelled)
	}

	/// Returns `true` for transport timeouts.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Http(err) if err.is_timeout())
	}

	/// HTTP status for [`Error::Status`], if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Error::Status { status, .. } => Some(*status),
			Error::Http(err) => err.status().map(|s| s.as_u16()),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_error_reports_code() {
		let err = Error::Status {
			status: 404,
			body: "session not found".to_string(),
		};
		assert_eq!(err.status(), Some(404));
		assert_eq!(err.to_string(), "server returned HTTP 404: session not found");
		assert!(!err.is_validation());
	}

	#[test]
	fn validation_error_is_transparent() {
		let err = Error::from(ValidationError::Empty { field: "name" });
		assert!(err.is_validation());
		assert_eq!(err.to_string(), "name must not be empty");
	}

	#[test]
	fn certificate_error_names_path() {
		let err = Error::InvalidCertificate {
			path: PathBuf::from("/tmp/missing.pem"),
			reason: "not a file".to_string(),
		};
		assert_eq!(err.to_string(), "invalid certificate /tmp/missing.pem: not a file");
	}
}
