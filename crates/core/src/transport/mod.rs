//! Request transport abstraction.
//!
//! Every API facade builds a [`Request`] and hands it to a [`Transport`].
//! [`HttpTransport`] talks to a real server; [`fake`] answers from an
//! in-memory handler for tests.

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

pub mod fake;
mod http;

pub use http::HttpTransport;

/// HTTP verb used by the Skaha API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	Get,
	Post,
	Delete,
}

impl Method {
	pub fn as_str(&self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Delete => "DELETE",
		}
	}
}

impl std::fmt::Display for Method {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One API call, relative to the server's versioned base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
	pub method: Method,
	/// Path below the base URL, e.g. `session` or `session/abc123`.
	pub path: String,
	/// Query pairs; keys may repeat.
	pub query: Vec<(String, String)>,
	/// Resolve `path` under `{server}/{version}/` rather than `{server}/`.
	pub versioned: bool,
}

impl Request {
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			versioned: true,
		}
	}

	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Resolves the path against the service root, for endpoints such as
	/// `availability` that are not part of the versioned API.
	pub fn unversioned(mut self) -> Self {
		self.versioned = false;
		self
	}

	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));
		self
	}

	pub fn with_query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
		self.query.extend(pairs);
		self
	}

	/// First query value for `key`.
	pub fn query_value(&self, key: &str) -> Option<&str> {
		self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	/// All query values for `key`, in order.
	pub fn query_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.query.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
	}
}

/// Sends requests and returns the raw 2xx response body.
///
/// Non-2xx answers are reported as [`Error::Status`](crate::Error::Status).
pub trait Transport: Send + Sync {
	fn send(&self, request: Request) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn request_helpers_find_values() {
		let request = Request::post("session")
			.with_query("view", "event")
			.with_query_pairs([("env".to_string(), "A=1".to_string()), ("name".to_string(), "x".to_string()), ("env".to_string(), "B=2".to_string())]);
		assert_eq!(request.method.to_string(), "POST");
		assert!(request.versioned);
		assert!(!Request::get("availability").unversioned().versioned);
		assert_eq!(request.query_value("view"), Some("event"));
		assert_eq!(request.query_value("missing"), None);
		assert_eq!(request.query_values("env").collect::<Vec<_>>(), vec!["A=1", "B=2"]);
	}
}
