//! Session lifecycle calls: fetch, stats, info, logs, create, destroy.
//!
//! Batch calls validate their whole input first. A validation error fails the
//! call before any request is sent; after that every item gets its own
//! [`ItemOutcome`](crate::ItemOutcome) in the returned [`Correlated`] set.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fanout::FanOut;
use crate::outcome::{Correlated, ItemOutcome, correlate};
use crate::replica::expand;
use crate::transport::{Request, Transport};
use crate::validate::{CreateRequest, FetchRequest, validate_create, validate_fetch, validate_handles};

/// Opaque session identifier returned by the server on creation.
pub type SessionHandle = String;

const SESSION_PATH: &str = "session";

/// Session API bound to a transport and a fan-out executor.
#[derive(Clone)]
pub struct Sessions {
	transport: Arc<dyn Transport>,
	fanout: FanOut,
}

impl Sessions {
	pub fn new(transport: Arc<dyn Transport>, fanout: FanOut) -> Self {
		Self { transport, fanout }
	}

	/// Lists sessions matching `request`. Entries are passed through as
	/// returned by the server.
	pub async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Value>> {
		let filter = validate_fetch(request)?;
		let body = self.transport.send(Request::get(SESSION_PATH).with_query_pairs(filter.to_query())).await?;
		Ok(serde_json::from_str(&body)?)
	}

	/// Cluster-wide session statistics.
	pub async fn stats(&self) -> Result<Value> {
		let body = self.transport.send(Request::get(SESSION_PATH).with_query("view", "stats")).await?;
		Ok(serde_json::from_str(&body)?)
	}

	/// Event details per session. Bodies that are not JSON are kept as strings.
	pub async fn info<I>(&self, ids: I) -> Result<Correlated<Value>>
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		let ids = handles(ids)?;
		let requests = ids.iter().map(|id| session_request(id).with_query("view", "event")).collect();
		let outcomes = self
			.send_all(requests)
			.await
			.into_iter()
			.map(|outcome| outcome.map(|body| serde_json::from_str(&body).unwrap_or(Value::String(body))))
			.collect();
		Ok(correlate(ids, outcomes, "info"))
	}

	/// Plain-text logs per session.
	pub async fn logs<I>(&self, ids: I) -> Result<Correlated<String>>
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		let ids = handles(ids)?;
		let requests = ids.iter().map(|id| session_request(id).with_query("view", "logs")).collect();
		let outcomes = self.send_all(requests).await;
		Ok(correlate(ids, outcomes, "logs"))
	}

	/// Creates one session per replica.
	///
	/// Results are keyed by replica name (`{name}-{i}`) in replica order; a
	/// success carries the new session's handle.
	pub async fn create(&self, request: &CreateRequest) -> Result<Correlated<SessionHandle>> {
		let spec = validate_create(request)?;
		let replicas = expand(&spec);
		info!(name = %spec.name, kind = %spec.kind, replicas = replicas.len(), "creating sessions");

		let names: Vec<String> = replicas.iter().map(|replica| replica.name.clone()).collect();
		let requests: Vec<Request> = replicas
			.iter()
			.map(|replica| {
				debug!(replica = %replica.name, params = ?replica.env, "replica parameters");
				Request::post(SESSION_PATH).with_query_pairs(replica.to_query())
			})
			.collect();

		let outcomes = self
			.send_all(requests)
			.await
			.into_iter()
			.map(|outcome| ItemOutcome::from(outcome.into_result().and_then(|body| parse_handle(&body))))
			.collect();
		Ok(correlate(names, outcomes, "create"))
	}

	/// Deletes each session. Use [`Correlated::flags`] for a
	/// `handle -> destroyed` map.
	pub async fn destroy<I>(&self, ids: I) -> Result<Correlated<()>>
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		let ids = handles(ids)?;
		info!(count = ids.len(), "destroying sessions");
		let requests = ids.iter().map(|id| Request::delete(session_path(id))).collect();
		let outcomes = self.send_all(requests).await.into_iter().map(|outcome| outcome.map(|_| ())).collect();
		Ok(correlate(ids, outcomes, "destroy"))
	}

	/// Sends every request through the fan-out executor.
	async fn send_all(&self, requests: Vec<Request>) -> Vec<ItemOutcome<String>> {
		let transport = Arc::clone(&self.transport);
		self.fanout
			.execute(requests, move |request| {
				let transport = Arc::clone(&transport);
				async move { transport.send(request).await }
			})
			.await
	}
}

/// Validated handles with repeats dropped, in first-seen order.
fn handles<I>(ids: I) -> Result<Vec<String>>
where
	I: IntoIterator,
	I::Item: Into<String>,
{
	let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
	validate_handles(&ids)?;
	let mut seen = HashSet::new();
	Ok(ids.into_iter().filter(|id| seen.insert(id.clone())).collect())
}

fn session_path(id: &str) -> String {
	format!("{SESSION_PATH}/{id}")
}

fn session_request(id: &str) -> Request {
	Request::get(session_path(id))
}

/// Trims the trailing line ending the server appends to a new handle.
fn parse_handle(body: &str) -> Result<SessionHandle> {
	let handle = body.trim_end_matches(['\r', '\n']);
	if handle.trim().is_empty() {
		return Err(Error::Protocol("server returned an empty session handle".to_string()));
	}
	Ok(handle.to_string())
}
