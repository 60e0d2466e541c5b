//! In-memory transport for testing batch semantics without a server.
//!
//! # Example
//!
//! ```ignore
//! let (transport, controller) = FakeTransportBuilder::new()
//!     .handler(|request| match request.method {
//!         Method::Delete if request.path.ends_with("h2") => Err(Error::Status { status: 404, body: "gone".into() }),
//!         _ => Ok(String::new()),
//!     })
//!     .build();
//! let client = SkahaClient::with_transport(transport, 8);
//! client.sessions().destroy(["h1", "h2"]).await?;
//! assert_eq!(controller.sent_count(), 2);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::{Request, Transport};
use crate::error::Result;

type Handler = Arc<dyn Fn(&Request) -> Result<String> + Send + Sync>;

/// Builder for [`FakeTransport`] instances.
pub struct FakeTransportBuilder {
	handler: Handler,
	latency: Option<Duration>,
}

impl FakeTransportBuilder {
	/// Answers every request with an empty body until a handler is set.
	pub fn new() -> Self {
		Self {
			handler: Arc::new(|_| Ok(String::new())),
			latency: None,
		}
	}

	/// Sets the function that produces each response.
	pub fn handler(mut self, handler: impl Fn(&Request) -> Result<String> + Send + Sync + 'static) -> Self {
		self.handler = Arc::new(handler);
		self
	}

	/// Delays every response, so concurrent requests overlap.
	pub fn latency(mut self, latency: Duration) -> Self {
		self.latency = Some(latency);
		self
	}

	/// Returns the transport and a controller for inspecting what was sent.
	pub fn build(self) -> (Arc<FakeTransport>, FakeTransportController) {
		let state = Arc::new(FakeState::default());
		let transport = Arc::new(FakeTransport {
			handler: self.handler,
			latency: self.latency,
			state: Arc::clone(&state),
		});
		(transport, FakeTransportController { state })
	}
}

impl Default for FakeTransportBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Default)]
struct FakeState {
	sent: Mutex<Vec<Request>>,
	in_flight: AtomicUsize,
	peak_in_flight: AtomicUsize,
}

/// Transport that records requests and answers through a handler.
pub struct FakeTransport {
	handler: Handler,
	latency: Option<Duration>,
	state: Arc<FakeState>,
}

impl Transport for FakeTransport {
	fn send(&self, request: Request) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
		Box::pin(async move {
			let current = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
			self.state.peak_in_flight.fetch_max(current, Ordering::SeqCst);
			self.state.sent.lock().push(request.clone());

			if let Some(latency) = self.latency {
				tokio::time::sleep(latency).await;
			}
			let response = (self.handler)(&request);

			self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
			response
		})
	}
}

/// Inspects requests sent through a [`FakeTransport`].
#[derive(Clone)]
pub struct FakeTransportController {
	state: Arc<FakeState>,
}

impl FakeTransportController {
	/// Take all sent requests, clearing the buffer.
	pub fn take_sent(&self) -> Vec<Request> {
		std::mem::take(&mut *self.state.sent.lock())
	}

	pub fn sent_count(&self) -> usize {
		self.state.sent.lock().len()
	}

	/// Highest number of requests observed in flight at once.
	pub fn peak_in_flight(&self) -> usize {
		self.state.peak_in_flight.load(Ordering::SeqCst)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Error;

	#[tokio::test]
	async fn records_requests_and_uses_handler() {
		let (transport, controller) = FakeTransportBuilder::new()
			.handler(|request| {
				if request.path == "missing" {
					Err(Error::Status {
						status: 404,
						body: "not found".to_string(),
					})
				} else {
					Ok(format!("{} {}", request.method, request.path))
				}
			})
			.build();

		assert_eq!(transport.send(Request::get("session")).await.unwrap(), "GET session");
		assert_eq!(transport.send(Request::get("missing")).await.unwrap_err().status(), Some(404));

		let sent = controller.take_sent();
		assert_eq!(sent.len(), 2);
		assert_eq!(sent[0].path, "session");
		assert_eq!(controller.sent_count(), 0);
	}

	#[tokio::test]
	async fn tracks_peak_in_flight() {
		let (transport, controller) = FakeTransportBuilder::new().latency(Duration::from_millis(20)).build();
		let (a, b, c) = tokio::join!(
			transport.send(Request::get("a")),
			transport.send(Request::get("b")),
			transport.send(Request::get("c")),
		);
		assert!(a.is_ok() && b.is_ok() && c.is_ok());
		assert_eq!(controller.peak_in_flight(), 3);
	}
}
