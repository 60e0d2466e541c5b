//! Entry point tying configuration, transport and fan-out together.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::Result;
use crate::fanout::FanOut;
use crate::images::Images;
use crate::overview::Overview;
use crate::session::Sessions;
use crate::transport::{HttpTransport, Transport};

/// Handle to a Skaha server.
///
/// Cloning shares the transport and the cancellation token.
#[derive(Clone)]
pub struct SkahaClient {
	transport: Arc<dyn Transport>,
	fanout: FanOut,
}

impl SkahaClient {
	/// Validates `config` and connects over HTTPS.
	pub fn new(config: ClientConfig) -> Result<Self> {
		config.validate()?;
		debug!(server = %config.server, version = %config.version, concurrency = config.concurrency, "building client");
		let transport = HttpTransport::new(&config)?;
		Ok(Self::with_transport(Arc::new(transport), config.concurrency))
	}

	/// Uses an existing transport, e.g. a fake in tests.
	pub fn with_transport(transport: Arc<dyn Transport>, concurrency: usize) -> Self {
		Self {
			transport,
			fanout: FanOut::new(concurrency),
		}
	}

	/// Ties batch cancellation to `token`.
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.fanout = self.fanout.with_cancellation(token);
		self
	}

	/// Cancels batches in flight on this client and its clones.
	pub fn cancel(&self) {
		self.fanout.cancel();
	}

	pub fn concurrency(&self) -> usize {
		self.fanout.limit()
	}

	pub fn sessions(&self) -> Sessions {
		Sessions::new(Arc::clone(&self.transport), self.fanout.clone())
	}

	pub fn images(&self) -> Images {
		Images::new(Arc::clone(&self.transport))
	}

	pub fn context(&self) -> Context {
		Context::new(Arc::clone(&self.transport))
	}

	pub fn overview(&self) -> Overview {
		Overview::new(Arc::clone(&self.transport))
	}
}
