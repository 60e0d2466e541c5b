//! Cluster resource context.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::transport::{Request, Transport};

#[derive(Clone)]
pub struct Context {
	transport: Arc<dyn Transport>,
}

impl Context {
	pub fn new(transport: Arc<dyn Transport>) -> Self {
		Self { transport }
	}

	/// Cores, RAM and GPU options currently offered by the cluster.
	pub async fn resources(&self) -> Result<Value> {
		let body = self.transport.send(Request::get("context")).await?;
		Ok(serde_json::from_str(&body)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::fake::FakeTransportBuilder;

	#[tokio::test]
	async fn passes_resources_through() {
		let (transport, _controller) = FakeTransportBuilder::new()
			.handler(|_| Ok(r#"{"cores":{"default":2,"options":[1,2,4]},"memoryGB":{"default":4}}"#.to_string()))
			.build();
		let resources = Context::new(transport).resources().await.unwrap();
		assert_eq!(resources["cores"]["default"], 2);
	}

	#[tokio::test]
	async fn invalid_json_is_error() {
		let (transport, _controller) = FakeTransportBuilder::new().handler(|_| Ok("<html>".to_string())).build();
		assert!(Context::new(transport).resources().await.is_err());
	}
}
