//! Service availability (VOSI).

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::info;

use crate::error::{Error, Result};
use crate::transport::{Request, Transport};

static AVAILABLE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<(?:[\w-]+:)?available>\s*(true|false)\s*</(?:[\w-]+:)?available>").expect("availability regex should compile"));

#[derive(Clone)]
pub struct Overview {
	transport: Arc<dyn Transport>,
}

impl Overview {
	pub fn new(transport: Arc<dyn Transport>) -> Self {
		Self { transport }
	}

	/// Whether the server reports itself available.
	pub async fn availability(&self) -> Result<bool> {
		let body = self.transport.send(Request::get("availability").unversioned()).await?;
		let available = parse_availability(&body)?;
		info!(available, "server availability");
		Ok(available)
	}
}

/// Reads the `<available>` element of a VOSI availability document.
pub fn parse_availability(xml: &str) -> Result<bool> {
	AVAILABLE
		.captures(xml)
		.and_then(|caps| caps.get(1))
		.map(|value| value.as_str() == "true")
		.ok_or_else(|| Error::Protocol("availability document has no <available> element".to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::fake::FakeTransportBuilder;

	const AVAILABLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<vosi:availability xmlns:vosi="http://www.ivoa.net/xml/VOSIAvailability/v1.0">
  <vosi:available>true</vosi:available>
  <vosi:note>service is accepting requests</vosi:note>
</vosi:availability>"#;

	#[test]
	fn parses_prefixed_and_bare_elements() {
		assert!(parse_availability(AVAILABLE_XML).unwrap());
		assert!(!parse_availability("<availability><available> false </available></availability>").unwrap());
	}

	#[test]
	fn missing_element_is_protocol_error() {
		assert!(matches!(parse_availability("<availability/>"), Err(Error::Protocol(_))));
	}

	#[tokio::test]
	async fn queries_unversioned_endpoint() {
		let (transport, controller) = FakeTransportBuilder::new().handler(|_| Ok(AVAILABLE_XML.to_string())).build();
		assert!(Overview::new(transport).availability().await.unwrap());
		let sent = controller.take_sent();
		assert_eq!(sent[0].path, "availability");
		assert!(!sent[0].versioned);
	}
}
