//! Container image listing.

use std::sync::Arc;

use skaha_protocol::{ImageRecord, SessionKind};

use crate::error::Result;
use crate::transport::{Request, Transport};
use crate::validate::ValidationError;

#[derive(Clone)]
pub struct Images {
	transport: Arc<dyn Transport>,
}

impl Images {
	pub fn new(transport: Arc<dyn Transport>) -> Self {
		Self { transport }
	}

	/// Image IDs known to the server, optionally limited to one session kind.
	pub async fn fetch(&self, kind: Option<&str>) -> Result<Vec<String>> {
		let mut request = Request::get("image");
		if let Some(kind) = kind {
			let kind: SessionKind = kind.parse().map_err(|_| ValidationError::InvalidFilter {
				field: "kind",
				value: kind.to_string(),
			})?;
			request = request.with_query("type", kind.as_str());
		}
		let body = self.transport.send(request).await?;
		let records: Vec<ImageRecord> = serde_json::from_str(&body)?;
		Ok(records.into_iter().map(|record| record.id).collect())
	}
}
