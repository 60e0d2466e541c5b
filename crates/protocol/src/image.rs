//! Image catalog records.

use serde::{Deserialize, Serialize};

/// One entry of the `image` listing.
///
/// ```json
/// { "id": "images.canfar.net/skaha/terminal:1.1.1", "types": ["headless"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
	/// Fully qualified image reference.
	pub id: String,
	/// Session kinds the image is labelled for.
	#[serde(default)]
	pub types: Vec<String>,
	/// Server-side digest, when reported.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub digest: Option<String>,
}
