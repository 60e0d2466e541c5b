//! Private container registry credentials.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The only registry the platform currently accepts credentials for.
pub const DEFAULT_REGISTRY: &str = "images.canfar.net";

/// Credentials forwarded to the platform in the `X-Skaha-Registry-Auth` header.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRegistry {
	#[serde(default = "default_url")]
	pub url: String,
	pub username: String,
	pub secret: String,
}

fn default_url() -> String {
	DEFAULT_REGISTRY.to_string()
}

impl ContainerRegistry {
	pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
		Self {
			url: default_url(),
			username: username.into(),
			secret: secret.into(),
		}
	}

	pub fn validate(&self) -> Result<()> {
		if self.url != DEFAULT_REGISTRY {
			return Err(Error::Config(format!("registry '{}' not supported, only {DEFAULT_REGISTRY} is", self.url)));
		}
		if self.username.is_empty() {
			return Err(Error::Config("registry username must not be empty".to_string()));
		}
		if self.secret.is_empty() {
			return Err(Error::Config("registry secret must not be empty".to_string()));
		}
		Ok(())
	}

	/// `base64(username:secret)`.
	pub fn encoded(&self) -> String {
		STANDARD.encode(format!("{}:{}", self.username, self.secret))
	}
}

impl std::fmt::Debug for ContainerRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ContainerRegistry")
			.field("url", &self.url)
			.field("username", &self.username)
			.field("secret", &"<redacted>")
			.finish()
	}
}
