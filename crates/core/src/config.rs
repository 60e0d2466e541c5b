//! Client configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `SKAHA_*` environment variables. The CLI applies its flags last.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::fanout::DEFAULT_CONCURRENCY;
use crate::registry::ContainerRegistry;

pub const DEFAULT_SERVER: &str = "https://ws-uv.canfar.net/skaha";
pub const DEFAULT_VERSION: &str = "v0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// File name looked up under the user config directory.
pub const CONFIG_FILE: &str = "config.json";

pub const ENV_SERVER: &str = "SKAHA_SERVER";
pub const ENV_VERSION: &str = "SKAHA_VERSION";
pub const ENV_CERTIFICATE: &str = "SKAHA_CERTIFICATE";
pub const ENV_TIMEOUT: &str = "SKAHA_TIMEOUT";
pub const ENV_CONCURRENCY: &str = "SKAHA_CONCURRENCY";
pub const ENV_REGISTRY_USERNAME: &str = "SKAHA_REGISTRY_USERNAME";
pub const ENV_REGISTRY_SECRET: &str = "SKAHA_REGISTRY_SECRET";

/// Connection settings for a [`SkahaClient`](crate::SkahaClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
	pub server: String,
	pub version: String,
	/// PEM file holding the client certificate and key. `None` sends
	/// unauthenticated requests.
	pub certificate: Option<PathBuf>,
	pub timeout_secs: u64,
	/// Verify the server's TLS certificate.
	pub verify: bool,
	/// Maximum in-flight requests per batch.
	pub concurrency: usize,
	pub registry: Option<ContainerRegistry>,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			server: DEFAULT_SERVER.to_string(),
			version: DEFAULT_VERSION.to_string(),
			certificate: default_certificate(),
			timeout_secs: DEFAULT_TIMEOUT_SECS,
			verify: true,
			concurrency: DEFAULT_CONCURRENCY,
			registry: None,
		}
	}
}

/// `$HOME/.ssl/cadcproxy.pem`, the location the CADC tooling writes proxies to.
pub fn default_certificate() -> Option<PathBuf> {
	dirs::home_dir().map(|home| home.join(".ssl").join("cadcproxy.pem"))
}

impl ClientConfig {
	/// `<config dir>/skaha/config.json`.
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join("skaha").join(CONFIG_FILE))
	}

	/// Reads a JSON config file. Missing keys keep their defaults.
	pub fn from_file(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|err| Error::Config(format!("cannot read {}: {err}", path.display())))?;
		serde_json::from_str(&text).map_err(|err| Error::Config(format!("cannot parse {}: {err}", path.display())))
	}

	/// Defaults, then `path` (or the default file when it exists), then the
	/// process environment.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let mut config = match path {
			Some(path) => Self::from_file(path)?,
			None => match Self::default_path() {
				Some(path) if path.is_file() => {
					debug!(path = %path.display(), "loading config file");
					Self::from_file(&path)?
				}
				_ => Self::default(),
			},
		};
		config.apply_env()?;
		Ok(config)
	}

	pub fn apply_env(&mut self) -> Result<()> {
		self.apply_env_with(|key| std::env::var(key).ok())
	}

	/// Overrides fields from `SKAHA_*` variables resolved through `lookup`.
	///
	/// An empty `SKAHA_CERTIFICATE` disables the client certificate.
	pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
		if let Some(server) = lookup(ENV_SERVER) {
			self.server = server;
		}
		if let Some(version) = lookup(ENV_VERSION) {
			self.version = version;
		}
		if let Some(certificate) = lookup(ENV_CERTIFICATE) {
			self.certificate = (!certificate.is_empty()).then(|| PathBuf::from(certificate));
		}
		if let Some(timeout) = lookup(ENV_TIMEOUT) {
			self.timeout_secs = parse_env(ENV_TIMEOUT, &timeout)?;
		}
		if let Some(concurrency) = lookup(ENV_CONCURRENCY) {
			self.concurrency = parse_env(ENV_CONCURRENCY, &concurrency)?;
		}

		let username = lookup(ENV_REGISTRY_USERNAME);
		let secret = lookup(ENV_REGISTRY_SECRET);
		if username.is_some() || secret.is_some() {
			let registry = self.registry.get_or_insert_with(|| ContainerRegistry::new("", ""));
			if let Some(username) = username {
				registry.username = username;
			}
			if let Some(secret) = secret {
				registry.secret = secret;
			}
		}
		Ok(())
	}

	pub fn with_server(mut self, server: impl Into<String>) -> Self {
		self.server = server.into();
		self
	}

	pub fn with_version(mut self, version: impl Into<String>) -> Self {
		self.version = version.into();
		self
	}

	pub fn with_certificate(mut self, certificate: Option<PathBuf>) -> Self {
		self.certificate = certificate;
		self
	}

	pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
		self.timeout_secs = timeout_secs;
		self
	}

	pub fn with_verify(mut self, verify: bool) -> Self {
		self.verify = verify;
		self
	}

	pub fn with_concurrency(mut self, concurrency: usize) -> Self {
		self.concurrency = concurrency;
		self
	}

	pub fn with_registry(mut self, registry: Option<ContainerRegistry>) -> Self {
		self.registry = registry;
		self
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}

	/// Parsed server URL; only http and https are accepted.
	pub fn server_url(&self) -> Result<Url> {
		let url = Url::parse(&self.server).map_err(|err| Error::InvalidServerUrl {
			url: self.server.clone(),
			reason: err.to_string(),
		})?;
		match url.scheme() {
			"http" | "https" => Ok(url),
			scheme => Err(Error::InvalidServerUrl {
				url: self.server.clone(),
				reason: format!("unsupported scheme '{scheme}'"),
			}),
		}
	}

	/// `{server}/{version}/`, the root every API path is joined onto.
	pub fn base_url(&self) -> Result<Url> {
		let server = self.server_url()?;
		let base = format!("{}/{}/", server.as_str().trim_end_matches('/'), self.version.trim_matches('/'));
		Url::parse(&base).map_err(|err| Error::InvalidServerUrl {
			url: base,
			reason: err.to_string(),
		})
	}

	/// Checks everything a client needs before its first request.
	pub fn validate(&self) -> Result<()> {
		self.server_url()?;
		if self.version.trim_matches('/').is_empty() {
			return Err(Error::Config("version must not be empty".to_string()));
		}
		if self.concurrency == 0 {
			return Err(Error::Config("concurrency must be at least 1".to_string()));
		}
		if let Some(path) = &self.certificate {
			check_certificate(path)?;
		}
		if let Some(registry) = &self.registry {
			registry.validate()?;
		}
		Ok(())
	}
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
	value.trim().parse().map_err(|_| Error::Config(format!("{key} has invalid value '{value}'")))
}

fn check_certificate(path: &Path) -> Result<()> {
	let invalid = |reason: String| Error::InvalidCertificate {
		path: path.to_path_buf(),
		reason,
	};
	let metadata = std::fs::metadata(path).map_err(|err| invalid(err.to_string()))?;
	if !metadata.is_file() {
		return Err(invalid("not a file".to_string()));
	}
	File::open(path).map_err(|err| invalid(format!("not readable: {err}")))?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |key| map.get(key).cloned()
	}

	#[test]
	fn defaults_match_platform() {
		let config = ClientConfig::default();
		assert_eq!(config.server, DEFAULT_SERVER);
		assert_eq!(config.version, "v0");
		assert_eq!(config.timeout(), Duration::from_secs(15));
		assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
		assert!(config.verify);
		assert!(config.registry.is_none());
		if let Some(certificate) = config.certificate {
			assert!(certificate.ends_with(".ssl/cadcproxy.pem"));
		}
	}

	#[test]
	fn file_values_override_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(&path, r#"{"server":"https://example.org/skaha","timeoutSecs":30,"certificate":null}"#).unwrap();

		let config = ClientConfig::from_file(&path).unwrap();
		assert_eq!(config.server, "https://example.org/skaha");
		assert_eq!(config.timeout_secs, 30);
		assert_eq!(config.certificate, None);
		assert_eq!(config.version, DEFAULT_VERSION);
	}

	#[test]
	fn malformed_file_is_config_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(&path, "{not json").unwrap();
		assert!(matches!(ClientConfig::from_file(&path), Err(Error::Config(_))));
	}

	#[test]
	fn environment_overrides_fields() {
		let mut config = ClientConfig::default();
		config
			.apply_env_with(env(&[
				(ENV_SERVER, "http://localhost:8080/skaha"),
				(ENV_VERSION, "v1"),
				(ENV_CERTIFICATE, "/tmp/cert.pem"),
				(ENV_TIMEOUT, "60"),
				(ENV_CONCURRENCY, "4"),
				(ENV_REGISTRY_USERNAME, "user"),
				(ENV_REGISTRY_SECRET, "token"),
			]))
			.unwrap();
		assert_eq!(config.server, "http://localhost:8080/skaha");
		assert_eq!(config.version, "v1");
		assert_eq!(config.certificate, Some(PathBuf::from("/tmp/cert.pem")));
		assert_eq!(config.timeout_secs, 60);
		assert_eq!(config.concurrency, 4);
		assert_eq!(config.registry, Some(ContainerRegistry::new("user", "token")));
	}

	#[test]
	fn empty_certificate_env_disables_certificate() {
		let mut config = ClientConfig::default().with_certificate(Some(PathBuf::from("/tmp/cert.pem")));
		config.apply_env_with(env(&[(ENV_CERTIFICATE, "")])).unwrap();
		assert_eq!(config.certificate, None);
	}

	#[test]
	fn invalid_numeric_env_is_rejected() {
		let mut config = ClientConfig::default();
		let err = config.apply_env_with(env(&[(ENV_TIMEOUT, "soon")])).unwrap_err();
		assert!(err.to_string().contains(ENV_TIMEOUT), "{err}");
	}

	#[test]
	fn base_url_appends_version() {
		let config = ClientConfig::default().with_server("https://ws-uv.canfar.net/skaha/");
		assert_eq!(config.base_url().unwrap().as_str(), "https://ws-uv.canfar.net/skaha/v0/");
		assert_eq!(config.base_url().unwrap().join("session/abc").unwrap().as_str(), "https://ws-uv.canfar.net/skaha/v0/session/abc");
	}

	#[test]
	fn rejects_non_http_server() {
		for server in ["ftp://example.org", "not a url"] {
			let config = ClientConfig::default().with_server(server).with_certificate(None);
			assert!(matches!(config.validate(), Err(Error::InvalidServerUrl { .. })), "{server}");
		}
	}

	#[test]
	fn missing_certificate_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let config = ClientConfig::default().with_certificate(Some(dir.path().join("missing.pem")));
		assert!(matches!(config.validate(), Err(Error::InvalidCertificate { .. })));

		let config = ClientConfig::default().with_certificate(Some(dir.path().to_path_buf()));
		match config.validate() {
			Err(Error::InvalidCertificate { reason, .. }) => assert_eq!(reason, "not a file"),
			other => panic!("expected certificate error, got {other:?}"),
		}
	}

	#[test]
	fn readable_certificate_passes() {
		let file = tempfile::NamedTempFile::new().unwrap();
		let config = ClientConfig::default().with_certificate(Some(file.path().to_path_buf()));
		assert!(config.validate().is_ok());
	}

	#[test]
	fn zero_concurrency_is_rejected() {
		let config = ClientConfig::default().with_certificate(None).with_concurrency(0);
		assert!(matches!(config.validate(), Err(Error::Config(_))));
	}
}
