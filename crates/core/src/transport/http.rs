use std::future::Future;
use std::pin::Pin;

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;
use url::Url;

use super::{Method, Request, Transport};
use crate::CLIENT_ID;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

const SERVER_HEADER: &str = "x-skaha-server";
const CLIENT_HEADER: &str = "x-skaha-client";
const AUTH_TYPE_HEADER: &str = "x-skaha-authentication-type";
const REGISTRY_AUTH_HEADER: &str = "x-skaha-registry-auth";

/// [`Transport`] backed by a pooled `reqwest` client.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: reqwest::Client,
	root: Url,
	base: Url,
}

impl HttpTransport {
	/// Builds the client: platform headers, optional certificate identity,
	/// timeout and TLS verification from `config`.
	pub fn new(config: &ClientConfig) -> Result<Self> {
		let root = service_root(config.server_url()?)?;
		let base = config.base_url()?;

		let mut headers = HeaderMap::new();
		headers.insert(HeaderName::from_static(SERVER_HEADER), header_value(&config.server)?);
		headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
		headers.insert(HeaderName::from_static(CLIENT_HEADER), HeaderValue::from_static(CLIENT_ID));
		if config.certificate.is_some() {
			headers.insert(HeaderName::from_static(AUTH_TYPE_HEADER), HeaderValue::from_static("certificate"));
		}
		if let Some(registry) = &config.registry {
			let mut value = header_value(&registry.encoded())?;
			value.set_sensitive(true);
			headers.insert(HeaderName::from_static(REGISTRY_AUTH_HEADER), value);
		}

		let mut builder = reqwest::Client::builder()
			.default_headers(headers)
			.timeout(config.timeout())
			.danger_accept_invalid_certs(!config.verify);

		if let Some(path) = &config.certificate {
			let pem = std::fs::read(path).map_err(|err| Error::InvalidCertificate {
				path: path.clone(),
				reason: err.to_string(),
			})?;
			let identity = reqwest::Identity::from_pem(&pem).map_err(|err| Error::InvalidCertificate {
				path: path.clone(),
				reason: err.to_string(),
			})?;
			builder = builder.identity(identity);
		}

		Ok(Self {
			client: builder.build()?,
			root,
			base,
		})
	}

	/// Versioned root URL requests are resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base
	}

	fn url_for(&self, request: &Request) -> Result<Url> {
		let root = if request.versioned { &self.base } else { &self.root };
		root.join(request.path.trim_start_matches('/')).map_err(|err| Error::InvalidServerUrl {
			url: format!("{root}{}", request.path),
			reason: err.to_string(),
		})
	}

	async fn execute(&self, request: Request) -> Result<String> {
		let url = self.url_for(&request)?;
		debug!(method = %request.method, url = %url, params = ?request.query, "sending request");

		let builder = match request.method {
			Method::Get => self.client.get(url),
			Method::Post => self.client.post(url),
			Method::Delete => self.client.delete(url),
		};
		let builder = if request.query.is_empty() { builder } else { builder.query(&request.query) };

		let response = builder.send().await?;
		let status = response.status();
		let body = response.text().await?;
		if !status.is_success() {
			return Err(Error::Status {
				status: status.as_u16(),
				body,
			});
		}
		Ok(body)
	}
}

impl Transport for HttpTransport {
	fn send(&self, request: Request) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
		Box::pin(self.execute(request))
	}
}

/// Server URL with a trailing slash so joins stay below it.
fn service_root(server: Url) -> Result<Url> {
	if server.path().ends_with('/') {
		return Ok(server);
	}
	let rooted = format!("{}/", server.as_str());
	Url::parse(&rooted).map_err(|err| Error::InvalidServerUrl {
		url: rooted,
		reason: err.to_string(),
	})
}

fn header_value(value: &str) -> Result<HeaderValue> {
	HeaderValue::from_str(value).map_err(|err| Error::Config(format!("invalid header value '{value}': {err}")))
}
