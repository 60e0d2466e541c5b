//! Request-shape validation.
//!
//! Requests are built as plain carriers ([`CreateRequest`], [`FetchRequest`])
//! and checked by pure functions that either return the normalized form
//! ([`SessionSpec`], [`FetchFilter`]) or the first violated rule. Nothing in
//! this module touches the network.
//!
//! Rules for session creation, in precedence order:
//! 1. `kind` is one of desktop, notebook, carta, headless.
//! 2. `cmd`, `args` and `env` are only used with headless sessions.
//! 3. cores, ram, replicas and gpus are within their bounds.
//! 4. name and image are non-empty.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use skaha_protocol::{FetchView, SessionKind, SessionStatus};
use thiserror::Error;

pub const MIN_CORES: u32 = 1;
pub const MAX_CORES: u32 = 256;
pub const MIN_RAM_GB: u32 = 1;
pub const MAX_RAM_GB: u32 = 512;
pub const MIN_REPLICAS: u32 = 1;
pub const MAX_REPLICAS: u32 = 256;
pub const MIN_GPUS: u32 = 1;
pub const MAX_GPUS: u32 = 28;

pub const DEFAULT_CORES: u32 = 2;
pub const DEFAULT_RAM_GB: u32 = 4;

/// A violated request constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	#[error("invalid kind '{value}': expected one of desktop, notebook, carta, headless")]
	InvalidKind { value: String },

	#[error("{} only supported for headless sessions, got kind '{kind}'", .fields.join(", "))]
	HeadlessOnly { kind: SessionKind, fields: Vec<&'static str> },

	#[error("{field} must be between {min} and {max}, got {value}")]
	OutOfRange { field: &'static str, value: u32, min: u32, max: u32 },

	#[error("{field} must not be empty")]
	Empty { field: &'static str },

	#[error("invalid {field} '{value}'")]
	InvalidFilter { field: &'static str, value: String },

	#[error("malformed session id '{value}': must be a single path segment")]
	MalformedHandle { value: String },

	#[error("malformed env '{value}': expected KEY=VALUE")]
	MalformedEnv { value: String },
}

impl ValidationError {
	/// Name of the offending field.
	pub fn field(&self) -> &'static str {
		match self {
			ValidationError::InvalidKind { .. } => "kind",
			ValidationError::HeadlessOnly { fields, .. } => fields.first().copied().unwrap_or("kind"),
			ValidationError::OutOfRange { field, .. } | ValidationError::Empty { field } | ValidationError::InvalidFilter { field, .. } => field,
			ValidationError::MalformedHandle { .. } => "id",
			ValidationError::MalformedEnv { .. } => "env",
		}
	}
}

/// Unvalidated session creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateRequest {
	pub name: String,
	pub image: String,
	pub cores: u32,
	/// RAM in whole GB.
	pub ram: u32,
	pub kind: String,
	pub gpus: Option<u32>,
	pub cmd: Option<String>,
	pub args: Option<String>,
	pub env: BTreeMap<String, String>,
	pub replicas: u32,
}

impl Default for CreateRequest {
	fn default() -> Self {
		Self {
			name: String::new(),
			image: String::new(),
			cores: DEFAULT_CORES,
			ram: DEFAULT_RAM_GB,
			kind: SessionKind::Headless.as_str().to_string(),
			gpus: None,
			cmd: None,
			args: None,
			env: BTreeMap::new(),
			replicas: 1,
		}
	}
}

impl CreateRequest {
	/// Creates a headless request with default resources and one replica.
	pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			image: image.into(),
			..Default::default()
		}
	}

	pub fn with_cores(mut self, cores: u32) -> Self {
		self.cores = cores;
		self
	}

	pub fn with_ram(mut self, ram: u32) -> Self {
		self.ram = ram;
		self
	}

	pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
		self.kind = kind.into();
		self
	}

	pub fn with_gpus(mut self, gpus: Option<u32>) -> Self {
		self.gpus = gpus;
		self
	}

	pub fn with_cmd(mut self, cmd: impl Into<String>) -> Self {
		self.cmd = Some(cmd.into());
		self
	}

	pub fn with_args(mut self, args: impl Into<String>) -> Self {
		self.args = Some(args.into());
		self
	}

	pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.env.insert(key.into(), value.into());
		self
	}

	pub fn with_replicas(mut self, replicas: u32) -> Self {
		self.replicas = replicas;
		self
	}
}

/// Validated session creation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct SessionSpec {
	pub name: String,
	pub image: String,
	pub cores: u32,
	pub ram: u32,
	pub kind: SessionKind,
	pub gpus: Option<u32>,
	pub cmd: Option<String>,
	pub args: Option<String>,
	pub env: BTreeMap<String, String>,
	pub replicas: u32,
}

/// Checks a creation request and returns its normalized form.
pub fn validate_create(request: &CreateRequest) -> Result<SessionSpec, ValidationError> {
	let kind: SessionKind = request.kind.parse().map_err(|_| ValidationError::InvalidKind { value: request.kind.clone() })?;

	let cmd = non_empty(request.cmd.as_deref());
	let args = non_empty(request.args.as_deref());

	if !kind.is_headless() {
		let mut fields = Vec::new();
		if cmd.is_some() {
			fields.push("cmd");
		}
		if args.is_some() {
			fields.push("args");
		}
		if !request.env.is_empty() {
			fields.push("env");
		}
		if !fields.is_empty() {
			return Err(ValidationError::HeadlessOnly { kind, fields });
		}
	}

	check_range("cores", request.cores, MIN_CORES, MAX_CORES)?;
	check_range("ram", request.ram, MIN_RAM_GB, MAX_RAM_GB)?;
	check_range("replicas", request.replicas, MIN_REPLICAS, MAX_REPLICAS)?;
	if let Some(gpus) = request.gpus {
		check_range("gpus", gpus, MIN_GPUS, MAX_GPUS)?;
	}

	let name = request.name.trim();
	if name.is_empty() {
		return Err(ValidationError::Empty { field: "name" });
	}
	let image = request.image.trim();
	if image.is_empty() {
		return Err(ValidationError::Empty { field: "image" });
	}
	if request.env.keys().any(|key| key.trim().is_empty()) {
		return Err(ValidationError::Empty { field: "env" });
	}

	Ok(SessionSpec {
		name: name.to_string(),
		image: image.to_string(),
		cores: request.cores,
		ram: request.ram,
		kind,
		gpus: request.gpus,
		cmd,
		args,
		env: request.env.clone(),
		replicas: request.replicas,
	})
}

/// Unvalidated session listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchRequest {
	pub kind: Option<String>,
	pub status: Option<String>,
	pub view: Option<String>,
}

impl FetchRequest {
	pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
		self.kind = Some(kind.into());
		self
	}

	pub fn with_status(mut self, status: impl Into<String>) -> Self {
		self.status = Some(status.into());
		self
	}

	pub fn with_view(mut self, view: impl Into<String>) -> Self {
		self.view = Some(view.into());
		self
	}
}

/// Validated session listing filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct FetchFilter {
	pub kind: Option<SessionKind>,
	pub status: Option<SessionStatus>,
	pub view: Option<FetchView>,
}

impl FetchFilter {
	/// Query parameters for the present fields.
	pub fn to_query(&self) -> Vec<(String, String)> {
		let mut query = Vec::new();
		if let Some(kind) = self.kind {
			query.push(("type".to_string(), kind.to_string()));
		}
		if let Some(status) = self.status {
			query.push(("status".to_string(), status.to_string()));
		}
		if let Some(view) = self.view {
			query.push(("view".to_string(), view.to_string()));
		}
		query
	}
}

/// Checks a listing filter; each present field must belong to its enumeration.
pub fn validate_fetch(request: &FetchRequest) -> Result<FetchFilter, ValidationError> {
	Ok(FetchFilter {
		kind: parse_filter("kind", request.kind.as_deref())?,
		status: parse_filter("status", request.status.as_deref())?,
		view: parse_filter("view", request.view.as_deref())?,
	})
}

/// Checks that every session handle is non-empty and usable verbatim as one
/// URL path segment.
pub fn validate_handles(ids: &[String]) -> Result<(), ValidationError> {
	for id in ids {
		if id.trim().is_empty() {
			return Err(ValidationError::Empty { field: "id" });
		}
		if id == "." || id == ".." || id.contains(['/', '\\', '?', '#', '%']) {
			return Err(ValidationError::MalformedHandle { value: id.clone() });
		}
	}
	Ok(())
}

fn parse_filter<T: std::str::FromStr>(field: &'static str, value: Option<&str>) -> Result<Option<T>, ValidationError> {
	value
		.map(|raw| {
			raw.parse().map_err(|_| ValidationError::InvalidFilter {
				field,
				value: raw.to_string(),
			})
		})
		.transpose()
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), ValidationError> {
	if (min..=max).contains(&value) {
		Ok(())
	} else {
		Err(ValidationError::OutOfRange { field, value, min, max })
	}
}

fn non_empty(value: Option<&str>) -> Option<String> {
	value.filter(|v| !v.is_empty()).map(str::to_string)
}
