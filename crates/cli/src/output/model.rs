use serde::{Deserialize, Serialize};

/// Current schema version for command output.
pub const SCHEMA_VERSION: u32 = 1;

/// The result envelope printed by every command.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub schema_version: Option<u32>,
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub duration_ms: Option<u64>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub diagnostics: Vec<Diagnostic>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub config: Option<EffectiveConfig>,
}

/// Error information for failed commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Standardized error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	InvalidInput,
	ConfigError,
	AuthError,
	Timeout,
	HttpError,
	ServerError,
	ProtocolError,
	Cancelled,
	IoError,
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ErrorCode::InvalidInput => write!(f, "INVALID_INPUT"),
			ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
			ErrorCode::AuthError => write!(f, "AUTH_ERROR"),
			ErrorCode::Timeout => write!(f, "TIMEOUT"),
			ErrorCode::HttpError => write!(f, "HTTP_ERROR"),
			ErrorCode::ServerError => write!(f, "SERVER_ERROR"),
			ErrorCode::ProtocolError => write!(f, "PROTOCOL_ERROR"),
			ErrorCode::Cancelled => write!(f, "CANCELLED"),
			ErrorCode::IoError => write!(f, "IO_ERROR"),
			ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
		}
	}
}

impl ErrorCode {
	/// Classifies a client error.
	pub fn for_error(err: &skaha::Error) -> Self {
		use skaha::Error;
		match err {
			Error::Validation(_) => ErrorCode::InvalidInput,
			Error::Config(_) | Error::InvalidServerUrl { .. } => ErrorCode::ConfigError,
			Error::InvalidCertificate { .. } => ErrorCode::AuthError,
			Error::Status { status: 401 | 403, .. } => ErrorCode::AuthError,
			Error::Status { .. } => ErrorCode::ServerError,
			Error::Http(_) if err.is_timeout() => ErrorCode::Timeout,
			Error::Http(_) => ErrorCode::HttpError,
			Error::Protocol(_) | Error::Json(_) | Error::MissingOutcome(_) => ErrorCode::ProtocolError,
			Error::Cancelled => ErrorCode::Cancelled,
			Error::Io(_) => ErrorCode::IoError,
			Error::Panicked(_) => ErrorCode::InternalError,
		}
	}
}

impl From<&skaha::Error> for CommandError {
	fn from(err: &skaha::Error) -> Self {
		let details = match err {
			skaha::Error::Validation(validation) => Some(serde_json::json!({ "field": validation.field() })),
			skaha::Error::Status { status, .. } => Some(serde_json::json!({ "status": status })),
			_ => None,
		};
		Self {
			code: ErrorCode::for_error(err),
			message: err.to_string(),
			details,
		}
	}
}

/// Diagnostic message attached to a command result.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
	pub level: DiagnosticLevel,
	pub message: String,
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
	Info,
	Warning,
	Error,
}

/// Effective configuration used for command execution.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfig {
	pub server: String,
	pub version: String,
	pub certificate: bool,
	pub concurrency: usize,
	pub timeout_secs: u64,
}

impl From<&skaha::ClientConfig> for EffectiveConfig {
	fn from(config: &skaha::ClientConfig) -> Self {
		Self {
			server: config.server.clone(),
			version: config.version.clone(),
			certificate: config.certificate.is_some(),
			concurrency: config.concurrency,
			timeout_secs: config.timeout_secs,
		}
	}
}
