//! Closed enumerations accepted by the session endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A string that is not a member of one of the enumerations below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
	/// Enumeration the value was parsed as.
	pub enumeration: &'static str,
	/// Rejected input.
	pub value: String,
}

impl fmt::Display for UnknownVariant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown {} '{}'", self.enumeration, self.value)
	}
}

impl std::error::Error for UnknownVariant {}

/// Session category. Only `Headless` sessions accept command overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
	Desktop,
	Notebook,
	Carta,
	Headless,
}

impl SessionKind {
	pub const ALL: [SessionKind; 4] = [SessionKind::Desktop, SessionKind::Notebook, SessionKind::Carta, SessionKind::Headless];

	pub fn as_str(self) -> &'static str {
		match self {
			SessionKind::Desktop => "desktop",
			SessionKind::Notebook => "notebook",
			SessionKind::Carta => "carta",
			SessionKind::Headless => "headless",
		}
	}

	pub fn is_headless(self) -> bool {
		matches!(self, SessionKind::Headless)
	}
}

impl FromStr for SessionKind {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		SessionKind::ALL.into_iter().find(|kind| kind.as_str() == s).ok_or_else(|| UnknownVariant {
			enumeration: "kind",
			value: s.to_string(),
		})
	}
}

impl fmt::Display for SessionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Lifecycle state reported by the server for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
	Pending,
	Running,
	Terminating,
	Succeeded,
	Error,
}

impl SessionStatus {
	pub const ALL: [SessionStatus; 5] = [
		SessionStatus::Pending,
		SessionStatus::Running,
		SessionStatus::Terminating,
		SessionStatus::Succeeded,
		SessionStatus::Error,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			SessionStatus::Pending => "Pending",
			SessionStatus::Running => "Running",
			SessionStatus::Terminating => "Terminating",
			SessionStatus::Succeeded => "Succeeded",
			SessionStatus::Error => "Error",
		}
	}
}

impl FromStr for SessionStatus {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		SessionStatus::ALL.into_iter().find(|status| status.as_str() == s).ok_or_else(|| UnknownVariant {
			enumeration: "status",
			value: s.to_string(),
		})
	}
}

impl fmt::Display for SessionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Listing scope. `All` lists every user's sessions with reduced detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchView {
	All,
}

impl FetchView {
	pub const ALL: [FetchView; 1] = [FetchView::All];

	pub fn as_str(self) -> &'static str {
		match self {
			FetchView::All => "all",
		}
	}
}

impl FromStr for FetchView {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		FetchView::ALL.into_iter().find(|view| view.as_str() == s).ok_or_else(|| UnknownVariant {
			enumeration: "view",
			value: s.to_string(),
		})
	}
}

impl fmt::Display for FetchView {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kind_parses_every_member() {
		for kind in SessionKind::ALL {
			assert_eq!(kind.as_str().parse::<SessionKind>(), Ok(kind));
		}
	}

	#[test]
	fn kind_rejects_unknown_and_wrong_case() {
		let err = "vnc".parse::<SessionKind>().unwrap_err();
		assert_eq!(err.enumeration, "kind");
		assert_eq!(err.value, "vnc");
		assert!("Headless".parse::<SessionKind>().is_err());
	}

	#[test]
	fn status_is_case_sensitive() {
		assert_eq!("Running".parse::<SessionStatus>(), Ok(SessionStatus::Running));
		assert!("running".parse::<SessionStatus>().is_err());
	}

	#[test]
	fn view_only_accepts_all() {
		assert_eq!("all".parse::<FetchView>(), Ok(FetchView::All));
		assert_eq!("stats".parse::<FetchView>().unwrap_err().to_string(), "unknown view 'stats'");
	}

	#[test]
	fn serde_uses_wire_spelling() {
		assert_eq!(serde_json::to_value(SessionKind::Carta).unwrap(), "carta");
		assert_eq!(serde_json::to_value(SessionStatus::Succeeded).unwrap(), "Succeeded");
		let kind: SessionKind = serde_json::from_str("\"notebook\"").unwrap();
		assert_eq!(kind, SessionKind::Notebook);
	}
}
