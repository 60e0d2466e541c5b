//! Per-item batch outcomes and their correlation with request keys.
//!
//! Every batch call returns a [`Correlated`] set: one `(key, ItemOutcome)`
//! pair per input, in input order. Failures are logged when correlated and
//! kept in the set, so callers inspect each item instead of assuming uniform
//! success.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

use crate::error::{Error, Result};

/// Result of one unit of work inside a batch.
#[derive(Debug)]
pub enum ItemOutcome<T> {
	Success(T),
	Failure(Error),
}

impl<T> ItemOutcome<T> {
	pub fn is_success(&self) -> bool {
		matches!(self, ItemOutcome::Success(_))
	}

	pub fn is_failure(&self) -> bool {
		matches!(self, ItemOutcome::Failure(_))
	}

	pub fn success(&self) -> Option<&T> {
		match self {
			ItemOutcome::Success(value) => Some(value),
			ItemOutcome::Failure(_) => None,
		}
	}

	pub fn failure(&self) -> Option<&Error> {
		match self {
			ItemOutcome::Success(_) => None,
			ItemOutcome::Failure(err) => Some(err),
		}
	}

	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ItemOutcome<U> {
		match self {
			ItemOutcome::Success(value) => ItemOutcome::Success(f(value)),
			ItemOutcome::Failure(err) => ItemOutcome::Failure(err),
		}
	}

	pub fn into_result(self) -> Result<T> {
		match self {
			ItemOutcome::Success(value) => Ok(value),
			ItemOutcome::Failure(err) => Err(err),
		}
	}
}

impl<T> From<Result<T>> for ItemOutcome<T> {
	fn from(result: Result<T>) -> Self {
		match result {
			Ok(value) => ItemOutcome::Success(value),
			Err(err) => ItemOutcome::Failure(err),
		}
	}
}

/// Serialized as `{"ok": true, "data": ...}` or `{"ok": false, "error": "..."}`.
impl<T: Serialize> Serialize for ItemOutcome<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(2))?;
		match self {
			ItemOutcome::Success(value) => {
				map.serialize_entry("ok", &true)?;
				map.serialize_entry("data", value)?;
			}
			ItemOutcome::Failure(err) => {
				map.serialize_entry("ok", &false)?;
				map.serialize_entry("error", &err.to_string())?;
			}
		}
		map.end()
	}
}

/// Ordered batch outcomes keyed by the identifier each item was issued for.
#[derive(Debug)]
pub struct Correlated<T> {
	entries: Vec<(String, ItemOutcome<T>)>,
}

impl<T> Correlated<T> {
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Outcome for `key`. With duplicate keys the first entry wins.
	pub fn get(&self, key: &str) -> Option<&ItemOutcome<T>> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, outcome)| outcome)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(|(key, _)| key.as_str())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &ItemOutcome<T>)> {
		self.entries.iter().map(|(key, outcome)| (key.as_str(), outcome))
	}

	pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
		self.iter().filter_map(|(key, outcome)| outcome.success().map(|value| (key, value)))
	}

	pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
		self.iter().filter_map(|(key, outcome)| outcome.failure().map(|err| (key, err)))
	}

	pub fn success_count(&self) -> usize {
		self.entries.iter().filter(|(_, outcome)| outcome.is_success()).count()
	}

	pub fn failure_count(&self) -> usize {
		self.entries.len() - self.success_count()
	}

	pub fn all_succeeded(&self) -> bool {
		self.entries.iter().all(|(_, outcome)| outcome.is_success())
	}

	/// `key -> succeeded` view, used for destroy results.
	pub fn flags(&self) -> BTreeMap<String, bool> {
		self.entries.iter().map(|(key, outcome)| (key.clone(), outcome.is_success())).collect()
	}

	pub fn into_entries(self) -> Vec<(String, ItemOutcome<T>)> {
		self.entries
	}
}

impl Correlated<String> {
	/// Successful payloads in input order, e.g. created session handles.
	pub fn handles(&self) -> Vec<String> {
		self.successes().map(|(_, handle)| handle.clone()).collect()
	}
}

impl<T> IntoIterator for Correlated<T> {
	type Item = (String, ItemOutcome<T>);
	type IntoIter = std::vec::IntoIter<(String, ItemOutcome<T>)>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}

impl<T: Serialize> Serialize for Correlated<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.entries.len()))?;
		for (key, outcome) in &self.entries {
			map.serialize_entry(key, outcome)?;
		}
		map.end()
	}
}

/// Zips ordered outcomes back to the keys they were issued for.
///
/// `outcomes[i]` belongs to `keys[i]`. Keys without an outcome are recorded as
/// [`Error::MissingOutcome`]; surplus outcomes are dropped. Every failure is
/// logged under `operation`.
pub fn correlate<T>(keys: Vec<String>, outcomes: Vec<ItemOutcome<T>>, operation: &str) -> Correlated<T> {
	let mut outcomes = outcomes.into_iter();
	let entries = keys
		.into_iter()
		.enumerate()
		.map(|(index, key)| {
			let outcome = outcomes.next().unwrap_or(ItemOutcome::Failure(Error::MissingOutcome(index)));
			if let ItemOutcome::Failure(err) = &outcome {
				warn!(operation, key = %key, error = %err, "batch item failed");
			}
			(key, outcome)
		})
		.collect();
	Correlated { entries }
}
