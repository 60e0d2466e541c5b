//! Replica expansion for session creation.

use std::collections::BTreeMap;

use skaha_protocol::SessionKind;

use crate::validate::SessionSpec;

/// Environment variable carrying the 1-based replica index.
pub const REPLICA_ID: &str = "REPLICA_ID";
/// Environment variable carrying the total replica count.
pub const REPLICA_COUNT: &str = "REPLICA_COUNT";

/// Parameters for creating one replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaParams {
	/// 1-based position within the batch.
	pub index: u32,
	pub name: String,
	pub image: String,
	pub cores: u32,
	pub ram: u32,
	pub kind: SessionKind,
	pub gpus: Option<u32>,
	pub cmd: Option<String>,
	pub args: Option<String>,
	pub env: BTreeMap<String, String>,
}

impl ReplicaParams {
	/// Query parameters for the create endpoint.
	///
	/// Each environment variable becomes its own `env=KEY=VALUE` pair.
	pub fn to_query(&self) -> Vec<(String, String)> {
		let mut query = vec![
			("name".to_string(), self.name.clone()),
			("image".to_string(), self.image.clone()),
			("cores".to_string(), self.cores.to_string()),
			("ram".to_string(), self.ram.to_string()),
			("type".to_string(), self.kind.to_string()),
		];
		if let Some(gpus) = self.gpus {
			query.push(("gpus".to_string(), gpus.to_string()));
		}
		if let Some(cmd) = &self.cmd {
			query.push(("cmd".to_string(), cmd.clone()));
		}
		if let Some(args) = &self.args {
			query.push(("args".to_string(), args.clone()));
		}
		query.extend(self.env.iter().map(|(key, value)| ("env".to_string(), format!("{key}={value}"))));
		query
	}
}

/// Expands a validated [`SessionSpec`] into one parameter set per replica.
///
/// Replica `i` of `R` is named `{name}-{i}` and gets `REPLICA_ID=i` and
/// `REPLICA_COUNT=R` on top of the requested environment.
pub fn expand(spec: &SessionSpec) -> Vec<ReplicaParams> {
	let count = spec.replicas.to_string();
	(1..=spec.replicas)
		.map(|index| {
			let mut env = spec.env.clone();
			env.insert(REPLICA_ID.to_string(), index.to_string());
			env.insert(REPLICA_COUNT.to_string(), count.clone());
			ReplicaParams {
				index,
				name: format!("{}-{}", spec.name, index),
				image: spec.image.clone(),
				cores: spec.cores,
				ram: spec.ram,
				kind: spec.kind,
				gpus: spec.gpus,
				cmd: spec.cmd.clone(),
				args: spec.args.clone(),
				env,
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::validate::{CreateRequest, validate_create};

	fn spec(request: CreateRequest) -> SessionSpec {
		validate_create(&request).unwrap()
	}

	#[test]
	fn names_and_injects_replica_env() {
		let replicas = expand(&spec(CreateRequest::new("x", "img").with_replicas(3)));
		let names: Vec<&str> = replicas.iter().map(|r| r.name.as_str()).collect();
		assert_eq!(names, vec!["x-1", "x-2", "x-3"]);
		for (i, replica) in replicas.iter().enumerate() {
			let id = (i + 1).to_string();
			assert_eq!(replica.index as usize, i + 1);
			assert_eq!(replica.env.get(REPLICA_ID), Some(&id));
			assert_eq!(replica.env.get(REPLICA_COUNT).map(String::as_str), Some("3"));
		}
	}

	#[test]
	fn expansion_is_deterministic() {
		let spec = spec(CreateRequest::new("x", "img").with_env("K", "V").with_replicas(4));
		assert_eq!(expand(&spec), expand(&spec));
	}

	#[test]
	fn replicas_share_everything_but_name_and_index() {
		let spec = spec(
			CreateRequest::new("job", "images.canfar.net/skaha/terminal:1.1.1")
				.with_cores(8)
				.with_ram(32)
				.with_cmd("python")
				.with_args("run.py")
				.with_gpus(Some(1))
				.with_env("K", "V")
				.with_replicas(2),
		);
		let [first, second] = expand(&spec).try_into().unwrap();
		assert_eq!(first.image, second.image);
		assert_eq!((first.cores, first.ram, first.gpus), (8, 32, Some(1)));
		assert_eq!((second.cores, second.ram, second.gpus), (8, 32, Some(1)));
		assert_eq!(first.cmd, second.cmd);
		assert_eq!(first.args, second.args);
		assert_eq!(first.env.get("K"), second.env.get("K"));
		assert_ne!(first.env.get(REPLICA_ID), second.env.get(REPLICA_ID));
	}

	#[test]
	fn injected_keys_override_user_values() {
		let spec = spec(CreateRequest::new("x", "img").with_env(REPLICA_ID, "99").with_replicas(1));
		assert_eq!(expand(&spec)[0].env.get(REPLICA_ID).map(String::as_str), Some("1"));
	}

	#[test]
	fn query_encodes_env_as_repeated_pairs() {
		let spec = spec(CreateRequest::new("t", "img").with_cores(1).with_ram(1).with_cmd("env").with_env("K", "V").with_replicas(2));
		let query = expand(&spec)[1].to_query();
		let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
		assert_eq!(
			pairs,
			vec![
				("name", "t-2"),
				("image", "img"),
				("cores", "1"),
				("ram", "1"),
				("type", "headless"),
				("cmd", "env"),
				("env", "K=V"),
				("env", "REPLICA_COUNT=2"),
				("env", "REPLICA_ID=2"),
			]
		);
	}
}
