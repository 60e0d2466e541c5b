use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "skaha")]
#[command(about = "Skaha client - manage interactive sessions from the command line")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Config file (defaults to <config dir>/skaha/config.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Skaha server URL
	#[arg(long, global = true, value_name = "URL")]
	pub server: Option<String>,

	/// PEM file with the client certificate and key
	#[arg(long, global = true, value_name = "FILE", conflicts_with = "no_certificate")]
	pub certificate: Option<PathBuf>,

	/// Send requests without a client certificate
	#[arg(long, global = true)]
	pub no_certificate: bool,

	/// Maximum concurrent requests per batch
	#[arg(long, global = true, value_name = "N")]
	pub concurrency: Option<usize>,

	/// Per-request timeout in seconds
	#[arg(long, global = true, value_name = "SECS")]
	pub timeout: Option<u64>,

	/// Skip TLS verification of the server certificate
	#[arg(long, global = true)]
	pub insecure: bool,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Create, inspect and destroy sessions
	#[command(alias = "s")]
	Session {
		#[command(subcommand)]
		action: SessionAction,
	},

	/// List container images
	Images {
		/// Only images usable for this session kind
		#[arg(long)]
		kind: Option<String>,
	},

	/// Show resources offered by the cluster
	Context,

	/// Check whether the server is accepting requests
	Availability,
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
	/// List sessions
	#[command(alias = "ls")]
	Fetch {
		/// desktop, notebook, carta or headless
		#[arg(long)]
		kind: Option<String>,
		/// Pending, Running, Terminating, Succeeded or Error
		#[arg(long)]
		status: Option<String>,
		/// "all" lists every user's sessions
		#[arg(long)]
		view: Option<String>,
	},

	/// Cluster session statistics
	Stats,

	/// Event details for sessions
	Info {
		#[arg(required = true)]
		ids: Vec<String>,
	},

	/// Logs for sessions
	Logs {
		#[arg(required = true)]
		ids: Vec<String>,
	},

	/// Launch one or more replicas of a session
	Create(CreateArgs),

	/// Delete sessions
	#[command(alias = "rm")]
	Destroy {
		#[arg(required = true)]
		ids: Vec<String>,
	},
}

#[derive(Args, Debug)]
pub struct CreateArgs {
	/// Session name; replicas are named <name>-<i>
	#[arg(short, long)]
	pub name: String,

	/// Container image
	#[arg(short, long)]
	pub image: String,

	/// CPU cores per replica
	#[arg(long, default_value_t = skaha::validate::DEFAULT_CORES)]
	pub cores: u32,

	/// RAM in GB per replica
	#[arg(long, default_value_t = skaha::validate::DEFAULT_RAM_GB)]
	pub ram: u32,

	/// desktop, notebook, carta or headless
	#[arg(short, long, default_value = "headless")]
	pub kind: String,

	/// GPUs per replica
	#[arg(long)]
	pub gpus: Option<u32>,

	/// Command to run (headless only)
	#[arg(long)]
	pub cmd: Option<String>,

	/// Arguments for the command (headless only)
	#[arg(long, allow_hyphen_values = true)]
	pub args: Option<String>,

	/// Environment variable KEY=VALUE (headless only, repeatable)
	#[arg(short, long = "env", value_name = "KEY=VALUE")]
	pub env: Vec<String>,

	/// Number of replicas
	#[arg(short, long, default_value_t = 1)]
	pub replicas: u32,
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn format_parses_through_value_enum() {
		assert_eq!(Cli::try_parse_from(["skaha", "context"]).unwrap().format, OutputFormat::Json);
		assert_eq!(Cli::try_parse_from(["skaha", "context", "-f", "ndjson"]).unwrap().format, OutputFormat::Ndjson);
		assert_eq!(Cli::try_parse_from(["skaha", "--format", "text", "context"]).unwrap().format, OutputFormat::Text);
		assert!(Cli::try_parse_from(["skaha", "--format", "toon", "context"]).is_err());
	}

	#[test]
	fn parses_create_with_repeated_env() {
		let cli = Cli::try_parse_from([
			"skaha", "session", "create", "-n", "t", "-i", "img", "--cores", "1", "--ram", "1", "-e", "K=V", "-e", "A=B", "-r", "2",
		])
		.unwrap();
		match cli.command {
			Commands::Session {
				action: SessionAction::Create(args),
			} => {
				assert_eq!(args.env, vec!["K=V", "A=B"]);
				assert_eq!(args.replicas, 2);
				assert_eq!(args.kind, "headless");
			}
			other => panic!("unexpected command {other:?}"),
		}
	}

	#[test]
	fn global_flags_follow_subcommands() {
		let cli = Cli::try_parse_from(["skaha", "session", "destroy", "a", "b", "--server", "http://localhost/skaha", "--no-certificate"]).unwrap();
		assert_eq!(cli.server.as_deref(), Some("http://localhost/skaha"));
		assert!(cli.no_certificate);
	}

	#[test]
	fn destroy_requires_ids() {
		assert!(Cli::try_parse_from(["skaha", "session", "destroy"]).is_err());
	}
}
