mod context;
mod images;
mod session;

use serde_json::Value;
use skaha::{ClientConfig, SkahaClient};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::cli::{Cli, Commands, SessionAction};
use crate::output::{CommandError, DiagnosticLevel, EffectiveConfig, ResultBuilder, print_result};

/// What a command hands back for printing.
pub struct CommandOutput {
	pub data: Value,
	pub diagnostics: Vec<(DiagnosticLevel, String)>,
}

impl CommandOutput {
	pub fn new(data: Value) -> Self {
		Self {
			data,
			diagnostics: Vec::new(),
		}
	}

	pub fn warn(mut self, message: impl Into<String>) -> Self {
		self.diagnostics.push((DiagnosticLevel::Warning, message.into()));
		self
	}
}

/// Runs the parsed command, prints its envelope and returns the exit code.
pub async fn dispatch(cli: Cli) -> i32 {
	let format = cli.format;
	let name = command_name(&cli.command);

	let config = match resolve_config(&cli) {
		Ok(config) => config,
		Err(err) => return fail(name, &err, None, format),
	};
	let effective = EffectiveConfig::from(&config);
	let client = match SkahaClient::new(config) {
		Ok(client) => client,
		Err(err) => return fail(name, &err, Some(effective), format),
	};

	let token = CancellationToken::new();
	let client = client.with_cancellation(token.clone());
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			warn!("interrupted, cancelling outstanding requests");
			token.cancel();
		}
	});

	let result = match cli.command {
		Commands::Session { action } => session::run(&client, action).await,
		Commands::Images { kind } => images::run(&client, kind.as_deref()).await,
		Commands::Context => context::resources(&client).await,
		Commands::Availability => context::availability(&client).await,
	};

	match result {
		Ok(output) => {
			let mut builder = ResultBuilder::new(name).data(output.data).config(effective);
			for (level, message) in output.diagnostics {
				builder = builder.diagnostic(level, message);
			}
			print_result(&builder.build(), format);
			0
		}
		Err(err) => fail(name, &err, Some(effective), format),
	}
}

fn fail(name: &str, err: &skaha::Error, config: Option<EffectiveConfig>, format: crate::output::OutputFormat) -> i32 {
	error!(command = name, error = %err, "command failed");
	let mut builder = ResultBuilder::<Value>::new(name).error(CommandError::from(err));
	if let Some(config) = config {
		builder = builder.config(config);
	}
	print_result(&builder.build(), format);
	1
}

/// Config file and environment, then command-line flags.
pub fn resolve_config(cli: &Cli) -> skaha::Result<ClientConfig> {
	let mut config = ClientConfig::load(cli.config.as_deref())?;
	apply_flags(&mut config, cli);
	debug!(server = %config.server, concurrency = config.concurrency, "resolved configuration");
	Ok(config)
}

fn apply_flags(config: &mut ClientConfig, cli: &Cli) {
	if let Some(server) = &cli.server {
		config.server = server.clone();
	}
	if cli.no_certificate {
		config.certificate = None;
	} else if let Some(certificate) = &cli.certificate {
		config.certificate = Some(certificate.clone());
	}
	if let Some(concurrency) = cli.concurrency {
		config.concurrency = concurrency;
	}
	if let Some(timeout) = cli.timeout {
		config.timeout_secs = timeout;
	}
	if cli.insecure {
		config.verify = false;
	}
}

fn command_name(command: &Commands) -> &'static str {
	match command {
		Commands::Session { action } => match action {
			SessionAction::Fetch { .. } => "session.fetch",
			SessionAction::Stats => "session.stats",
			SessionAction::Info { .. } => "session.info",
			SessionAction::Logs { .. } => "session.logs",
			SessionAction::Create(_) => "session.create",
			SessionAction::Destroy { .. } => "session.destroy",
		},
		Commands::Images { .. } => "images",
		Commands::Context => "context",
		Commands::Availability => "availability",
	}
}
