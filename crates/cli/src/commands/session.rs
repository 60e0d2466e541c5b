use serde::Serialize;
use serde_json::Value;
use skaha::{Correlated, CreateRequest, FetchRequest, SkahaClient, ValidationError};
use tracing::info;

use super::CommandOutput;
use crate::cli::{CreateArgs, SessionAction};

pub async fn run(client: &SkahaClient, action: SessionAction) -> skaha::Result<CommandOutput> {
	let sessions = client.sessions();
	match action {
		SessionAction::Fetch { kind, status, view } => {
			let request = FetchRequest { kind, status, view };
			let listed = sessions.fetch(&request).await?;
			info!(count = listed.len(), "fetched sessions");
			Ok(CommandOutput::new(Value::Array(listed)))
		}
		SessionAction::Stats => Ok(CommandOutput::new(sessions.stats().await?)),
		SessionAction::Info { ids } => batch(sessions.info(ids).await?),
		SessionAction::Logs { ids } => batch(sessions.logs(ids).await?),
		SessionAction::Create(args) => batch(sessions.create(&create_request(args)?).await?),
		SessionAction::Destroy { ids } => {
			let destroyed = sessions.destroy(ids).await?;
			let output = CommandOutput::new(serde_json::to_value(destroyed.flags())?);
			Ok(with_failures(output, &destroyed))
		}
	}
}

fn batch<T: Serialize>(results: Correlated<T>) -> skaha::Result<CommandOutput> {
	let output = CommandOutput::new(serde_json::to_value(&results)?);
	Ok(with_failures(output, &results))
}

fn with_failures<T>(mut output: CommandOutput, results: &Correlated<T>) -> CommandOutput {
	for (key, err) in results.failures() {
		output = output.warn(format!("{key}: {err}"));
	}
	if results.failure_count() > 0 {
		output = output.warn(format!("{} of {} items failed", results.failure_count(), results.len()));
	}
	output
}

fn create_request(args: CreateArgs) -> skaha::Result<CreateRequest> {
	let mut request = CreateRequest::new(args.name, args.image)
		.with_cores(args.cores)
		.with_ram(args.ram)
		.with_kind(args.kind)
		.with_gpus(args.gpus)
		.with_replicas(args.replicas);
	request.cmd = args.cmd;
	request.args = args.args;
	for pair in args.env {
		let Some((key, value)) = pair.split_once('=') else {
			return Err(ValidationError::MalformedEnv { value: pair.clone() }.into());
		};
		request = request.with_env(key, value);
	}
	Ok(request)
}
