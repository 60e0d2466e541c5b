use serde_json::json;
use skaha::SkahaClient;

use super::CommandOutput;

pub async fn resources(client: &SkahaClient) -> skaha::Result<CommandOutput> {
	Ok(CommandOutput::new(client.context().resources().await?))
}

pub async fn availability(client: &SkahaClient) -> skaha::Result<CommandOutput> {
	let available = client.overview().availability().await?;
	let output = CommandOutput::new(json!({ "available": available }));
	Ok(if available { output } else { output.warn("server reports it is not available") })
}
