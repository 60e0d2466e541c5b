use skaha::SkahaClient;

use super::CommandOutput;

pub async fn run(client: &SkahaClient, kind: Option<&str>) -> skaha::Result<CommandOutput> {
	let images = client.images().fetch(kind).await?;
	Ok(CommandOutput::new(serde_json::to_value(images)?))
}
