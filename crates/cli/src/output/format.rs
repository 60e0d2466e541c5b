use clap::ValueEnum;

/// How a [`CommandResult`](super::CommandResult) is written to stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Pretty-printed JSON envelope
	#[default]
	Json,
	/// One envelope per line, for piping into other tools
	Ndjson,
	/// Plain text, data only
	Text,
}
