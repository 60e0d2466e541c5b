use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Installs the stderr subscriber. `RUST_LOG` wins over `-v` when set.
pub fn init_logging(verbosity: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(verbosity >= 2)
		.with_span_events(FmtSpan::NONE)
		.with_writer(std::io::stderr)
		.try_init();
}

fn default_directive(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "warn",
		1 => "info,skaha=info",
		_ => "debug,hyper=info,reqwest=info,rustls=info",
	}
}
