use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

const DEBUG_DIRECTIVES: &str = "info,multirelease_operations=debug,multirelease_project=debug,multirelease_git=debug,multirelease_manifest=debug";

/// Installs the global subscriber. `RUST_LOG` wins over `debug`.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .init();
}

fn default_directives(debug: bool) -> &'static str {
    if debug { DEBUG_DIRECTIVES } else { "info" }
}
