use tracing_subscriber::EnvFilter;

/// Crates whose events `--log-level` controls. Everything else stays at
/// `warn` unless `RUST_LOG` says otherwise.
const OWN_TARGETS: &[&str] = &["issuegraph", "issuegraph_engine", "issuegraph_state"];

fn default_directives(log_level: &str) -> String {
    std::iter::once("warn".to_string())
        .chain(OWN_TARGETS.iter().map(|target| format!("{target}={log_level}")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Send issuegraph's events to stderr, leaving stdout for the batch
/// summary and `--json` line. `RUST_LOG` replaces the default filter.
pub fn init(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
