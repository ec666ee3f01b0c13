//! CLI subcommand implementations for the manual-mirror binary.

pub mod doctor;
pub mod mirror_cmd;
pub mod output;
pub mod toc_cmd;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug and
/// `--quiet` selects warnings only.
pub fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("manual_mirror={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
