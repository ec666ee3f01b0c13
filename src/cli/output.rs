//! Output helpers shared by subcommands.

/// Whether `--quiet` was passed.
pub fn is_quiet() -> bool {
    std::env::var("MANUAL_MIRROR_QUIET").is_ok()
}

/// Whether `--json` was passed.
pub fn is_json() -> bool {
    std::env::var("MANUAL_MIRROR_JSON").is_ok()
}

/// Print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(_) => println!("{value}"),
    }
}
