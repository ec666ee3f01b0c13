// Copyright 2026 Manual Mirror Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use manual_mirror::cli;
use manual_mirror::config::Overrides;
use manual_mirror::toc::ManualRef;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "manual-mirror",
    about = "Mirror a service manual into a local tree of PDFs",
    version,
    after_help = "Run 'manual-mirror <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Debug)]
struct ServiceArgs {
    /// Base URL leaf references are resolved against
    #[arg(long)]
    base_url: Option<String>,
    /// Base URL the ToC is fetched from (defaults to --base-url)
    #[arg(long)]
    toc_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a manual's ToC and save every page as a PDF
    Mirror {
        /// Manual to mirror, as KIND/ID (e.g. "RM/RM12345")
        manual: ManualRef,
        /// Output directory (defaults to the manual ID)
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Walk a previously saved toc-downloaded.json instead of fetching
        #[arg(long)]
        toc_file: Option<PathBuf>,
        #[command(flatten)]
        service: ServiceArgs,
        /// Per-step timeout for each page in seconds (0 disables)
        #[arg(long)]
        leaf_timeout: Option<u64>,
        /// Path to the Chromium binary
        #[arg(long)]
        chromium: Option<PathBuf>,
        /// Show the browser window
        #[arg(long)]
        headful: bool,
    },
    /// Fetch a manual's ToC and print it as JSON
    Toc {
        /// Manual to inspect, as KIND/ID
        manual: ManualRef,
        #[command(flatten)]
        service: ServiceArgs,
    },
    /// Check environment and diagnose issues
    Doctor {
        /// Path to the Chromium binary
        #[arg(long)]
        chromium: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var("MANUAL_MIRROR_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("MANUAL_MIRROR_QUIET", "1");
    }
    cli::init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Mirror {
            manual,
            out,
            toc_file,
            service,
            leaf_timeout,
            chromium,
            headful,
        } => {
            let overrides = Overrides {
                base_url: service.base_url,
                toc_url: service.toc_url,
                output: out,
                leaf_timeout_secs: leaf_timeout,
                chromium,
                headful,
            };
            cli::mirror_cmd::run(&manual, overrides, toc_file).await
        }
        Commands::Toc { manual, service } => {
            let overrides = Overrides {
                base_url: service.base_url,
                toc_url: service.toc_url,
                ..Default::default()
            };
            cli::toc_cmd::run(&manual, overrides).await
        }
        Commands::Doctor { chromium } => cli::doctor::run(chromium.as_deref()).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "manual-mirror", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else if !cli::output::is_quiet() {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
