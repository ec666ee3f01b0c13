//! `manual-mirror mirror <KIND/ID>`: fetch the ToC and mirror every page.

use super::output;
use crate::acquisition::AcquireOptions;
use crate::config::{MirrorConfig, Overrides};
use crate::mirror::{self, materialize::ensure_dir, WalkReport};
use crate::renderer::chromium::{ChromiumSession, LaunchOptions};
use crate::toc::artifacts::{read_json_toc, write_artifacts};
use crate::toc::fetch::TocClient;
use crate::toc::parse::parse_toc;
use crate::toc::{Children, ManualRef};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Timeout for the ToC request itself.
const TOC_TIMEOUT: Duration = Duration::from_secs(60);

/// Run the mirror command.
pub async fn run(manual: &ManualRef, overrides: Overrides, toc_file: Option<PathBuf>) -> Result<()> {
    let config = MirrorConfig::resolve(overrides)?;
    let out = config.output_for(&manual.id);
    ensure_dir(&out)
        .await
        .with_context(|| format!("failed to create output directory {}", out.display()))?;

    let toc = match toc_file {
        Some(path) => {
            info!("Loading table of contents from {}...", path.display());
            read_json_toc(&path).await?
        }
        None => fetch_and_save_toc(&config, manual, &out).await?,
    };

    info!("Downloading full manual... ({} pages)", toc.leaf_count());
    let mut session = ChromiumSession::launch(&LaunchOptions {
        chromium: config.chromium.clone(),
        headful: config.headful,
    })
    .await?;

    let options = AcquireOptions {
        timeout: config.leaf_timeout,
        ..Default::default()
    };
    let result = mirror::walk(&mut session, config.base_url.clone(), options, &out, &toc).await;

    if let Err(e) = session.close().await {
        warn!("failed to close browser session: {e:#}");
    }
    let report = result.context("mirror aborted")?;
    print_report(manual, &out, &report);
    Ok(())
}

async fn fetch_and_save_toc(config: &MirrorConfig, manual: &ManualRef, out: &Path) -> Result<Children> {
    info!("Downloading table of contents...");
    let client = TocClient::new(config.toc_url.clone(), TOC_TIMEOUT);
    let raw = client.fetch(manual).await?;
    let toc = parse_toc(&raw)?;

    info!("Saving table of contents...");
    write_artifacts(out, &raw, &toc).await?;
    Ok(toc)
}

fn print_report(manual: &ManualRef, out: &Path, report: &WalkReport) {
    if output::is_json() {
        let failures: Vec<serde_json::Value> = report
            .failures
            .iter()
            .map(|f| {
                serde_json::json!({
                    "name": f.name,
                    "path": f.path.display().to_string(),
                    "error": f.error,
                })
            })
            .collect();
        output::print_json(&serde_json::json!({
            "manual": manual.to_string(),
            "output": out.display().to_string(),
            "saved": report.saved(),
            "redirected": report.redirected,
            "downloaded": report.downloaded,
            "rendered": report.rendered,
            "directories_created": report.directories_created,
            "failures": failures,
        }));
        return;
    }
    if output::is_quiet() {
        return;
    }

    eprintln!();
    eprintln!("  Mirrored {manual} into {}", out.display());
    eprintln!(
        "  {} saved ({} redirected, {} downloaded, {} rendered), {} failed",
        report.saved(),
        report.redirected,
        report.downloaded,
        report.rendered,
        report.failures.len()
    );
    for failure in &report.failures {
        eprintln!("    - {}: {}", failure.name, failure.error);
    }
}
