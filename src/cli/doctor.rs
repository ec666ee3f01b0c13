//! Environment readiness check.

use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use std::path::Path;

/// Check Chromium availability and the output location.
pub async fn run(chromium: Option<&Path>) -> Result<()> {
    println!("manual-mirror doctor");
    println!("====================");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let chromium_path = find_chromium(chromium);
    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome/Chromium or set MANUAL_MIRROR_CHROMIUM_PATH."
        ),
    }

    let tmp = std::env::temp_dir();
    if tmp.is_dir() {
        println!("[OK] Download staging dir: {}", tmp.display());
    } else {
        println!("[!!] Temp directory does not exist: {}", tmp.display());
    }

    println!();
    if chromium_path.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}
