//! Environment readiness check.

use super::output;
use crate::config::RuntimeConfig;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use std::path::Path;

/// Check Chromium availability, the output directory and feed configuration.
pub async fn run() -> Result<()> {
    let config = RuntimeConfig::from_env()?;
    let chromium = find_chromium(config.chromium_path.as_deref());
    let writable = check_writable(&config.output_dir);
    let ready = chromium.is_some() && writable.is_ok();

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "ready": ready,
            "chromium": chromium.as_ref().map(|p| p.display().to_string()),
            "output_dir": config.output_dir.display().to_string(),
            "output_dir_writable": writable.is_ok(),
            "rsi_filter": config.screener_filter.map(|f| f.to_string()),
            "holidays": config.holidays.len(),
        }));
        return Ok(());
    }

    println!("Filings Doctor");
    println!("==============");
    println!();
    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!("[!!] Chromium NOT found. Install Chrome or set FILINGS_CHROMIUM_PATH."),
    }
    match &writable {
        Ok(()) => println!(
            "[OK] Output directory {} is writable",
            config.output_dir.display()
        ),
        Err(e) => println!(
            "[!!] Output directory {} is not writable: {e}",
            config.output_dir.display()
        ),
    }
    match config.screener_filter {
        Some(filter) => println!("[OK] RSI screener filter: RSI {filter}"),
        None => println!("[--] No RSI filter set; rsi-screener is skipped by run-all"),
    }
    println!("[--] {} configured holiday(s)", config.holidays.len());

    println!();
    if ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}

fn check_writable(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe = dir.join(".filings-doctor");
    std::fs::write(&probe, b"ok")?;
    std::fs::remove_file(&probe)
}
