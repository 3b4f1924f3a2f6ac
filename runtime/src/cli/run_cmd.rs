//! `filings run` and `filings run-all`.

use super::output;
use crate::config::RuntimeConfig;
use crate::feeds::screener::ScreenerFilter;
use crate::feeds::{BodyTemplate, FeedId};
use crate::pipeline::pool::run_many;
use crate::pipeline::{Pipeline, RunReport};
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use std::sync::Arc;

/// Flag overrides on top of the environment configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub date: Option<NaiveDate>,
    pub out: Option<PathBuf>,
    pub max_sessions: Option<usize>,
    pub rsi_filter: Option<ScreenerFilter>,
    pub no_shift: bool,
    pub headful: bool,
}

impl RunOptions {
    pub fn apply(&self, config: &mut RuntimeConfig) {
        if let Some(out) = &self.out {
            config.output_dir = out.clone();
        }
        if let Some(max) = self.max_sessions {
            config.max_concurrent_sessions = max.max(1);
        }
        if let Some(filter) = self.rsi_filter {
            config.screener_filter = Some(filter);
        }
        if self.no_shift {
            config.shift_non_trading_days = false;
        }
        if self.headful {
            config.headless = false;
        }
    }
}

/// Parse a `dd-mm-yyyy` date flag.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%d-%m-%Y")
        .map_err(|_| format!("invalid date `{s}`, expected dd-mm-yyyy"))
}

/// Feeds `run-all` can build requests for under `config`.
pub fn runnable_feeds(config: &RuntimeConfig) -> Vec<FeedId> {
    FeedId::ALL
        .into_iter()
        .filter(|id| match id.spec().body {
            BodyTemplate::RsiScan => config.screener_filter.is_some(),
            BodyTemplate::None => true,
        })
        .collect()
}

pub async fn run(feeds: &[FeedId], options: &RunOptions) -> Result<()> {
    let mut config = RuntimeConfig::from_env()?;
    options.apply(&mut config);
    execute(feeds, options, config).await
}

pub async fn run_all(options: &RunOptions) -> Result<()> {
    let mut config = RuntimeConfig::from_env()?;
    options.apply(&mut config);
    let feeds = runnable_feeds(&config);
    if feeds.len() < FeedId::ALL.len() {
        tracing::info!("skipping rsi-screener: no RSI filter configured");
    }
    execute(&feeds, options, config).await
}

async fn execute(feeds: &[FeedId], options: &RunOptions, config: RuntimeConfig) -> Result<()> {
    if feeds.is_empty() {
        bail!("no feeds to run");
    }
    let today = options.date.unwrap_or_else(|| Local::now().date_naive());
    let max_sessions = config.max_concurrent_sessions;

    let renderer: Arc<dyn Renderer> =
        Arc::new(ChromiumRenderer::launch(config.chromium_path.as_deref(), config.headless).await?);
    let pipeline = Pipeline::new(Arc::clone(&renderer), config);

    let reports = run_many(&pipeline, feeds, today, max_sessions).await;
    if let Err(e) = renderer.shutdown().await {
        tracing::warn!("browser shutdown failed: {e:#}");
    }

    report(&reports);

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        bail!("{failed} of {} run(s) failed", reports.len());
    }
    Ok(())
}

fn report(reports: &[RunReport]) {
    if output::is_json() {
        let runs: Vec<serde_json::Value> = reports.iter().map(report_json).collect();
        output::print_json(&serde_json::json!({ "runs": runs }));
        return;
    }

    for r in reports {
        match &r.result {
            Ok(set) => {
                println!(
                    "[OK] {:<18} {} record(s), {} dropped ({})",
                    r.feed.as_str(),
                    set.records,
                    set.dropped,
                    set.range
                );
                if let Some(handoff) = set.handoff() {
                    println!("     summary: {}", handoff.summary.display());
                }
            }
            Err(failure) => println!("[!!] {:<18} {failure}", r.feed.as_str()),
        }
    }
}

fn report_json(r: &RunReport) -> serde_json::Value {
    match &r.result {
        Ok(set) => serde_json::json!({
            "run_id": r.run_id,
            "feed": r.feed,
            "status": "done",
            "artifacts": set,
            "handoff": set.handoff(),
        }),
        Err(failure) => serde_json::json!({
            "run_id": r.run_id,
            "feed": r.feed,
            "status": "failed",
            "stage": failure.stage,
            "error": failure.source.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_flag() {
        assert_eq!(
            parse_date("17-04-2025"),
            Ok(NaiveDate::from_ymd_opt(2025, 4, 17).unwrap())
        );
        assert!(parse_date("2025-04-17").is_err());
    }

    #[test]
    fn test_run_all_skips_screener_without_filter() {
        let mut config = RuntimeConfig::default();
        let feeds = runnable_feeds(&config);
        assert_eq!(feeds.len(), 11);
        assert!(!feeds.contains(&FeedId::RsiScreener));

        config.screener_filter = Some(">82".parse().unwrap());
        assert_eq!(runnable_feeds(&config).len(), 12);
    }

    #[test]
    fn test_options_override_config() {
        let mut config = RuntimeConfig::default();
        RunOptions {
            out: Some(PathBuf::from("/tmp/filings")),
            max_sessions: Some(0),
            no_shift: true,
            ..RunOptions::default()
        }
        .apply(&mut config);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/filings"));
        assert_eq!(config.max_concurrent_sessions, 1);
        assert!(!config.shift_non_trading_days);
    }
}
