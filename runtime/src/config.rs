//! Runtime configuration assembled from `FILINGS_*` environment variables.
//!
//! The pipeline core never reads the environment; the CLI builds a
//! [`RuntimeConfig`] here, applies its flag overrides and hands it down.

use crate::acquisition::retry::{RetryPolicy, DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS};
use crate::error::PipelineError;
use crate::feeds::screener::ScreenerFilter;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Base URL of every upstream site. Feed templates refer to them as
/// `{nse}`, `{bse}`, `{tradingview}` and `{scanner}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteUrls {
    pub nse: String,
    pub bse: String,
    pub tradingview: String,
    pub scanner: String,
}

impl Default for SiteUrls {
    fn default() -> Self {
        Self {
            nse: "https://www.nseindia.com".to_string(),
            bse: "https://www.bseindia.com".to_string(),
            tradingview: "https://www.tradingview.com".to_string(),
            scanner: "https://scanner.tradingview.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Directory every artifact is written to.
    pub output_dir: PathBuf,
    /// Browser contexts open at the same time.
    pub max_concurrent_sessions: usize,
    pub navigation_timeout_ms: u64,
    /// Timeout of one API call (in-page fetch or direct navigation).
    pub api_timeout_ms: u64,
    pub settle_timeout_ms: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub chromium_path: Option<PathBuf>,
    pub headless: bool,
    pub user_agent: String,
    pub sites: SiteUrls,
    /// Exchange holidays skipped when shifting to a trading day.
    pub holidays: Vec<NaiveDate>,
    pub shift_non_trading_days: bool,
    pub screener_filter: Option<ScreenerFilter>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            max_concurrent_sessions: 2,
            navigation_timeout_ms: 30_000,
            api_timeout_ms: 90_000,
            settle_timeout_ms: 30_000,
            retry_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_DELAY.as_millis() as u64,
            chromium_path: None,
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            sites: SiteUrls::default(),
            holidays: Vec::new(),
            shift_non_trading_days: true,
            screener_filter: None,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PipelineError> {
        let defaults = Self::default();
        let env = EnvReader { lookup: &lookup };

        let holidays = match env.string("FILINGS_HOLIDAYS") {
            Some(list) => parse_holidays(&list)?,
            None => Vec::new(),
        };
        let screener_filter = env
            .string("FILINGS_RSI_FILTER")
            .map(|raw| raw.parse::<ScreenerFilter>())
            .transpose()
            .map_err(PipelineError::Config)?;

        Ok(Self {
            output_dir: env
                .string("FILINGS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            max_concurrent_sessions: env
                .usize("FILINGS_MAX_SESSIONS", defaults.max_concurrent_sessions)
                .max(1),
            navigation_timeout_ms: env.u64("FILINGS_NAV_TIMEOUT_MS", defaults.navigation_timeout_ms),
            api_timeout_ms: env.u64("FILINGS_API_TIMEOUT_MS", defaults.api_timeout_ms),
            settle_timeout_ms: env.u64("FILINGS_SETTLE_TIMEOUT_MS", defaults.settle_timeout_ms),
            retry_attempts: env.u32("FILINGS_RETRY_ATTEMPTS", defaults.retry_attempts),
            retry_delay_ms: env.u64("FILINGS_RETRY_DELAY_MS", defaults.retry_delay_ms),
            chromium_path: env.string("FILINGS_CHROMIUM_PATH").map(PathBuf::from),
            headless: env.bool("FILINGS_HEADLESS", defaults.headless),
            user_agent: env
                .string("FILINGS_USER_AGENT")
                .unwrap_or(defaults.user_agent),
            sites: SiteUrls {
                nse: env.string("FILINGS_NSE_BASE_URL").unwrap_or(defaults.sites.nse),
                bse: env.string("FILINGS_BSE_BASE_URL").unwrap_or(defaults.sites.bse),
                tradingview: env
                    .string("FILINGS_TRADINGVIEW_BASE_URL")
                    .unwrap_or(defaults.sites.tradingview),
                scanner: env
                    .string("FILINGS_SCREENER_BASE_URL")
                    .unwrap_or(defaults.sites.scanner),
            },
            holidays,
            shift_non_trading_days: env
                .bool("FILINGS_SHIFT_NON_TRADING_DAYS", defaults.shift_non_trading_days),
            screener_filter,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

/// Parse a comma-separated list of `dd-mm-yyyy` dates.
pub fn parse_holidays(list: &str) -> Result<Vec<NaiveDate>, PipelineError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(s, "%d-%m-%Y")
                .map_err(|_| PipelineError::Config(format!("invalid holiday `{s}`, expected dd-mm-yyyy")))
        })
        .collect()
}

struct EnvReader<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl EnvReader<'_> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn u64(&self, name: &str, default_value: u64) -> u64 {
        self.string(name)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(default_value)
    }

    fn u32(&self, name: &str, default_value: u32) -> u32 {
        self.string(name)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(default_value)
    }

    fn usize(&self, name: &str, default_value: usize) -> usize {
        self.string(name)
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(default_value)
    }

    fn bool(&self, name: &str, default_value: bool) -> bool {
        match self.string(name).map(|v| v.to_ascii_lowercase()).as_deref() {
            Some("1" | "true" | "yes" | "on") => true,
            Some("0" | "false" | "no" | "off") => false,
            _ => default_value,
        }
    }
}
