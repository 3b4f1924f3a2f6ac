//! Construction of the immutable per-run [`FetchRequest`].

use crate::config::{RuntimeConfig, SiteUrls};
use crate::error::PipelineError;
use crate::feeds::screener::scan_body;
use crate::feeds::{
    BodyTemplate, DateRule, FeedId, FeedSpec, FormFieldKind, FormValue, HttpMethod, TransportMode,
};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;
use std::fmt;

/// Date format used in upstream URLs, form fields and artifact names.
pub const REQUEST_DATE_FORMAT: &str = "%d-%m-%Y";

/// Inclusive date range of one run. `from == to` is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// The range a rule covers when anchored on `day`.
    pub fn for_rule(rule: DateRule, day: NaiveDate) -> Self {
        let from = match rule {
            DateRule::Today => day,
            DateRule::YesterdayToToday => day.checked_sub_days(Days::new(1)).unwrap_or(day),
        };
        Self { from, to: day }
    }

    pub fn from_param(&self) -> String {
        self.from.format(REQUEST_DATE_FORMAT).to_string()
    }

    pub fn to_param(&self) -> String {
        self.to.format(REQUEST_DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from_param(), self.to_param())
    }
}

/// Move `day` backward past weekends and `holidays`.
pub fn last_trading_day(day: NaiveDate, holidays: &[NaiveDate]) -> NaiveDate {
    let mut day = day;
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) || holidays.contains(&day) {
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    day
}

/// A form field with its value resolved for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledField {
    pub selector: &'static str,
    pub kind: FormFieldKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub fields: Vec<FilledField>,
    pub submit: &'static str,
    pub ready_selector: &'static str,
}

/// Everything needed to acquire one feed for one date range.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub feed: FeedId,
    pub spec: &'static FeedSpec,
    pub range: DateRange,
    pub transport: TransportMode,
    pub url: String,
    pub landing_url: String,
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
    pub method: HttpMethod,
    pub body: Option<String>,
    pub form: Option<FormSubmission>,
}

impl FetchRequest {
    /// Build the request for `feed` anchored on `today`.
    pub fn build(
        feed: FeedId,
        today: NaiveDate,
        config: &RuntimeConfig,
    ) -> Result<Self, PipelineError> {
        let spec = feed.spec();
        let anchor = if config.shift_non_trading_days {
            last_trading_day(today, &config.holidays)
        } else {
            today
        };
        if anchor != today {
            tracing::info!(feed = %feed, %today, %anchor, "shifted to last trading day");
        }
        let range = DateRange::for_rule(spec.date_rule, anchor);

        let url = render(spec.url_template, &config.sites, &range)?;
        let landing_url = render(spec.landing, &config.sites, &range)?;
        let referer = render(spec.referer, &config.sites, &range)?;

        let body = match spec.body {
            BodyTemplate::None => None,
            BodyTemplate::RsiScan => {
                let filter = config.screener_filter.ok_or_else(|| {
                    PipelineError::Config(format!(
                        "{feed} needs an RSI filter (--rsi-filter or FILINGS_RSI_FILTER)"
                    ))
                })?;
                Some(scan_body(&filter).to_string())
            }
        };

        let form = spec.form.map(|form| FormSubmission {
            fields: form
                .fields
                .iter()
                .map(|field| FilledField {
                    selector: field.selector,
                    kind: field.kind,
                    value: match field.value {
                        FormValue::FromDate => range.from_param(),
                        FormValue::ToDate => range.to_param(),
                        FormValue::Literal(v) => v.to_string(),
                    },
                })
                .collect(),
            submit: form.submit,
            ready_selector: form.ready_selector,
        });

        Ok(Self {
            feed,
            spec,
            range,
            transport: spec.transport,
            url,
            landing_url,
            user_agent: config.user_agent.clone(),
            headers: vec![
                ("Accept".to_string(), spec.accept.to_string()),
                ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
                ("Referer".to_string(), referer),
            ],
            method: spec.method,
            body,
            form,
        })
    }

    /// Value of an extra header, if set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Substitute site bases and dates into a URL template and validate it.
fn render(template: &str, sites: &SiteUrls, range: &DateRange) -> Result<String, PipelineError> {
    let rendered = template
        .replace("{nse}", sites.nse.trim_end_matches('/'))
        .replace("{bse}", sites.bse.trim_end_matches('/'))
        .replace("{tradingview}", sites.tradingview.trim_end_matches('/'))
        .replace("{scanner}", sites.scanner.trim_end_matches('/'))
        .replace("{from}", &range.from_param())
        .replace("{to}", &range.to_param());
    url::Url::parse(&rendered)
        .map_err(|e| PipelineError::Config(format!("invalid URL `{rendered}`: {e}")))?;
    Ok(rendered)
}
