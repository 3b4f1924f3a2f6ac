//! Declarative catalog of every supported disclosure feed.
//!
//! A [`FeedSpec`] says where a feed lives, how it is fetched, where its records
//! sit in the payload, which source keys become which canonical keys, and how
//! the human-readable summary is laid out. The pipeline is feed-agnostic; all
//! per-feed knowledge lives here.

pub mod bse;
pub mod nse;
pub mod screener;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a feed, in its kebab-case CLI spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedId {
    Announcements,
    BlockDeals,
    BoardMeetings,
    CorporateActions,
    InsiderTrading,
    EventCalendar,
    FinancialResults,
    MarketIndex,
    MarketTurnover,
    PressReleases,
    BseNotices,
    RsiScreener,
}

impl FeedId {
    pub const ALL: [FeedId; 12] = [
        FeedId::Announcements,
        FeedId::BlockDeals,
        FeedId::BoardMeetings,
        FeedId::CorporateActions,
        FeedId::InsiderTrading,
        FeedId::EventCalendar,
        FeedId::FinancialResults,
        FeedId::MarketIndex,
        FeedId::MarketTurnover,
        FeedId::PressReleases,
        FeedId::BseNotices,
        FeedId::RsiScreener,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeedId::Announcements => "announcements",
            FeedId::BlockDeals => "block-deals",
            FeedId::BoardMeetings => "board-meetings",
            FeedId::CorporateActions => "corporate-actions",
            FeedId::InsiderTrading => "insider-trading",
            FeedId::EventCalendar => "event-calendar",
            FeedId::FinancialResults => "financial-results",
            FeedId::MarketIndex => "market-index",
            FeedId::MarketTurnover => "market-turnover",
            FeedId::PressReleases => "press-releases",
            FeedId::BseNotices => "bse-notices",
            FeedId::RsiScreener => "rsi-screener",
        }
    }

    /// The static definition of this feed.
    pub fn spec(self) -> &'static FeedSpec {
        match self {
            FeedId::Announcements => &nse::ANNOUNCEMENTS,
            FeedId::BlockDeals => &nse::BLOCK_DEALS,
            FeedId::BoardMeetings => &nse::BOARD_MEETINGS,
            FeedId::CorporateActions => &nse::CORPORATE_ACTIONS,
            FeedId::InsiderTrading => &nse::INSIDER_TRADING,
            FeedId::EventCalendar => &nse::EVENT_CALENDAR,
            FeedId::FinancialResults => &nse::FINANCIAL_RESULTS,
            FeedId::MarketIndex => &nse::MARKET_INDEX,
            FeedId::MarketTurnover => &nse::MARKET_TURNOVER,
            FeedId::PressReleases => &nse::PRESS_RELEASES,
            FeedId::BseNotices => &bse::NOTICES,
            FeedId::RsiScreener => &screener::RSI_SCREENER,
        }
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        FeedId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = FeedId::ALL.iter().map(|id| id.as_str()).collect();
                format!("unknown feed `{s}` (known: {})", known.join(", "))
            })
    }
}

/// How the data request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    /// `fetch()` evaluated inside the bootstrapped page.
    ApiInPage,
    /// Navigate the page straight to the JSON endpoint.
    ApiDirect,
    /// Fill and submit a form, then scrape the rendered HTML.
    HtmlForm,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportMode::ApiInPage => "api-in-page",
            TransportMode::ApiDirect => "api-direct",
            TransportMode::HtmlForm => "html-form",
        })
    }
}

/// Which days a run covers, relative to its anchor day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateRule {
    Today,
    YesterdayToToday,
}

impl fmt::Display for DateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DateRule::Today => "today",
            DateRule::YesterdayToToday => "yesterday-to-today",
        })
    }
}

/// HTTP method used by in-page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Request body a feed sends, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyTemplate {
    None,
    /// Stock scan filtered by the configured RSI condition.
    RsiScan,
}

/// Where the records live in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// A JSON array, at the root or under `records_path`.
    Json { records_path: Option<&'static str> },
    /// Rows of an HTML table.
    HtmlTable(TableSpec),
}

/// Layout of a results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub selector: &'static str,
    /// Rows with fewer cells than this are skipped.
    pub min_columns: usize,
    /// Class marking pagination rows.
    pub pagination_class: Option<&'static str>,
    pub columns: &'static [ColumnSpec],
}

/// One field read from a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub index: usize,
    pub key: &'static str,
    pub source: CellSource,
}

/// What to read out of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSource {
    /// Whitespace-trimmed visible text.
    Text,
    /// Text of the first anchor.
    AnchorText,
    /// `href` of the first anchor, resolved against the page URL.
    AnchorHref,
    /// `id` of the first element matching the selector.
    ElementId(&'static str),
}

/// A source key and the canonical key it becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub source: &'static str,
    pub canonical: &'static str,
    pub required: bool,
    pub date: bool,
}

impl FieldMapping {
    pub const fn optional(source: &'static str, canonical: &'static str) -> Self {
        Self {
            source,
            canonical,
            required: false,
            date: false,
        }
    }

    pub const fn required(source: &'static str, canonical: &'static str) -> Self {
        Self {
            source,
            canonical,
            required: true,
            date: false,
        }
    }

    pub const fn date(source: &'static str, canonical: &'static str) -> Self {
        Self {
            source,
            canonical,
            required: false,
            date: true,
        }
    }
}

/// One `Label: value` line of a summary block. `template` names canonical
/// keys in braces, e.g. `"Rs. {price}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryLine {
    pub label: &'static str,
    pub template: &'static str,
}

impl SummaryLine {
    pub const fn new(label: &'static str, template: &'static str) -> Self {
        Self { label, template }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Secondary ordering of canonical records. Stable; ties keep source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: &'static str,
    pub direction: SortDirection,
}

/// Value typed into a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormValue {
    FromDate,
    ToDate,
    Literal(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFieldKind {
    Input,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormField {
    pub selector: &'static str,
    pub kind: FormFieldKind,
    pub value: FormValue,
}

/// A search form submitted by the `html-form` transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormSpec {
    pub fields: &'static [FormField],
    pub submit: &'static str,
    /// Present only once results have rendered.
    pub ready_selector: &'static str,
}

/// Everything the pipeline needs to know about one feed.
#[derive(Debug)]
pub struct FeedSpec {
    pub id: FeedId,
    /// Summary header, without the trailing "Summary".
    pub title: &'static str,
    /// Completes "No <noun> found for the specified date range."
    pub empty_noun: &'static str,
    /// File name stem for artifacts.
    pub slug: &'static str,
    /// Page visited first to collect anti-bot cookies.
    pub landing: &'static str,
    /// Data endpoint or form page. Placeholders: site bases, `{from}`, `{to}`.
    pub url_template: &'static str,
    /// Referer sent with every request.
    pub referer: &'static str,
    pub accept: &'static str,
    pub transport: TransportMode,
    pub method: HttpMethod,
    pub body: BodyTemplate,
    pub date_rule: DateRule,
    pub extraction: Extraction,
    pub form: Option<FormSpec>,
    pub fields: &'static [FieldMapping],
    pub summary: &'static [SummaryLine],
    pub sort: Option<SortSpec>,
}

impl FeedSpec {
    /// Canonical keys that must be non-empty.
    pub fn mandatory_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.canonical)
    }
}

/// Every feed, in catalog order.
pub fn catalog() -> impl Iterator<Item = &'static FeedSpec> {
    FeedId::ALL.into_iter().map(FeedId::spec)
}
