//! TradingView stock screener filtered on RSI.

use super::{
    BodyTemplate, DateRule, Extraction, FeedId, FeedSpec, FieldMapping, HttpMethod, SummaryLine,
    TransportMode,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub static RSI_SCREENER: FeedSpec = FeedSpec {
    id: FeedId::RsiScreener,
    title: "RSI Screener",
    empty_noun: "stocks matching the RSI filter",
    slug: "rsi_screener",
    landing: "{tradingview}/",
    url_template: "{scanner}/india/scan?label-product=screener-stock",
    referer: "{tradingview}/",
    accept: "application/json",
    transport: TransportMode::ApiInPage,
    method: HttpMethod::Post,
    body: BodyTemplate::RsiScan,
    date_rule: DateRule::Today,
    extraction: Extraction::Json {
        records_path: Some("data"),
    },
    form: None,
    // Scan rows are `{ "s": "NSE:X", "d": [...] }`; `d` is positional and
    // follows SCAN_COLUMNS.
    fields: &[
        FieldMapping::required("s", "symbol"),
        FieldMapping::optional("d.1", "companyName"),
        FieldMapping::optional("d.6", "close"),
        FieldMapping::optional("d.21", "sector"),
        FieldMapping::optional("d.15", "marketCap"),
        FieldMapping::optional("d.11", "currency"),
        FieldMapping::optional("d.17", "peRatio"),
    ],
    summary: &[
        SummaryLine::new("Symbol", "{symbol}"),
        SummaryLine::new("Company Name", "{companyName}"),
        SummaryLine::new("Close", "{close}"),
        SummaryLine::new("Sector", "{sector}"),
        SummaryLine::new("Market Cap", "{marketCap}"),
        SummaryLine::new("Currency", "{currency}"),
        SummaryLine::new("P/E Ratio", "{peRatio}"),
    ],
    sort: None,
};

/// Columns requested from the scanner, in the order they come back in `d`.
pub const SCAN_COLUMNS: [&str; 26] = [
    "name",
    "description",
    "logoid",
    "update_mode",
    "type",
    "typespecs",
    "close",
    "pricescale",
    "minmov",
    "fractional",
    "minmove2",
    "currency",
    "change",
    "volume",
    "relative_volume_10d_calc",
    "market_cap_basic",
    "fundamental_currency_code",
    "price_earnings_ttm",
    "earnings_per_share_diluted_ttm",
    "earnings_per_share_diluted_yoy_growth_ttm",
    "dividends_yield_current",
    "sector.tr",
    "market",
    "sector",
    "recommendation_mark",
    "exchange",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Greater,
    Less,
}

impl Comparison {
    /// Operation name understood by the scanner API.
    pub fn operation(self) -> &'static str {
        match self {
            Comparison::Greater => "greater",
            Comparison::Less => "less",
        }
    }
}

/// RSI condition applied by the screener, e.g. `>82` or `<30`.
///
/// Has no default; a screener run without one fails at init.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenerFilter {
    pub comparison: Comparison,
    pub threshold: f64,
}

impl fmt::Display for ScreenerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.comparison {
            Comparison::Greater => '>',
            Comparison::Less => '<',
        };
        write!(f, "{op}{}", self.threshold)
    }
}

impl FromStr for ScreenerFilter {
    type Err = String;

    /// Accepts `>82`, `< 30`, `greater:82` and `less:30`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (comparison, rest) = if let Some(rest) = s.strip_prefix('>') {
            (Comparison::Greater, rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (Comparison::Less, rest)
        } else if let Some(rest) = s.strip_prefix("greater:") {
            (Comparison::Greater, rest)
        } else if let Some(rest) = s.strip_prefix("less:") {
            (Comparison::Less, rest)
        } else {
            return Err(format!(
                "invalid RSI filter `{s}`: expected `>N` or `<N`"
            ));
        };

        let threshold: f64 = rest
            .trim()
            .parse()
            .map_err(|_| format!("invalid RSI threshold `{}`", rest.trim()))?;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(format!("RSI threshold {threshold} is outside 0..=100"));
        }
        Ok(Self {
            comparison,
            threshold,
        })
    }
}

/// Scan request body for the NSE 500 universe filtered by `filter`.
pub fn scan_body(filter: &ScreenerFilter) -> serde_json::Value {
    let stock_kind = |typespec: &str| {
        serde_json::json!({ "operation": { "operator": "and", "operands": [
            { "expression": { "left": "type", "operation": "equal", "right": "stock" } },
            { "expression": { "left": "typespecs", "operation": "has", "right": [typespec] } },
        ]}})
    };

    serde_json::json!({
        "columns": SCAN_COLUMNS,
        "filter": [
            { "left": "is_blacklisted", "operation": "equal", "right": false },
            { "left": "RSI", "operation": filter.comparison.operation(), "right": filter.threshold },
        ],
        "ignore_unknown_fields": false,
        "options": { "lang": "en" },
        "range": [0, 100],
        "sort": { "sortBy": "market_cap_basic", "sortOrder": "desc" },
        "symbols": { "symbolset": ["SYML:NSE;CNX500"] },
        "markets": ["india"],
        "filter2": {
            "operator": "and",
            "operands": [{ "operation": { "operator": "or", "operands": [
                stock_kind("common"),
                stock_kind("preferred"),
                { "operation": { "operator": "and", "operands": [
                    { "expression": { "left": "type", "operation": "equal", "right": "dr" } },
                ]}},
                { "operation": { "operator": "and", "operands": [
                    { "expression": { "left": "type", "operation": "equal", "right": "fund" } },
                    { "expression": { "left": "typespecs", "operation": "has_none_of", "right": ["etf"] } },
                ]}},
            ]}}],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_forms() {
        let gt: ScreenerFilter = ">82".parse().unwrap();
        assert_eq!(gt.comparison, Comparison::Greater);
        assert_eq!(gt.threshold, 82.0);

        let lt: ScreenerFilter = " < 30 ".parse().unwrap();
        assert_eq!(lt.comparison, Comparison::Less);
        assert_eq!(lt.threshold, 30.0);

        assert_eq!("less:25.5".parse::<ScreenerFilter>().unwrap().threshold, 25.5);
        assert_eq!(gt.to_string(), ">82");
    }

    #[test]
    fn test_parse_filter_rejects_garbage() {
        assert!("82".parse::<ScreenerFilter>().is_err());
        assert!(">abc".parse::<ScreenerFilter>().is_err());
        assert!(">120".parse::<ScreenerFilter>().is_err());
    }

    #[test]
    fn test_scan_body_carries_filter() {
        let body = scan_body(&"<30".parse().unwrap());
        assert_eq!(body["filter"][1]["left"], "RSI");
        assert_eq!(body["filter"][1]["operation"], "less");
        assert_eq!(body["filter"][1]["right"], 30.0);
        assert_eq!(body["columns"][21], "sector.tr");
    }

    #[test]
    fn test_positional_keys_match_columns() {
        let column = |key: &str| {
            let idx: usize = key.trim_start_matches("d.").parse().unwrap();
            SCAN_COLUMNS[idx]
        };
        assert_eq!(column("d.1"), "description");
        assert_eq!(column("d.6"), "close");
        assert_eq!(column("d.11"), "currency");
        assert_eq!(column("d.15"), "market_cap_basic");
        assert_eq!(column("d.17"), "price_earnings_ttm");
        assert_eq!(column("d.21"), "sector.tr");
    }
}
