//! NSE (nseindia.com) feeds.
//!
//! Every NSE endpoint sits behind cookies handed out by the site's HTML pages,
//! so each feed bootstraps on a landing page before calling the API.

use super::{
    BodyTemplate, DateRule, Extraction, FeedId, FeedSpec, FieldMapping, HttpMethod, SortDirection,
    SortSpec, SummaryLine, TransportMode,
};

const JSON_ACCEPT: &str = "application/json, text/plain, */*";

pub static ANNOUNCEMENTS: FeedSpec = FeedSpec {
    id: FeedId::Announcements,
    title: "NSE Corporate Announcements",
    empty_noun: "announcements",
    slug: "nse_announcements",
    landing: "{nse}/companies-listing/corporate-filings-announcements",
    url_template: "{nse}/api/corporate-announcements?index=equities&from_date={from}&to_date={to}",
    referer: "{nse}/companies-listing/corporate-filings-announcements",
    accept: JSON_ACCEPT,
    transport: TransportMode::ApiInPage,
    method: HttpMethod::Get,
    body: BodyTemplate::None,
    date_rule: DateRule::Today,
    extraction: Extraction::Json { records_path: None },
    form: None,
    fields: &[
        FieldMapping::required("symbol", "symbol"),
        FieldMapping::optional("sm_name", "companyName"),
        FieldMapping::optional("sm_isin", "isin"),
        FieldMapping::optional("desc", "description"),
        FieldMapping::date("an_dt", "announcementDate"),
        FieldMapping::optional("smIndustry", "industry"),
        FieldMapping::optional("attchmntText", "details"),
        FieldMapping::optional("attchmntFile", "attachment"),
    ],
    summary: &[
        SummaryLine::new("Symbol", "{symbol}"),
        SummaryLine::new("Company", "{companyName}"),
        SummaryLine::new("ISIN", "{isin}"),
        SummaryLine::new("Description", "{description}"),
        SummaryLine::new("Announcement Date", "{announcementDate}"),
        SummaryLine::new("Industry", "{industry}"),
        SummaryLine::new("Details", "{details}"),
        SummaryLine::new("Attachment", "{attachment}"),
    ],
    sort: None,
};

pub static BLOCK_DEALS: FeedSpec = FeedSpec {
    id: FeedId::BlockDeals,
    title: "Block Deals",
    empty_noun: "block deals",
    slug: "block_deals",
    landing: "{nse}/",
    url_template: "{nse}/api/historical/block-deals?from={from}&to={to}",
    referer: "{nse}/",
    accept: JSON_ACCEPT,
    transport: TransportMode::ApiDirect,
    method: HttpMethod::Get,
    body: BodyTemplate::None,
    date_rule: DateRule::YesterdayToToday,
    extraction: Extraction::Json {
        records_path: Some("data"),
    },
    form: None,
    fields: &[
        FieldMapping::required("BD_SYMBOL", "symbol"),
        FieldMapping::optional("BD_SCRIP_NAME", "companyName"),
        FieldMapping::optional("BD_CLIENT_NAME", "clientName"),
        FieldMapping::optional("BD_BUY_SELL", "buySell"),
        FieldMapping::optional("BD_QTY_TRD", "quantity"),
        FieldMapping::optional("BD_TP_WATP", "price"),
        FieldMapping::date("mTIMESTAMP", "date"),
    ],
    summary: &[
        SummaryLine::new("Symbol", "{symbol}"),
        SummaryLine::new("Company", "{companyName}"),
        SummaryLine::new("Client", "{clientName}"),
        SummaryLine::new("Transaction Type", "{buySell}"),
        SummaryLine::new("Quantity", "{quantity}"),
        SummaryLine::new("Price", "Rs. {price}"),
        SummaryLine::new("Date", "{date}"),
    ],
    sort: None,
};

pub static BOARD_MEETINGS: FeedSpec = FeedSpec {
    id: FeedId::BoardMeetings,
    title: "NSE Board Meetings",
    empty_noun: "valid board meetings",
    slug: "nse_board_meetings",
    landing: "{nse}/companies-listing/corporate-filings-board-meetings",
    url_template: "{nse}/api/corporate-board-meetings?index=equities&from_date={from}&to_date={to}",
    referer: "{nse}/companies-listing/corporate-filings-board-meetings",
    accept: JSON_ACCEPT,
    transport: TransportMode::ApiInPage,
    method: HttpMethod::Get,
    body: BodyTemplate::None,
    date_rule: DateRule::YesterdayToToday,
    extraction: Extraction::Json { records_path: None },
    form: None,
    fields: &[
        FieldMapping::required("bm_symbol", "symbol"),
        FieldMapping::required("sm_name", "companyName"),
        FieldMapping::optional("bm_purpose", "purpose"),
        FieldMapping::date("bm_date", "boardMeetingDate"),
        FieldMapping::optional("bm_desc", "description"),
        FieldMapping::optional("sm_indusrty", "industry"),
        FieldMapping::optional("sm_isin", "isin"),
        FieldMapping::optional("attachment", "attachment"),
    ],
    summary: &[
        SummaryLine::new("Symbol", "{symbol}"),
        SummaryLine::new("Company", "{companyName}"),
        SummaryLine::new("ISIN", "{isin}"),
        SummaryLine::new("Industry", "{industry}"),
        SummaryLine::new("Purpose", "{purpose}"),
        SummaryLine::new("Date", "{boardMeetingDate}"),
        SummaryLine::new("Description", "{description}"),
        SummaryLine::new("Attachment", "{attachment}"),
    ],
    sort: None,
};

pub static CORPORATE_ACTIONS: FeedSpec = FeedSpec {
    id: FeedId::CorporateActions,
    title: "Corporate Actions",
    empty_noun: "corporate actions",
    slug: "corporate_actions",
    landing: "{nse}/",
    url_template: "{nse}/api/corporate-actions?index=equities&from_date={from}&to_date={to}",
    referer: "{nse}/",
    accept: JSON_ACCEPT,
    transport: TransportMode::ApiDirect,
    method: HttpMethod::Get,
    body: BodyTemplate::None,
    date_rule: DateRule::YesterdayToToday,
    extraction: Extraction::Json { records_path: None },
    form: None,
    fields: &[
        FieldMapping::required("symbol", "symbol"),
        FieldMapping::optional("companyName", "companyName"),
        FieldMapping::optional("actionType", "actionType"),
        FieldMapping::date("exDate", "exDate"),
        FieldMapping::optional("purpose", "purpose"),
        FieldMapping::optional("details", "details"),
    ],
    summary: &[
        SummaryLine::new("Symbol", "{symbol}"),
        SummaryLine::new("Company", "{companyName}"),
        SummaryLine::new("Action Type", "{actionType}"),
        SummaryLine::new("Ex-Date", "{exDate}"),
        SummaryLine::new("Purpose", "{purpose}"),
        SummaryLine::new("Details", "{details}"),
    ],
    sort: None,
};

pub static INSIDER_TRADING: FeedSpec = FeedSpec {
    id: FeedId::InsiderTrading,
    title: "Insider Trading",
    empty_noun: "insider trades",
    slug: "insider_trading",
    landing: "{nse}/",
    url_template: "{nse}/api/corporates-pit?index=equities&from_date={from}&to_date={to}",
    referer: "{nse}/",
    accept: JSON_ACCEPT,
    transport: TransportMode::ApiDirect,
    method: HttpMethod::Get,
    body: BodyTemplate::None,
    date_rule: DateRule::Today,
    extraction: Extraction::Json {
        records_path: Some("data"),
    },
    form: None,
    fields: &[
        FieldMapping::required("symbol", "symbol"),
        FieldMapping::optional("company", "company"),
        FieldMapping::optional("acqName", "acquirerName"),
        FieldMapping::optional("personCategory", "personCategory"),
        FieldMapping::optional("tdpTransactionType", "transactionType"),
        FieldMapping::optional("secType", "securityType"),
        FieldMapping::optional("secAcq", "securityAcquired"),
        FieldMapping::optional("secVal", "securityValue"),
        FieldMapping::optional("befAcqSharesNo", "preSharesNo"),
        FieldMapping::optional("befAcqSharesPer", "preSharesPer"),
        FieldMapping::optional("afterAcqSharesNo", "postSharesNo"),
        FieldMapping::optional("afterAcqSharesPer", "postSharesPer"),
        FieldMapping::optional("acqMode", "acquisitionMode"),
        FieldMapping::optional("exchange", "exchange"),
        FieldMapping::date("date", "date"),
    ],
    summary: &[
        SummaryLine::new("Symbol", "{symbol}"),
        SummaryLine::new("Company", "{company}"),
        SummaryLine::new("Acquirer Name", "{acquirerName}"),
        SummaryLine::new("Person Category", "{personCategory}"),
        SummaryLine::new("Transaction Type", "{transactionType}"),
        SummaryLine::new("Security Type", "{securityType}"),
        SummaryLine::new("Securities Acquired", "{securityAcquired}"),
        SummaryLine::new("Security Value", "Rs. {securityValue}"),
        SummaryLine::new("Pre-Transaction Shares", "{preSharesNo} ({preSharesPer}%)"),
        SummaryLine::new("Post-Transaction Shares", "{postSharesNo} ({postSharesPer}%)"),
        SummaryLine::new("Acquisition Mode", "{acquisitionMode}"),
        SummaryLine::new("Exchange", "{exchange}"),
        SummaryLine::new("Date", "{date}"),
    ],
    sort: None,
};

pub static EVENT_CALENDAR: FeedSpec = FeedSpec {
    id: FeedId::EventCalendar,
    title: "Event Calendar",
    empty_noun: "events",
    slug: "event_calendar",
    landing: "{nse}/",
    url_template: "{nse}/api/event-calendar?index=equities&from_date={from}&to_date={to}",
    referer: "{nse}/",
    accept: JSON_ACCEPT,
    transport: TransportMode::ApiDirect,
    method: HttpMethod::Get,
    body: BodyTemplate::None,
    date_rule: DateRule::Today,
    extraction: Extraction::Json { records_path: None },
    form: None,
    fields: &[
        FieldMapping::required("symbol", "symbol"),
        FieldMapping::optional("company", "company"),
        FieldMapping::optional("purpose", "purpose"),
        FieldMapping::optional("bm_desc", "description"),
        FieldMapping::date("date", "date"),
    ],
    summary: &[
        SummaryLine::new("Symbol", "{symbol}"),
        SummaryLine::new("Company", "{company}"),
        SummaryLine::new("Purpose", "{purpose}"),
        SummaryLine::new("Description", "{description}"),
        SummaryLine::new("Date", "{date}"),
    ],
    sort: None,
};

pub static FINANCIAL_RESULTS: FeedSpec = FeedSpec {
    id: FeedId::FinancialResults,
    title: "Financial Results",
    empty_noun: "financial results",
    slug: "financial_results",
    landing: "{nse}/",
    url_template: "{nse}/api/corporates-financial-results?index=equities&from_date={from}&to_date={to}&period=Quarterly",
    referer: "{nse}/",
    accept: JSON_ACCEPT,
    transport: TransportMode::ApiDirect,
    method: HttpMethod::Get,
    body: BodyTemplate::None,
    date_rule: DateRule::YesterdayToToday,
    extraction: Extraction::Json { records_path: None },
    form: None,
    fields: &[
        FieldMapping::required("symbol", "symbol"),
        FieldMapping::optional("companyName", "companyName"),
        FieldMapping::optional("period", "period"),
        FieldMapping::optional("relatingTo", "relatingTo"),
        FieldMapping::optional("financialYear", "financialYear"),
        FieldMapping::date("filingDate", "filingDate"),
        FieldMapping::optional("consolidated", "consolidated"),
        FieldMapping::optional("xbrl", "xbrl"),
    ],
    summary: &[
        SummaryLine::new("Symbol", "{symbol}"),
        SummaryLine::new("Company", "{companyName}"),
        SummaryLine::new("Period", "{period}"),
        SummaryLine::new("Quarter", "{relatingTo}"),
        SummaryLine::new("Financial Year", "{financialYear}"),
        SummaryLine::new("Filing Date", "{filingDate}"),
        SummaryLine::new("Consolidated", "{consolidated}"),
        SummaryLine::new("XBRL Link", "{xbrl}"),
    ],
    sort: None,
};

pub static MARKET_INDEX: FeedSpec = FeedSpec {
    id: FeedId::MarketIndex,
    title: "Market Index (NIFTY 50)",
    empty_noun: "index data",
    slug: "market_index",
    landing: "{nse}/",
    url_template: "{nse}/api/index-history?index=NIFTY%2050&from={from}&to={to}",
    referer: "{nse}/",
    accept: JSON_ACCEPT,
    transport: TransportMode::ApiDirect,
    method: HttpMethod::Get,
    body: BodyTemplate::None,
    date_rule: DateRule::Today,
    extraction: Extraction::Json {
        records_path: Some("data"),
    },
    form: None,
    fields: &[
        FieldMapping::required("index", "indexName"),
        FieldMapping::date("timestamp", "date"),
        FieldMapping::optional("open", "open"),
        FieldMapping::optional("close", "close"),
        FieldMapping::optional("high", "high"),
        FieldMapping::optional("low", "low"),
        FieldMapping::optional("volume", "volume"),
    ],
    summary: &[
        SummaryLine::new("Index", "{indexName}"),
        SummaryLine::new("Date", "{date}"),
        SummaryLine::new("Open", "{open}"),
        SummaryLine::new("Close", "{close}"),
        SummaryLine::new("High", "{high}"),
        SummaryLine::new("Low", "{low}"),
        SummaryLine::new("Volume", "{volume}"),
    ],
    sort: None,
};

pub static MARKET_TURNOVER: FeedSpec = FeedSpec {
    id: FeedId::MarketTurnover,
    title: "Market Turnover",
    empty_noun: "turnover data",
    slug: "market_turnover",
    landing: "{nse}/",
    url_template: "{nse}/api/market-turnover",
    referer: "{nse}/",
    accept: JSON_ACCEPT,
    transport: TransportMode::ApiDirect,
    method: HttpMethod::Get,
    body: BodyTemplate::None,
    date_rule: DateRule::Today,
    extraction: Extraction::Json {
        records_path: Some("data"),
    },
    form: None,
    fields: &[
        FieldMapping::required("segment", "segment"),
        FieldMapping::optional("turnover", "turnover"),
        FieldMapping::date("date", "date"),
    ],
    summary: &[
        SummaryLine::new("Segment", "{segment}"),
        SummaryLine::new("Turnover", "Rs. {turnover} Cr"),
        SummaryLine::new("Date", "{date}"),
    ],
    sort: None,
};

pub static PRESS_RELEASES: FeedSpec = FeedSpec {
    id: FeedId::PressReleases,
    title: "NSE Press Releases",
    empty_noun: "press releases",
    slug: "press_release",
    landing: "{nse}/",
    url_template: "{nse}/api/press-release?fromDate={from}&toDate={to}",
    referer: "{nse}/",
    accept: JSON_ACCEPT,
    transport: TransportMode::ApiDirect,
    method: HttpMethod::Get,
    body: BodyTemplate::None,
    date_rule: DateRule::YesterdayToToday,
    extraction: Extraction::Json { records_path: None },
    form: None,
    // Upstream publishes no schema for this endpoint; these keys follow the
    // other corporate-filings endpoints.
    fields: &[
        FieldMapping::required("subject", "title"),
        FieldMapping::date("date", "date"),
        FieldMapping::optional("department", "department"),
        FieldMapping::optional("attchmntFile", "attachment"),
    ],
    summary: &[
        SummaryLine::new("Title", "{title}"),
        SummaryLine::new("Date", "{date}"),
        SummaryLine::new("Department", "{department}"),
        SummaryLine::new("Attachment", "{attachment}"),
    ],
    sort: Some(SortSpec {
        key: "title",
        direction: SortDirection::Ascending,
    }),
};
