//! BSE (bseindia.com) feeds.
//!
//! The notices page is an ASP.NET web form: results only exist after the
//! search form is posted back, so the feed is scraped from rendered HTML.

use super::{
    BodyTemplate, CellSource, ColumnSpec, DateRule, Extraction, FeedId, FeedSpec, FieldMapping,
    FormField, FormFieldKind, FormSpec, FormValue, HttpMethod, SummaryLine, TableSpec,
    TransportMode,
};

const RESULTS_TABLE: &str = "table#ContentPlaceHolder1_GridView2";

pub static NOTICES: FeedSpec = FeedSpec {
    id: FeedId::BseNotices,
    title: "BSE Notices",
    empty_noun: "notices",
    slug: "bse_notices",
    landing: "{bse}/",
    url_template: "{bse}/markets/MarketInfo/NoticesCirculars.aspx?id=2",
    referer: "{bse}/",
    accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    transport: TransportMode::HtmlForm,
    method: HttpMethod::Get,
    body: BodyTemplate::None,
    date_rule: DateRule::Today,
    extraction: Extraction::HtmlTable(TableSpec {
        selector: RESULTS_TABLE,
        min_columns: 6,
        pagination_class: Some("pgr"),
        columns: &[
            ColumnSpec {
                index: 0,
                key: "noticeNo",
                source: CellSource::Text,
            },
            ColumnSpec {
                index: 1,
                key: "subject",
                source: CellSource::AnchorText,
            },
            ColumnSpec {
                index: 1,
                key: "subjectUrl",
                source: CellSource::AnchorHref,
            },
            ColumnSpec {
                index: 2,
                key: "segment",
                source: CellSource::Text,
            },
            ColumnSpec {
                index: 3,
                key: "category",
                source: CellSource::Text,
            },
            ColumnSpec {
                index: 4,
                key: "department",
                source: CellSource::Text,
            },
            ColumnSpec {
                index: 5,
                key: "pdfId",
                source: CellSource::ElementId("input[type=image]"),
            },
        ],
    }),
    form: Some(FormSpec {
        fields: &[
            FormField {
                selector: "#ContentPlaceHolder1_txtDate",
                kind: FormFieldKind::Input,
                value: FormValue::FromDate,
            },
            FormField {
                selector: "#ContentPlaceHolder1_txtTodate",
                kind: FormFieldKind::Input,
                value: FormValue::ToDate,
            },
            FormField {
                selector: "#ContentPlaceHolder1_ddlSegment",
                kind: FormFieldKind::Select,
                value: FormValue::Literal("All"),
            },
            FormField {
                selector: "#ContentPlaceHolder1_ddlCategory",
                kind: FormFieldKind::Select,
                value: FormValue::Literal("All"),
            },
            FormField {
                selector: "#ContentPlaceHolder1_ddlDep",
                kind: FormFieldKind::Select,
                value: FormValue::Literal("All"),
            },
        ],
        submit: "#ContentPlaceHolder1_btnSubmit",
        ready_selector: RESULTS_TABLE,
    }),
    fields: &[
        FieldMapping::required("noticeNo", "noticeNo"),
        FieldMapping::optional("subject", "subject"),
        FieldMapping::optional("subjectUrl", "subjectUrl"),
        FieldMapping::optional("segment", "segment"),
        FieldMapping::optional("category", "category"),
        FieldMapping::optional("department", "department"),
        FieldMapping::optional("pdfId", "pdfId"),
    ],
    summary: &[
        SummaryLine::new("Notice No", "{noticeNo}"),
        SummaryLine::new("Subject", "{subject}"),
        SummaryLine::new("Subject URL", "{subjectUrl}"),
        SummaryLine::new("Segment", "{segment}"),
        SummaryLine::new("Category", "{category}"),
        SummaryLine::new("Department", "{department}"),
        SummaryLine::new("PDF ID", "{pdfId}"),
    ],
    sort: None,
};
