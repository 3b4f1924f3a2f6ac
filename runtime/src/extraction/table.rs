//! HTML tables: positional cell mapping over a rendered results grid.

use super::{Extracted, FieldRecord};
use crate::error::ExtractError;
use crate::feeds::{CellSource, TableSpec};
use crate::progress::RunObserver;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extract one record per data row of the table matched by `spec.selector`.
///
/// The first row is the header. Pagination rows and rows with fewer than
/// `spec.min_columns` cells are skipped, never fatal.
pub fn extract(
    html: &str,
    page_url: &str,
    spec: &TableSpec,
    observer: &RunObserver,
) -> Result<Extracted, ExtractError> {
    let document = Html::parse_document(html);
    let table_sel = parse_selector(spec.selector)?;
    let row_sel = parse_selector("tr")?;
    let anchor_sel = parse_selector("a")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| ExtractError::TableNotFound(spec.selector.to_string()))?;

    let base = Url::parse(page_url).ok();
    let mut out = Extracted::default();

    // Rows of tables nested inside cells (the pager, for one) belong to
    // those tables, not to the grid.
    let rows = table
        .select(&row_sel)
        .filter(|row| nearest_table(*row) == Some(table));

    for (index, row) in rows.enumerate().skip(1) {
        if let Some(class) = spec.pagination_class {
            if row.value().classes().any(|c| c == class) {
                out.skipped += 1;
                observer.row_skipped(index, "pagination row");
                continue;
            }
        }

        let cells: Vec<ElementRef> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| cell.value().name() == "td")
            .collect();
        if cells.len() < spec.min_columns {
            out.skipped += 1;
            observer.row_skipped(
                index,
                &format!("{} cell(s), need {}", cells.len(), spec.min_columns),
            );
            continue;
        }

        let mut record = FieldRecord::new();
        for column in spec.columns {
            let Some(cell) = cells.get(column.index) else {
                continue;
            };
            let value = match column.source {
                CellSource::Text => Some(visible_text(*cell)),
                CellSource::AnchorText => cell.select(&anchor_sel).next().map(visible_text),
                CellSource::AnchorHref => cell
                    .select(&anchor_sel)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| resolve(base.as_ref(), href)),
                CellSource::ElementId(selector) => {
                    let sel = parse_selector(selector)?;
                    cell.select(&sel)
                        .next()
                        .and_then(|el| el.value().attr("id"))
                        .map(str::to_string)
                }
            };
            if let Some(value) = value {
                record.insert(column.key, value);
            }
        }
        out.records.push(record);
    }

    Ok(out)
}

fn nearest_table(element: ElementRef) -> Option<ElementRef> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|_| ExtractError::InvalidSelector(selector.to_string()))
}

/// Text content with runs of whitespace collapsed.
fn visible_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    base.and_then(|b| b.join(href.trim()).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::bse;
    use crate::feeds::Extraction;

    const PAGE: &str = "https://www.bseindia.com/markets/MarketInfo/NoticesCirculars.aspx?id=2";

    fn notices_table() -> &'static TableSpec {
        match &bse::NOTICES.extraction {
            Extraction::HtmlTable(spec) => spec,
            Extraction::Json { .. } => unreachable!("bse notices is an html feed"),
        }
    }

    fn grid(rows: &str) -> String {
        format!(
            r#"<html><body><table id="ContentPlaceHolder1_GridView2">
            <tr><th>Notice No</th><th>Subject</th><th>Segment</th><th>Category</th><th>Dept</th><th>PDF</th></tr>
            {rows}
            </table></body></html>"#
        )
    }

    const NOTICE_ROW: &str = r#"<tr>
        <td> 20250417-1 </td>
        <td><a href="/markets/MarketInfo/DispNewNoticesCirculars.aspx?page=abc">Listing of
            new securities</a></td>
        <td>Equity</td><td>Trading</td><td>Listing Operations</td>
        <td><input type="image" id="ContentPlaceHolder1_GridView2_imgPdf_0" src="pdf.gif"></td>
    </tr>"#;

    #[test]
    fn test_row_maps_cells_positionally() {
        let observer = RunObserver::detached("bse-notices");
        let out = extract(&grid(NOTICE_ROW), PAGE, notices_table(), &observer).unwrap();
        assert_eq!(out.records.len(), 1);
        let r = &out.records[0];
        assert_eq!(r.get("noticeNo"), Some("20250417-1"));
        assert_eq!(r.get("subject"), Some("Listing of new securities"));
        assert_eq!(
            r.get("subjectUrl"),
            Some("https://www.bseindia.com/markets/MarketInfo/DispNewNoticesCirculars.aspx?page=abc")
        );
        assert_eq!(r.get("segment"), Some("Equity"));
        assert_eq!(r.get("category"), Some("Trading"));
        assert_eq!(r.get("department"), Some("Listing Operations"));
        assert_eq!(r.get("pdfId"), Some("ContentPlaceHolder1_GridView2_imgPdf_0"));
    }

    #[test]
    fn test_header_pagination_and_short_rows_are_skipped() {
        let rows = format!(
            r#"{NOTICE_ROW}
            <tr class="pgr"><td>1</td><td>2</td><td>3</td><td>4</td><td>5</td><td>6</td></tr>
            <tr><td>only</td><td>three</td><td>cells</td></tr>
            {NOTICE_ROW}"#
        );
        let observer = RunObserver::detached("bse-notices");
        let out = extract(&grid(&rows), PAGE, notices_table(), &observer).unwrap();
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.skipped, 2);
    }

    #[test]
    fn test_nested_pager_table_is_not_walked() {
        let pager = r#"<tr class="pgr"><td colspan="6"><table><tr>
            <td><span>1</span></td>
            <td><a href="javascript:__doPostBack('p','Page$2')">2</a></td>
            <td><a href="javascript:__doPostBack('p','Page$3')">3</a></td>
            <td><a href="javascript:__doPostBack('p','Page$4')">4</a></td>
            <td><a href="javascript:__doPostBack('p','Page$5')">5</a></td>
            <td><a href="javascript:__doPostBack('p','Page$6')">6</a></td>
            <td><a href="javascript:__doPostBack('p','Page$7')">...</a></td>
        </tr></table></td></tr>"#;
        let observer = RunObserver::detached("bse-notices");
        let out = extract(
            &grid(&format!("{NOTICE_ROW}{pager}")),
            PAGE,
            notices_table(),
            &observer,
        )
        .unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].get("noticeNo"), Some("20250417-1"));
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn test_missing_anchor_leaves_fields_absent() {
        let row = r#"<tr><td>N1</td><td>plain subject</td><td>s</td><td>c</td><td>d</td><td></td></tr>"#;
        let observer = RunObserver::detached("bse-notices");
        let out = extract(&grid(row), PAGE, notices_table(), &observer).unwrap();
        let r = &out.records[0];
        assert_eq!(r.get("noticeNo"), Some("N1"));
        assert_eq!(r.get("subject"), None);
        assert_eq!(r.get("subjectUrl"), None);
        assert_eq!(r.get("pdfId"), None);
    }

    #[test]
    fn test_missing_table_is_total_failure() {
        let observer = RunObserver::detached("bse-notices");
        let err = extract("<html><body>No records</body></html>", PAGE, notices_table(), &observer)
            .unwrap_err();
        assert_eq!(
            err,
            ExtractError::TableNotFound("table#ContentPlaceHolder1_GridView2".into())
        );
    }

    #[test]
    fn test_header_only_table_yields_nothing() {
        let observer = RunObserver::detached("bse-notices");
        let out = extract(&grid(""), PAGE, notices_table(), &observer).unwrap();
        assert!(out.records.is_empty());
        assert_eq!(out.skipped, 0);
    }
}
