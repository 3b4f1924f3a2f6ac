//! Plain-text summary rendering.

use crate::feeds::{FeedSpec, SummaryLine};
use crate::normalize::CanonicalRecord;
use crate::pipeline::request::DateRange;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Width of the `=` rule between header and record blocks.
pub const RULE_WIDTH: usize = 60;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_.]+)\}").expect("placeholder pattern"))
}

/// Render one summary line's value from a record.
pub fn render_line(line: &SummaryLine, record: &CanonicalRecord) -> String {
    placeholder()
        .replace_all(line.template, |caps: &Captures| {
            record.get(&caps[1]).unwrap_or_default().to_string()
        })
        .into_owned()
}

/// Full summary text for a run.
///
/// Zero records still produce the header followed by a "No ... found" line.
pub fn render_summary(spec: &FeedSpec, range: &DateRange, records: &[CanonicalRecord]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = format!(
        "{} Summary ({} to {})\n{rule}\n\n",
        spec.title,
        range.from_param(),
        range.to_param()
    );

    if records.is_empty() {
        out.push_str(&format!(
            "No {} found for the specified date range.\n",
            spec.empty_noun
        ));
        return out;
    }

    for record in records {
        for line in spec.summary {
            out.push_str(line.label);
            out.push_str(": ");
            out.push_str(&render_line(line, record));
            out.push('\n');
        }
        out.push_str(&rule);
        out.push_str("\n\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::FieldRecord;
    use crate::feeds::FeedId;
    use crate::normalize::Normalizer;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange {
            from: NaiveDate::from_ymd_opt(2025, 4, 16).unwrap(),
            to: NaiveDate::from_ymd_opt(2025, 4, 17).unwrap(),
        }
    }

    #[test]
    fn test_empty_summary_has_header_and_notice() {
        let text = render_summary(FeedId::BoardMeetings.spec(), &range(), &[]);
        assert_eq!(
            text,
            format!(
                "NSE Board Meetings Summary (16-04-2025 to 17-04-2025)\n{}\n\nNo valid board meetings found for the specified date range.\n",
                "=".repeat(60)
            )
        );
    }

    #[test]
    fn test_insider_trading_composite_lines() {
        let spec = FeedId::InsiderTrading.spec();
        let record: FieldRecord = [
            ("symbol", "INFY"),
            ("secVal", "125000"),
            ("befAcqSharesNo", "1000"),
            ("befAcqSharesPer", "0.01"),
        ]
        .into_iter()
        .collect();
        let canonical = Normalizer::new(spec).normalize_one(&record).unwrap();
        let text = render_summary(spec, &range(), &[canonical]);
        assert!(text.contains("Security Value: Rs. 125000\n"));
        assert!(text.contains("Pre-Transaction Shares: 1000 (0.01%)\n"));
        assert!(text.contains("Post-Transaction Shares:  (%)\n"));
        assert!(text.ends_with(&format!("{}\n\n", "=".repeat(60))));
    }
}
