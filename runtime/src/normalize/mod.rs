//! Canonicalization of extracted records against a feed's key table.

pub mod dates;

use crate::error::ValidationError;
use crate::extraction::FieldRecord;
use crate::feeds::{FeedSpec, SortDirection};
use crate::progress::RunObserver;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A validated record: every canonical key of the feed, in table order.
///
/// Optional keys missing upstream are present with an empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    fields: Vec<(&'static str, String)>,
}

impl CanonicalRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl Serialize for CanonicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Output of a normalize pass.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<CanonicalRecord>,
    pub dropped: usize,
}

/// Maps [`FieldRecord`]s onto one feed's canonical schema.
pub struct Normalizer {
    spec: &'static FeedSpec,
}

impl Normalizer {
    pub fn new(spec: &'static FeedSpec) -> Self {
        Self { spec }
    }

    /// Canonicalize a single record.
    pub fn normalize_one(&self, record: &FieldRecord) -> Result<CanonicalRecord, ValidationError> {
        let mut fields = Vec::with_capacity(self.spec.fields.len());
        for mapping in self.spec.fields {
            let raw = record.get(mapping.source).map(str::trim).unwrap_or("");
            if mapping.required && raw.is_empty() {
                return Err(ValidationError::MissingField {
                    field: mapping.canonical,
                    source_key: mapping.source,
                });
            }
            let value = if mapping.date {
                dates::normalize(raw)
            } else {
                raw.to_string()
            };
            fields.push((mapping.canonical, value));
        }
        Ok(CanonicalRecord { fields })
    }

    /// Canonicalize every record, dropping invalid ones.
    ///
    /// Each drop is reported once with the offending entry. Survivors keep
    /// source order unless the feed declares a sort.
    pub fn normalize(&self, records: &[FieldRecord], observer: &RunObserver) -> Normalized {
        let mut out = Normalized::default();
        for record in records {
            match self.normalize_one(record) {
                Ok(canonical) => out.records.push(canonical),
                Err(e) => {
                    out.dropped += 1;
                    observer.record_dropped(&e.to_string(), &record.to_json());
                }
            }
        }

        if let Some(sort) = self.spec.sort {
            out.records.sort_by(|a, b| {
                let ord = a.get(sort.key).cmp(&b.get(sort.key));
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::FeedId;
    use crate::progress::{channel, ProgressEventKind};

    fn record(pairs: &[(&str, &str)]) -> FieldRecord {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_block_deal_mapping_and_date() {
        let normalizer = Normalizer::new(FeedId::BlockDeals.spec());
        let canonical = normalizer
            .normalize_one(&record(&[
                ("BD_SYMBOL", "ABC"),
                ("BD_SCRIP_NAME", "ABC Ltd"),
                ("BD_CLIENT_NAME", "XYZ Fund"),
                ("BD_BUY_SELL", "BUY"),
                ("BD_QTY_TRD", "100000"),
                ("BD_TP_WATP", "250.5"),
                ("mTIMESTAMP", "16-Apr-2025"),
            ]))
            .unwrap();
        let keys: Vec<&str> = canonical.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["symbol", "companyName", "clientName", "buySell", "quantity", "price", "date"]
        );
        assert_eq!(canonical.get("date"), Some("16-04-2025"));
        assert_eq!(canonical.get("price"), Some("250.5"));
    }

    #[test]
    fn test_optional_fields_default_to_empty() {
        let normalizer = Normalizer::new(FeedId::CorporateActions.spec());
        let canonical = normalizer
            .normalize_one(&record(&[("symbol", "XYZ")]))
            .unwrap();
        assert_eq!(canonical.get("purpose"), Some(""));
        assert_eq!(canonical.get("exDate"), Some(""));
    }

    #[test]
    fn test_missing_mandatory_field_names_it() {
        let normalizer = Normalizer::new(FeedId::BoardMeetings.spec());
        let err = normalizer
            .normalize_one(&record(&[("bm_symbol", "INFY"), ("sm_name", "  ")]))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "companyName",
                source_key: "sm_name"
            }
        );
    }

    #[test]
    fn test_drop_is_reported_once_per_record() {
        let (tx, mut rx) = channel();
        let observer = RunObserver::new("run", "board-meetings", Some(tx));
        let normalizer = Normalizer::new(FeedId::BoardMeetings.spec());
        let input = vec![
            record(&[("bm_symbol", "INFY"), ("sm_name", "Infosys")]),
            record(&[("bm_symbol", "TCS")]),
            record(&[("sm_name", "Nameless")]),
        ];
        let out = normalizer.normalize(&input, &observer);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.dropped, 2);

        let mut drops = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ProgressEventKind::RecordDropped { raw, .. } = event.event {
                drops.push(raw);
            }
        }
        assert_eq!(drops.len(), 2);
        assert!(drops[0].contains("TCS"));
        assert!(drops[1].contains("Nameless"));
    }

    #[test]
    fn test_press_releases_sorted_by_title() {
        let observer = RunObserver::detached("press-releases");
        let normalizer = Normalizer::new(FeedId::PressReleases.spec());
        let input = vec![
            record(&[("subject", "Zeta circular"), ("department", "1")]),
            record(&[("subject", "Alpha notice")]),
            record(&[("subject", "Zeta circular"), ("department", "2")]),
        ];
        let out = normalizer.normalize(&input, &observer);
        let titles: Vec<&str> = out.records.iter().filter_map(|r| r.get("title")).collect();
        assert_eq!(titles, vec!["Alpha notice", "Zeta circular", "Zeta circular"]);
        // Stable: ties keep source order.
        assert_eq!(out.records[1].get("department"), Some("1"));
        assert_eq!(out.records[2].get("department"), Some("2"));
    }

    #[test]
    fn test_canonical_serializes_in_table_order() {
        let normalizer = Normalizer::new(FeedId::MarketTurnover.spec());
        let canonical = normalizer
            .normalize_one(&record(&[("date", "16-Apr-2025"), ("segment", "Equity"), ("turnover", "1000")]))
            .unwrap();
        assert_eq!(
            serde_json::to_string(&canonical).unwrap(),
            r#"{"segment":"Equity","turnover":"1000","date":"16-04-2025"}"#
        );
    }
}
