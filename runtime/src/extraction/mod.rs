//! Payload extraction: raw JSON or rendered HTML into flat [`FieldRecord`]s.
//!
//! Extraction never judges record content. Entries that are not records at
//! all (non-objects, header and pagination rows, short rows) are skipped and
//! counted; only a payload that yields no list at all is an error.

pub mod json;
pub mod table;

use crate::acquisition::RawPayload;
use crate::error::ExtractError;
use crate::feeds::Extraction;
use crate::progress::RunObserver;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One upstream entry as ordered (source key, value) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRecord {
    fields: Vec<(String, String)>,
}

impl FieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. A repeated key replaces the earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compact JSON rendering, used when logging dropped entries.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = FieldRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for FieldRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Records pulled out of one payload.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub records: Vec<FieldRecord>,
    /// Entries skipped as structurally not-a-record.
    pub skipped: usize,
}

/// Extract records from `payload` according to the feed's extraction rule.
pub fn extract(
    payload: &RawPayload,
    extraction: &Extraction,
    observer: &RunObserver,
) -> Result<Extracted, ExtractError> {
    let extracted = match extraction {
        Extraction::Json { records_path } => json::extract(&payload.body, *records_path, observer)?,
        Extraction::HtmlTable(spec) => {
            table::extract(&payload.body, &payload.source_url, spec, observer)?
        }
    };
    tracing::info!(
        run_id = observer.run_id(),
        feed = observer.feed(),
        records = extracted.records.len(),
        skipped = extracted.skipped,
        "extracted records"
    );
    Ok(extracted)
}
