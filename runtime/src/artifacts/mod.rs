//! Durable run artifacts: raw payload, canonical JSON, text summary and
//! failure diagnostics.
//!
//! File names derive from the feed slug and the range's `to` date, so a
//! rerun for the same day overwrites instead of accumulating. Every write
//! goes through a temp file and a rename; a failed write is logged and the
//! artifact reported as absent, never propagated.

pub mod summary;

use crate::acquisition::{PayloadKind, RawPayload};
use crate::feeds::{FeedId, FeedSpec};
use crate::normalize::CanonicalRecord;
use crate::pipeline::request::DateRange;
use crate::progress::RunObserver;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Date format of the downstream handoff.
pub const HANDOFF_DATE_FORMAT: &str = "%Y-%m-%d";

/// Paths and counts produced by one run.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSet {
    pub feed: FeedId,
    pub range: DateRange,
    pub run_at: DateTime<Utc>,
    pub raw: Option<PathBuf>,
    pub canonical: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub records: usize,
    pub dropped: usize,
}

impl ArtifactSet {
    /// What a notifier needs; `None` when there is nothing to attach.
    pub fn handoff(&self) -> Option<Handoff> {
        self.summary.as_ref().map(|summary| Handoff {
            summary: summary.clone(),
            date: self.range.to.format(HANDOFF_DATE_FORMAT).to_string(),
        })
    }
}

/// Contract with downstream notification: summary file plus run date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handoff {
    pub summary: PathBuf,
    pub date: String,
}

/// Writes artifacts for runs into one output directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn raw_path(&self, spec: &FeedSpec, range: &DateRange, kind: PayloadKind) -> PathBuf {
        self.dir.join(format!(
            "{}_raw_{}.{}",
            spec.slug,
            range.to_param(),
            kind.extension()
        ))
    }

    pub fn canonical_path(&self, spec: &FeedSpec, range: &DateRange) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", spec.slug, range.to_param()))
    }

    pub fn summary_path(&self, spec: &FeedSpec, range: &DateRange) -> PathBuf {
        self.dir
            .join(format!("{}_{}_summary.txt", spec.slug, range.to_param()))
    }

    pub fn diagnostic_path(&self, spec: &FeedSpec, range: &DateRange, kind: PayloadKind) -> PathBuf {
        let ext = match kind {
            PayloadKind::Json => "txt",
            PayloadKind::Html => "html",
        };
        self.dir.join(format!(
            "{}_diagnostic_{}.{ext}",
            spec.slug,
            range.to_param()
        ))
    }

    /// The payload byte-for-byte.
    pub fn write_raw(
        &self,
        spec: &FeedSpec,
        range: &DateRange,
        payload: &RawPayload,
        observer: &RunObserver,
    ) -> Option<PathBuf> {
        let path = self.raw_path(spec, range, payload.kind);
        self.persist("raw", path, payload.body.as_bytes(), observer)
    }

    /// Canonical records as a pretty-printed JSON array.
    pub fn write_canonical(
        &self,
        spec: &FeedSpec,
        range: &DateRange,
        records: &[CanonicalRecord],
        observer: &RunObserver,
    ) -> Option<PathBuf> {
        let path = self.canonical_path(spec, range);
        match serde_json::to_vec_pretty(records) {
            Ok(bytes) => self.persist("canonical", path, &bytes, observer),
            Err(e) => {
                tracing::error!(run_id = observer.run_id(), feed = observer.feed(), "failed to encode canonical records: {e}");
                None
            }
        }
    }

    pub fn write_summary(
        &self,
        spec: &FeedSpec,
        range: &DateRange,
        records: &[CanonicalRecord],
        observer: &RunObserver,
    ) -> Option<PathBuf> {
        let path = self.summary_path(spec, range);
        let text = summary::render_summary(spec, range, records);
        self.persist("summary", path, text.as_bytes(), observer)
    }

    /// Last raw response of a failed run, kept apart from the raw artifact.
    pub fn write_diagnostic(
        &self,
        spec: &FeedSpec,
        range: &DateRange,
        kind: PayloadKind,
        content: &str,
        observer: &RunObserver,
    ) -> Option<PathBuf> {
        let path = self.diagnostic_path(spec, range, kind);
        self.persist("diagnostic", path, content.as_bytes(), observer)
    }

    fn persist(
        &self,
        kind: &str,
        path: PathBuf,
        bytes: &[u8],
        observer: &RunObserver,
    ) -> Option<PathBuf> {
        match write_atomic(&path, bytes) {
            Ok(()) => {
                observer.artifact_written(kind, &path);
                Some(path)
            }
            Err(e) => {
                tracing::error!(
                    run_id = observer.run_id(),
                    feed = observer.feed(),
                    "failed to write {kind} artifact {}: {e}",
                    path.display()
                );
                None
            }
        }
    }
}

/// Write via a sibling temp file and rename, so readers never see a partial file.
///
/// Temp names are unique per write; concurrent runs for the same feed and
/// day each rename their own file and the last one wins.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    let written = std::fs::write(&tmp, bytes).and_then(|()| std::fs::rename(&tmp, path));
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    PathBuf::from(tmp)
}
