//! Acquisition layer: session bootstrap, bounded retry and the three fetch
//! transports.
//!
//! Everything here talks to the upstream through a [`RenderContext`] so
//! cookies set during bootstrap flow into the data request.
//!
//! [`RenderContext`]: crate::renderer::RenderContext

pub mod fetcher;
pub mod retry;
pub mod session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content type of a captured payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Json,
    Html,
}

impl PayloadKind {
    /// File extension of raw artifacts of this kind.
    pub fn extension(self) -> &'static str {
        match self {
            PayloadKind::Json => "json",
            PayloadKind::Html => "html",
        }
    }
}

/// Unparsed upstream response, exactly as captured.
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub body: String,
    pub kind: PayloadKind,
    /// URL the body was read from, used to resolve relative links.
    pub source_url: String,
    pub captured_at: DateTime<Utc>,
}

impl RawPayload {
    pub fn new(body: String, kind: PayloadKind, source_url: impl Into<String>) -> Self {
        Self {
            body,
            kind,
            source_url: source_url.into(),
            captured_at: Utc::now(),
        }
    }
}
