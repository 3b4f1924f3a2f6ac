//! The per-run state machine.
//!
//! ```text
//! Init -> Bootstrap -> Fetch -> Extract -> Normalize -> Persist -> Done
//!   \________\___________\________\______________________________-> Failed
//! ```
//!
//! A run owns exactly one browser context, opened after `Init` and closed
//! on every exit path. Bootstrap and persistence problems degrade the run;
//! only request construction, fetch exhaustion and total extraction failure
//! end it in `Failed`.

pub mod pool;
pub mod request;

use crate::acquisition::fetcher::{FetchTimeouts, Fetcher};
use crate::acquisition::session::SessionBootstrapper;
use crate::artifacts::{ArtifactSet, ArtifactWriter};
use crate::config::RuntimeConfig;
use crate::error::{PipelineError, PipelineResult, RunFailure};
use crate::extraction;
use crate::feeds::FeedId;
use crate::normalize::Normalizer;
use crate::progress::{ProgressSender, RunObserver};
use crate::renderer::{RenderContext, Renderer};
use chrono::{NaiveDate, Utc};
use request::FetchRequest;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Init,
    Bootstrap,
    Fetch,
    Extract,
    Normalize,
    Persist,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Bootstrap => "bootstrap",
            Stage::Fetch => "fetch",
            Stage::Extract => "extract",
            Stage::Normalize => "normalize",
            Stage::Persist => "persist",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final outcome of one run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub feed: FeedId,
    pub result: PipelineResult<ArtifactSet>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Sequences bootstrap, fetch, extraction, normalization and persistence
/// for one feed at a time. Shareable across concurrent runs.
pub struct Pipeline {
    renderer: Arc<dyn Renderer>,
    config: RuntimeConfig,
    writer: ArtifactWriter,
    bootstrapper: SessionBootstrapper,
    fetcher: Fetcher,
    progress: Option<ProgressSender>,
}

impl Pipeline {
    pub fn new(renderer: Arc<dyn Renderer>, config: RuntimeConfig) -> Self {
        let timeouts = FetchTimeouts::from(&config);
        Self {
            renderer,
            writer: ArtifactWriter::new(config.output_dir.clone()),
            bootstrapper: SessionBootstrapper::new(
                Duration::from_millis(config.navigation_timeout_ms),
                Duration::from_millis(config.settle_timeout_ms),
            ),
            fetcher: Fetcher::new(config.retry_policy(), timeouts),
            config,
            progress: None,
        }
    }

    /// Mirror every run's events onto `tx`.
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run `feed` for the range its date rule derives from `today`.
    pub async fn run(&self, feed: FeedId, today: NaiveDate) -> RunReport {
        let run_id = uuid::Uuid::new_v4().to_string();
        let observer = RunObserver::new(run_id.clone(), feed.as_str(), self.progress.clone());
        let span = tracing::info_span!("run", run_id = %run_id, feed = %feed);

        let result = self.execute(feed, today, &observer).instrument(span).await;
        match &result {
            Ok(set) => {
                observer.stage_entered(Stage::Done.as_str());
                observer.run_completed(set.records, set.dropped);
            }
            Err(failure) => {
                observer.stage_entered(Stage::Failed.as_str());
                observer.run_failed(failure.stage.as_str(), &failure.source.to_string());
            }
        }

        RunReport {
            run_id,
            feed,
            result,
        }
    }

    async fn execute(
        &self,
        feed: FeedId,
        today: NaiveDate,
        observer: &RunObserver,
    ) -> PipelineResult<ArtifactSet> {
        observer.stage_entered(Stage::Init.as_str());
        let request = FetchRequest::build(feed, today, &self.config).map_err(|e| failed(Stage::Init, e))?;
        tracing::info!(
            run_id = observer.run_id(),
            feed = observer.feed(),
            "starting {} download for {}",
            feed,
            request.range
        );

        let ctx = self
            .renderer
            .new_context()
            .await
            .map_err(|e| failed(Stage::Init, PipelineError::Browser(format!("{e:#}"))))?;

        let result = self.drive(ctx.as_ref(), &request, observer).await;

        if let Err(e) = ctx.close().await {
            tracing::warn!(run_id = observer.run_id(), feed = observer.feed(), "failed to close browser context: {e:#}");
        }
        result
    }

    async fn drive(
        &self,
        ctx: &dyn RenderContext,
        request: &FetchRequest,
        observer: &RunObserver,
    ) -> PipelineResult<ArtifactSet> {
        let spec = request.spec;

        observer.stage_entered(Stage::Bootstrap.as_str());
        self.bootstrapper.bootstrap(ctx, request, observer).await;

        observer.stage_entered(Stage::Fetch.as_str());
        let payload = self
            .fetcher
            .fetch(ctx, request, &self.writer, observer)
            .await
            .map_err(|e| failed(Stage::Fetch, e.into()))?;

        observer.stage_entered(Stage::Extract.as_str());
        let extracted = match extraction::extract(&payload, &spec.extraction, observer) {
            Ok(extracted) => extracted,
            Err(e) => {
                self.writer.write_diagnostic(
                    spec,
                    &request.range,
                    payload.kind,
                    &payload.body,
                    observer,
                );
                return Err(failed(Stage::Extract, e.into()));
            }
        };

        observer.stage_entered(Stage::Normalize.as_str());
        let normalized = Normalizer::new(spec).normalize(&extracted.records, observer);

        observer.stage_entered(Stage::Persist.as_str());
        let raw = self.writer.write_raw(spec, &request.range, &payload, observer);
        let canonical =
            self.writer
                .write_canonical(spec, &request.range, &normalized.records, observer);
        let summary = self
            .writer
            .write_summary(spec, &request.range, &normalized.records, observer);

        Ok(ArtifactSet {
            feed: request.feed,
            range: request.range,
            run_at: Utc::now(),
            raw,
            canonical,
            summary,
            records: normalized.records.len(),
            dropped: normalized.dropped,
        })
    }
}

fn failed(stage: Stage, source: PipelineError) -> RunFailure {
    RunFailure { stage, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{channel, ProgressEventKind};
    use crate::renderer::NoopRenderer;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Bootstrap.to_string(), "bootstrap");
        assert_eq!(serde_json::to_string(&Stage::Persist).unwrap(), "\"persist\"");
    }

    #[tokio::test]
    async fn test_missing_browser_fails_at_init() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            output_dir: dir.path().to_path_buf(),
            ..RuntimeConfig::default()
        };
        let (tx, mut rx) = channel();
        let pipeline = Pipeline::new(Arc::new(NoopRenderer), config).with_progress(tx);

        let report = pipeline
            .run(FeedId::BlockDeals, NaiveDate::from_ymd_opt(2025, 4, 17).unwrap())
            .await;
        let failure = report.result.unwrap_err();
        assert_eq!(failure.stage, Stage::Init);
        assert!(matches!(failure.source, PipelineError::Browser(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event.event);
        }
        assert!(matches!(last, Some(ProgressEventKind::RunFailed { .. })));
    }

    #[tokio::test]
    async fn test_screener_without_filter_fails_before_browser() {
        let pipeline = Pipeline::new(Arc::new(NoopRenderer), RuntimeConfig::default());
        let report = pipeline
            .run(FeedId::RsiScreener, NaiveDate::from_ymd_opt(2025, 4, 17).unwrap())
            .await;
        let failure = report.result.unwrap_err();
        assert_eq!(failure.stage, Stage::Init);
        assert!(matches!(failure.source, PipelineError::Config(_)));
    }
}
