//! Session bootstrap: visit a landing page so the upstream hands out the
//! cookies its API checks for.

use crate::pipeline::request::FetchRequest;
use crate::progress::RunObserver;
use crate::renderer::RenderContext;
use std::time::Duration;

/// Outcome of a bootstrap. Never an error: a degraded session still gets to
/// try the data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Established,
    Degraded { reason: String },
}

impl SessionState {
    pub fn is_established(&self) -> bool {
        matches!(self, SessionState::Established)
    }
}

pub struct SessionBootstrapper {
    navigation_timeout: Duration,
    settle_timeout: Duration,
}

impl SessionBootstrapper {
    pub fn new(navigation_timeout: Duration, settle_timeout: Duration) -> Self {
        Self {
            navigation_timeout,
            settle_timeout,
        }
    }

    /// Apply the request's identity headers, load the landing page and wait
    /// for it to settle.
    pub async fn bootstrap(
        &self,
        ctx: &dyn RenderContext,
        request: &FetchRequest,
        observer: &RunObserver,
    ) -> SessionState {
        let state = match self.establish(ctx, request).await {
            Ok(()) => SessionState::Established,
            Err(reason) => SessionState::Degraded { reason },
        };
        match &state {
            SessionState::Established => tracing::info!(
                run_id = observer.run_id(),
                feed = observer.feed(),
                "{} loaded, cookies set",
                request.landing_url
            ),
            SessionState::Degraded { reason } => observer.session_degraded(reason),
        }
        state
    }

    async fn establish(
        &self,
        ctx: &dyn RenderContext,
        request: &FetchRequest,
    ) -> Result<(), String> {
        ctx.apply_headers(&request.user_agent, &request.headers)
            .await
            .map_err(|e| format!("could not apply headers: {e:#}"))?;

        let nav_ms = self.navigation_timeout.as_millis() as u64;
        let nav = ctx
            .navigate(&request.landing_url, nav_ms)
            .await
            .map_err(|e| format!("{e:#}"))?;
        if !nav.is_success() {
            return Err(format!(
                "landing page {} answered {}",
                request.landing_url, nav.status
            ));
        }

        ctx.wait_for_settle(self.settle_timeout.as_millis() as u64)
            .await
            .map_err(|e| format!("{e:#}"))
    }
}
