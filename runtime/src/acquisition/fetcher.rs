//! Data request under one of the three transports, wrapped in the retry
//! policy.

use super::retry::{RetryExhausted, RetryPolicy};
use super::{PayloadKind, RawPayload};
use crate::artifacts::ArtifactWriter;
use crate::config::RuntimeConfig;
use crate::error::FetchError;
use crate::feeds::{FormFieldKind, TransportMode};
use crate::pipeline::request::FetchRequest;
use crate::progress::RunObserver;
use crate::renderer::{js_string, RenderContext};
use serde::Deserialize;
use std::time::Duration;

/// Per-call timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTimeouts {
    pub navigation: Duration,
    pub api: Duration,
    pub settle: Duration,
}

impl From<&RuntimeConfig> for FetchTimeouts {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            navigation: Duration::from_millis(config.navigation_timeout_ms),
            api: Duration::from_millis(config.api_timeout_ms),
            settle: Duration::from_millis(config.settle_timeout_ms),
        }
    }
}

/// Result object returned by the in-page fetch script.
#[derive(Debug, Deserialize)]
struct InPageResponse {
    status: u16,
    #[serde(default)]
    body: String,
    #[serde(default)]
    error: Option<String>,
}

pub struct Fetcher {
    policy: RetryPolicy,
    timeouts: FetchTimeouts,
}

impl Fetcher {
    pub fn new(policy: RetryPolicy, timeouts: FetchTimeouts) -> Self {
        Self { policy, timeouts }
    }

    /// Obtain the payload for `request`.
    ///
    /// On exhaustion the last raw response (or the error text, when there
    /// was none) is written as a diagnostic artifact and its path returned
    /// inside [`FetchError::Exhausted`].
    pub async fn fetch(
        &self,
        ctx: &dyn RenderContext,
        request: &FetchRequest,
        writer: &ArtifactWriter,
        observer: &RunObserver,
    ) -> Result<RawPayload, FetchError> {
        let label = format!("{} fetch of {}", request.transport, request.url);
        let outcome = self
            .policy
            .run(&label, observer, |_attempt| self.attempt(ctx, request))
            .await;

        match outcome {
            Ok(payload) => Ok(payload),
            Err(RetryExhausted { attempts, last }) => {
                let kind = match request.transport {
                    TransportMode::HtmlForm => PayloadKind::Html,
                    TransportMode::ApiInPage | TransportMode::ApiDirect => PayloadKind::Json,
                };
                let content = last
                    .raw_content()
                    .map(str::to_string)
                    .unwrap_or_else(|| last.to_string());
                let diagnostic =
                    writer.write_diagnostic(request.spec, &request.range, kind, &content, observer);
                Err(FetchError::Exhausted {
                    attempts,
                    last: Box::new(last),
                    diagnostic,
                })
            }
        }
    }

    async fn attempt(
        &self,
        ctx: &dyn RenderContext,
        request: &FetchRequest,
    ) -> Result<RawPayload, FetchError> {
        match request.transport {
            TransportMode::ApiInPage => self.api_in_page(ctx, request).await,
            TransportMode::ApiDirect => self.api_direct(ctx, request).await,
            TransportMode::HtmlForm => self.html_form(ctx, request).await,
        }
    }

    /// `fetch()` inside the page, so the browser attaches its own cookies.
    async fn api_in_page(
        &self,
        ctx: &dyn RenderContext,
        request: &FetchRequest,
    ) -> Result<RawPayload, FetchError> {
        let script = in_page_script(request, self.timeouts.api);
        // The script aborts itself at the same deadline; this is the backstop.
        let value = tokio::time::timeout(self.timeouts.api + Duration::from_secs(5), ctx.execute_js(&script))
            .await
            .map_err(|_| {
                FetchError::Transport(format!(
                    "in-page fetch timed out after {}ms",
                    self.timeouts.api.as_millis()
                ))
            })?
            .map_err(|e| FetchError::Transport(format!("{e:#}")))?;

        let response: InPageResponse = serde_json::from_value(value)
            .map_err(|e| FetchError::Transport(format!("unexpected in-page fetch result: {e}")))?;
        if let Some(error) = response.error {
            return Err(FetchError::Transport(error));
        }
        if !(200..300).contains(&response.status) {
            return Err(FetchError::Status {
                status: response.status,
                body: response.body,
            });
        }
        ensure_json(&response.body)?;
        Ok(RawPayload::new(response.body, PayloadKind::Json, &request.url))
    }

    /// Navigate straight to the JSON endpoint and read what the browser shows.
    async fn api_direct(
        &self,
        ctx: &dyn RenderContext,
        request: &FetchRequest,
    ) -> Result<RawPayload, FetchError> {
        let nav = ctx
            .navigate(&request.url, self.timeouts.api.as_millis() as u64)
            .await
            .map_err(|e| FetchError::Transport(format!("{e:#}")))?;
        if !nav.is_success() {
            let body = ctx.get_text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: nav.status,
                body,
            });
        }

        let body = ctx
            .get_text()
            .await
            .map_err(|e| FetchError::Transport(format!("{e:#}")))?;
        ensure_json(&body)?;
        Ok(RawPayload::new(body, PayloadKind::Json, nav.final_url))
    }

    /// Fill and submit the feed's search form, then capture the rendered page.
    async fn html_form(
        &self,
        ctx: &dyn RenderContext,
        request: &FetchRequest,
    ) -> Result<RawPayload, FetchError> {
        let form = request.form.as_ref().ok_or_else(|| {
            FetchError::Transport(format!("{} has no form to submit", request.feed))
        })?;
        let transport = |e: anyhow::Error| FetchError::Transport(format!("{e:#}"));

        let nav = ctx
            .navigate(&request.url, self.timeouts.navigation.as_millis() as u64)
            .await
            .map_err(transport)?;
        if !nav.is_success() {
            let body = ctx.get_html().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: nav.status,
                body,
            });
        }
        self.settle(ctx, request).await;

        for field in &form.fields {
            let filled = match field.kind {
                FormFieldKind::Input => ctx.fill(field.selector, &field.value).await,
                FormFieldKind::Select => ctx.select_option(field.selector, &field.value).await,
            };
            filled.map_err(transport)?;
        }
        ctx.click(form.submit).await.map_err(transport)?;
        self.settle(ctx, request).await;

        let html = ctx.get_html().await.map_err(transport)?;
        if !ctx.has_element(form.ready_selector).await.map_err(transport)? {
            return Err(FetchError::NotReady {
                selector: form.ready_selector.to_string(),
                html,
            });
        }
        let page_url = ctx.get_url().await.unwrap_or_else(|_| request.url.clone());
        Ok(RawPayload::new(html, PayloadKind::Html, page_url))
    }

    /// A page that never goes quiet may still have rendered what we need;
    /// the ready-selector check decides.
    async fn settle(&self, ctx: &dyn RenderContext, request: &FetchRequest) {
        if let Err(e) = ctx
            .wait_for_settle(self.timeouts.settle.as_millis() as u64)
            .await
        {
            tracing::warn!(feed = %request.feed, "page did not settle: {e:#}");
        }
    }
}

fn ensure_json(body: &str) -> Result<(), FetchError> {
    serde_json::from_str::<serde::de::IgnoredAny>(body)
        .map(|_| ())
        .map_err(|e| FetchError::MalformedPayload {
            reason: e.to_string(),
            body: body.to_string(),
        })
}

/// Script evaluated in the page for the `api-in-page` transport. Resolves to
/// `{status, body}` or `{status: 0, error}`.
fn in_page_script(request: &FetchRequest, timeout: Duration) -> String {
    let mut headers = serde_json::Map::new();
    if let Some(accept) = request.header("Accept") {
        headers.insert("Accept".into(), accept.into());
    }
    if request.body.is_some() {
        headers.insert("Content-Type".into(), "text/plain;charset=UTF-8".into());
    }
    let body = request
        .body
        .as_deref()
        .map(js_string)
        .unwrap_or_else(|| "undefined".to_string());
    let referrer = request
        .header("Referer")
        .map(js_string)
        .unwrap_or_else(|| "undefined".to_string());

    format!(
        r#"(async () => {{
  const controller = new AbortController();
  const timer = setTimeout(() => controller.abort(), {timeout_ms});
  try {{
    const res = await fetch({url}, {{
      method: {method},
      headers: {headers},
      body: {body},
      referrer: {referrer},
      credentials: 'include',
      signal: controller.signal,
    }});
    return {{ status: res.status, body: await res.text() }};
  }} catch (e) {{
    return {{ status: 0, error: String(e) }};
  }} finally {{
    clearTimeout(timer);
  }}
}})()"#,
        timeout_ms = timeout.as_millis(),
        url = js_string(&request.url),
        method = js_string(request.method.as_str()),
        headers = serde_json::Value::Object(headers),
    )
}
