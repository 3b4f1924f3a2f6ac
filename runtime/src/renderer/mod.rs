//! Renderer abstraction for browser-driven acquisition.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). Every pipeline
//! run owns exactly one `RenderContext` for its whole lifetime.

pub mod chromium;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// HTTP status of the main document, `0` when the engine could not report it.
    pub status: u16,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

impl NavigationResult {
    /// Whether the response status allows the body to be treated as a payload.
    ///
    /// An unknown status (`0`) is accepted; the body check decides then.
    pub fn is_success(&self) -> bool {
        self.status == 0 || (200..300).contains(&self.status)
    }
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new, isolated browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Set the user agent and extra request headers for every later request.
    async fn apply_headers(&self, user_agent: &str, headers: &[(String, String)]) -> Result<()>;
    /// Navigate to a URL with a timeout.
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Wait until the document is complete and resource loading has gone quiet.
    async fn wait_for_settle(&self, timeout_ms: u64) -> Result<()>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the visible body text; for a raw JSON response, the JSON itself.
    async fn get_text(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Set the value of an input element and fire its `input`/`change` events.
    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             if (!el) return false; el.value = {val}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()",
            sel = js_string(selector),
            val = js_string(value),
        );
        expect_found(self.execute_js(&script).await?, selector)
    }

    /// Choose an `<option>` of a `<select>` by value or visible label.
    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             if (!el) return false; const want = {val}; \
             const opt = Array.from(el.options).find(o => o.value === want || o.text.trim() === want); \
             if (!opt) return false; el.value = opt.value; \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()",
            sel = js_string(selector),
            val = js_string(value),
        );
        expect_found(self.execute_js(&script).await?, selector)
    }

    /// Whether an element matching `selector` exists in the current document.
    async fn has_element(&self, selector: &str) -> Result<bool> {
        let script = format!("document.querySelector({}) !== null", js_string(selector));
        Ok(self.execute_js(&script).await?.as_bool().unwrap_or(false))
    }

    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Quote a Rust string as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn expect_found(result: serde_json::Value, selector: &str) -> Result<()> {
    result
        .as_bool()
        .filter(|found| *found)
        .map(|_| ())
        .with_context(|| format!("no element matches {selector}"))
}

/// A no-op renderer used when Chromium is unavailable.
///
/// Context creation always fails, so every run ends in `Failed` with a
/// browser error instead of panicking at startup.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("browser not available"))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
    fn active_contexts(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string(r#"a"b"#), r#""a\"b""#);
        assert_eq!(js_string("#ContentPlaceHolder1_txtDate"), "\"#ContentPlaceHolder1_txtDate\"");
    }

    #[test]
    fn test_navigation_status_predicate() {
        let mut nav = NavigationResult {
            final_url: "https://example.com".into(),
            status: 200,
            load_time_ms: 10,
        };
        assert!(nav.is_success());
        nav.status = 0;
        assert!(nav.is_success());
        nav.status = 403;
        assert!(!nav.is_success());
    }

    #[tokio::test]
    async fn test_noop_renderer_refuses_contexts() {
        let renderer = NoopRenderer;
        assert!(renderer.new_context().await.is_err());
        assert_eq!(renderer.active_contexts(), 0);
    }
}
