//! Chromium-based renderer using chromiumoxide.

use super::{NavigationResult, RenderContext, Renderer};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Poll interval while waiting for a page to settle.
const SETTLE_POLL: Duration = Duration::from_millis(500);

/// Status of the main document as reported by the Navigation Timing API.
const STATUS_SCRIPT: &str = "(() => { const e = performance.getEntriesByType('navigation')[0]; \
     return e && e.responseStatus ? e.responseStatus : 0; })()";

/// Text of a document; Chrome wraps raw JSON responses in a single `<pre>`.
const BODY_TEXT_SCRIPT: &str = "(() => { const pre = document.querySelector('body > pre'); \
     return pre ? pre.innerText : (document.body ? document.body.innerText : ''); })()";

/// Find the Chromium binary path.
///
/// Checks the explicit override first, then `~/.filings/chromium/`, then `PATH`.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".filings/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".filings/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".filings/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".filings/chromium/chrome-linux64/chrome"),
                home.join(".filings/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Browser,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch a Chromium instance.
    pub async fn launch(chrome_path: Option<&Path>, headless: bool) -> Result<Self> {
        let chrome_path = find_chromium(chrome_path)
            .context("Chromium not found. Set FILINGS_CHROMIUM_PATH or install Chrome.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--ignore-certificate-errors")
            .window_size(1920, 1080);
        if headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("chromium handler event error: {e}");
                }
            }
        });

        Ok(Self {
            browser,
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        // The browser process exits when ChromiumRenderer is dropped.
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumContext {
    async fn eval_string(&self, script: &str) -> Result<String> {
        let value = self.execute_js(script).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn apply_headers(
        &self,
        user_agent: &str,
        headers: &[(String, String)],
    ) -> Result<()> {
        self.page
            .execute(SetUserAgentOverrideParams::new(user_agent))
            .await
            .context("failed to override user agent")?;

        if !headers.is_empty() {
            let map: serde_json::Map<String, serde_json::Value> = headers
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            self.page
                .execute(SetExtraHttpHeadersParams::new(Headers::new(
                    serde_json::Value::Object(map),
                )))
                .await
                .context("failed to set extra headers")?;
        }
        Ok(())
    }

    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;

                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| url.to_string());

                let status = self
                    .execute_js(STATUS_SCRIPT)
                    .await
                    .ok()
                    .and_then(|v| v.as_f64())
                    .map(|s| s as u16)
                    .unwrap_or(0);

                Ok(NavigationResult {
                    final_url,
                    status,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn wait_for_settle(&self, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut last_count: Option<u64> = None;

        loop {
            // The context is torn down mid-navigation; treat errors as "not yet".
            let probe = self
                .execute_js(
                    "[document.readyState, performance.getEntriesByType('resource').length]",
                )
                .await
                .ok();
            if let Some(serde_json::Value::Array(parts)) = probe {
                let complete = parts.first().and_then(|s| s.as_str()) == Some("complete");
                let count = parts.get(1).and_then(|c| c.as_f64()).map(|c| c as u64);
                if complete {
                    if count.is_some() && count == last_count {
                        return Ok(());
                    }
                    last_count = count;
                } else {
                    last_count = None;
                }
            }

            if Instant::now() >= deadline {
                bail!("page did not settle within {timeout_ms}ms");
            }
            tokio::time::sleep(SETTLE_POLL).await;
        }
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn get_html(&self) -> Result<String> {
        self.page.content().await.context("failed to get HTML")
    }

    async fn get_text(&self) -> Result<String> {
        self.eval_string(BODY_TEXT_SCRIPT)
            .await
            .context("failed to get body text")
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .with_context(|| format!("no element matches {selector}"))?
            .click()
            .await
            .with_context(|| format!("failed to click {selector}"))?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_chromium_ignores_missing_override() {
        let bogus = PathBuf::from("/definitely/not/a/chrome/binary");
        // Falls through to discovery; must not return the bogus path.
        assert_ne!(find_chromium(Some(&bogus)), Some(bogus));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_navigate_fill_and_read() {
        let renderer = ChromiumRenderer::launch(None, true)
            .await
            .expect("failed to launch renderer");
        let ctx = renderer
            .new_context()
            .await
            .expect("failed to create context");

        ctx.navigate(
            "data:text/html,<input id='d'><select id='s'><option>All</option></select>",
            10000,
        )
        .await
        .expect("navigation failed");

        ctx.fill("#d", "17-04-2025").await.expect("fill failed");
        ctx.select_option("#s", "All").await.expect("select failed");
        let value = ctx
            .execute_js("document.querySelector('#d').value")
            .await
            .expect("JS execution failed");
        assert_eq!(value.as_str(), Some("17-04-2025"));
        assert!(ctx.has_element("#s").await.unwrap());

        ctx.close().await.expect("close failed");
        assert_eq!(renderer.active_contexts(), 0);
    }
}
