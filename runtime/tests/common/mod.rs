//! Scripted in-memory renderer for driving the pipeline without a browser.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use filings_runtime::config::RuntimeConfig;
use filings_runtime::renderer::{NavigationResult, RenderContext, Renderer};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted upstream answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok { status: u16, body: String },
    Fail(String),
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Reply::Ok {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Reply::Ok {
            status,
            body: body.to_string(),
        }
    }
}

/// Replies for every URL (or submit selector) containing `pattern`.
/// Queued replies are consumed first; the last one then repeats.
struct Route {
    pattern: String,
    queue: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    hits: AtomicUsize,
}

#[derive(Default)]
struct Script {
    routes: Vec<Route>,
    delay: Duration,
}

impl Script {
    fn reply_for(&self, target: &str) -> Option<Reply> {
        let route = self.routes.iter().find(|r| target.contains(&r.pattern))?;
        route.hits.fetch_add(1, Ordering::SeqCst);
        let queued = route.queue.lock().unwrap().pop_front();
        Some(queued.unwrap_or_else(|| route.fallback.clone()))
    }
}

#[derive(Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
}

/// Renderer whose contexts answer from a fixed script.
#[derive(Clone)]
pub struct ScriptedRenderer {
    script: Arc<Script>,
    pub counters: Arc<Counters>,
    fills: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedRenderer {
    pub fn builder() -> ScriptBuilder {
        ScriptBuilder::default()
    }

    /// How many times a route was answered.
    pub fn hits(&self, pattern: &str) -> usize {
        self.script
            .routes
            .iter()
            .find(|r| r.pattern == pattern)
            .map(|r| r.hits.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Every (selector, value) typed into a form, in order.
    pub fn fills(&self) -> Vec<(String, String)> {
        self.fills.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct ScriptBuilder {
    routes: Vec<Route>,
    delay: Duration,
}

impl ScriptBuilder {
    /// Answer `pattern` with `replies` in turn, repeating the last one.
    pub fn route(mut self, pattern: &str, replies: Vec<Reply>) -> Self {
        let mut queue: VecDeque<Reply> = replies.into();
        let fallback = queue
            .back()
            .cloned()
            .unwrap_or_else(|| Reply::json("<html></html>"));
        if queue.len() == 1 {
            queue.clear();
        }
        self.routes.push(Route {
            pattern: pattern.to_string(),
            queue: Mutex::new(queue),
            fallback,
            hits: AtomicUsize::new(0),
        });
        self
    }

    /// Pause every navigation and script evaluation.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn build(self) -> ScriptedRenderer {
        ScriptedRenderer {
            script: Arc::new(Script {
                routes: self.routes,
                delay: self.delay,
            }),
            counters: Arc::new(Counters::default()),
            fills: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let c = &self.counters;
        c.opened.fetch_add(1, Ordering::SeqCst);
        let now = c.active.fetch_add(1, Ordering::SeqCst) + 1;
        c.max_active.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(ScriptedContext {
            script: Arc::clone(&self.script),
            counters: Arc::clone(&self.counters),
            fills: Arc::clone(&self.fills),
            page: Mutex::new(Page::default()),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }
}

#[derive(Default, Clone)]
struct Page {
    url: String,
    body: String,
}

struct ScriptedContext {
    script: Arc<Script>,
    counters: Arc<Counters>,
    fills: Arc<Mutex<Vec<(String, String)>>>,
    page: Mutex<Page>,
}

impl ScriptedContext {
    fn page(&self) -> Page {
        self.page.lock().unwrap().clone()
    }

    fn show(&self, url: &str, body: String) {
        *self.page.lock().unwrap() = Page {
            url: url.to_string(),
            body,
        };
    }

    async fn pause(&self) {
        if !self.script.delay.is_zero() {
            tokio::time::sleep(self.script.delay).await;
        }
    }
}

/// `#id` or `tag#id` down to the bare id.
fn element_id(selector: &str) -> &str {
    selector.rsplit('#').next().unwrap_or(selector)
}

#[async_trait]
impl RenderContext for ScriptedContext {
    async fn apply_headers(&self, _user_agent: &str, _headers: &[(String, String)]) -> Result<()> {
        Ok(())
    }

    async fn navigate(&self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        self.pause().await;
        let (status, body) = match self.script.reply_for(url) {
            Some(Reply::Fail(reason)) => bail!("{reason}"),
            Some(Reply::Ok { status, body }) => (status, body),
            None => (200, "<html><body>landing</body></html>".to_string()),
        };
        self.show(url, body);
        Ok(NavigationResult {
            final_url: url.to_string(),
            status,
            load_time_ms: 1,
        })
    }

    async fn wait_for_settle(&self, _timeout_ms: u64) -> Result<()> {
        Ok(())
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        self.pause().await;
        if !script.contains("fetch(") {
            bail!("unscripted evaluation");
        }
        match self.script.reply_for(script) {
            Some(Reply::Ok { status, body }) => {
                Ok(serde_json::json!({ "status": status, "body": body }))
            }
            Some(Reply::Fail(reason)) => Ok(serde_json::json!({ "status": 0, "error": reason })),
            None => Ok(serde_json::json!({ "status": 404, "body": "" })),
        }
    }

    async fn get_html(&self) -> Result<String> {
        Ok(self.page().body)
    }

    async fn get_text(&self) -> Result<String> {
        Ok(self.page().body)
    }

    async fn get_url(&self) -> Result<String> {
        Ok(self.page().url)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let url = self.page().url;
        match self.script.reply_for(selector) {
            Some(Reply::Ok { body, .. }) => self.show(&url, body),
            Some(Reply::Fail(reason)) => bail!("{reason}"),
            None => bail!("no element matches {selector}"),
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.fills
            .lock()
            .unwrap()
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        self.fill(selector, value).await
    }

    async fn has_element(&self, selector: &str) -> Result<bool> {
        let id = element_id(selector);
        Ok(self.page().body.contains(&format!("id=\"{id}\"")))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Config writing into `dir`, without retry pauses or trading-day shifts.
pub fn test_config(dir: &Path) -> RuntimeConfig {
    RuntimeConfig {
        output_dir: dir.to_path_buf(),
        retry_delay_ms: 0,
        shift_non_trading_days: false,
        ..RuntimeConfig::default()
    }
}

/// 17-04-2025, a Thursday.
pub fn anchor_day() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2025, 4, 17).unwrap()
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()))
}
