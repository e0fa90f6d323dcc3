//! Browser session over the W3C WebDriver HTTP protocol
//!
//! Talks to any WebDriver endpoint (chromedriver, a Selenium grid) with plain
//! JSON requests. Element waits poll every 250 ms until their timeout and
//! surface `BrowserError::Timeout`; the protocol's `stale element reference`
//! code becomes `BrowserError::StaleElement`. Both are what the retry policy
//! treats as transient.

use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::BrowserError;
use crate::traits::{Browser, BrowserLauncher, Locator};

/// Key under which the protocol returns element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
/// WebDriver code point for the Enter key
const ENTER_KEY: char = '\u{E007}';
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Opens Chrome sessions on a WebDriver endpoint
pub struct WebDriverLauncher {
    client: reqwest::Client,
    endpoint: String,
    headless: bool,
}

impl WebDriverLauncher {
    pub fn new(endpoint: &str, headless: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            headless,
        }
    }

    /// Chrome capabilities: fixed window, container-safe flags, silent downloads into `download_dir`
    pub fn capabilities(download_dir: &Path, headless: bool) -> Value {
        let mut args = vec![
            "--window-size=1920,1080",
            "--disable-gpu",
            "--disable-software-rasterizer",
            "--disable-features=VizDisplayCompositor",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ];
        if headless {
            args.insert(0, "--headless=new");
        }

        json!({
            "browserName": "chrome",
            "goog:chromeOptions": {
                "args": args,
                "prefs": {
                    "download.default_directory": download_dir.to_string_lossy(),
                    "download.prompt_for_download": false,
                    "download.directory_upgrade": true,
                    "safebrowsing.enabled": true
                }
            }
        })
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self, download_dir: &Path) -> Result<Box<dyn Browser>, BrowserError> {
        let download_dir = tokio::fs::canonicalize(download_dir)
            .await
            .unwrap_or_else(|_| download_dir.to_path_buf());
        let body = json!({
            "capabilities": { "alwaysMatch": Self::capabilities(&download_dir, self.headless) }
        });

        let value = send(&self.client, Method::POST, &format!("{}/session", self.endpoint), Some(body), None).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::session("new session response has no sessionId"))?;

        debug!("🌐 Opened WebDriver session {}", session_id);
        Ok(Box::new(WebDriverBrowser {
            client: self.client.clone(),
            session_url: format!("{}/session/{}", self.endpoint, session_id),
        }))
    }
}

/// One live WebDriver session
pub struct WebDriverBrowser {
    client: reqwest::Client,
    session_url: String,
}

impl WebDriverBrowser {
    /// Attach to an existing session
    pub fn attach(endpoint: &str, session_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            session_url: format!("{}/session/{}", endpoint.trim_end_matches('/'), session_id),
        }
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        locator: Option<&Locator>,
    ) -> Result<Value, BrowserError> {
        send(&self.client, method, &format!("{}{}", self.session_url, path), body, locator).await
    }

    async fn find(&self, locator: &Locator) -> Result<String, BrowserError> {
        let (using, value) = strategy(locator);
        let found = self
            .command(Method::POST, "/element", Some(json!({ "using": using, "value": value })), Some(locator))
            .await?;
        found
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BrowserError::Protocol {
                code: "invalid element".to_string(),
                message: format!("no element reference for {locator}"),
            })
    }

    async fn element_flag(&self, element: &str, flag: &str, locator: &Locator) -> Result<bool, BrowserError> {
        let value = self
            .command(Method::GET, &format!("/element/{element}/{flag}"), None, Some(locator))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn element_command(
        &self,
        element: &str,
        action: &str,
        body: Value,
        locator: &Locator,
    ) -> Result<(), BrowserError> {
        self.command(Method::POST, &format!("/element/{element}/{action}"), Some(body), Some(locator))
            .await
            .map(|_| ())
    }

    async fn type_into(&self, locator: &Locator, text: String, clear_first: bool) -> Result<(), BrowserError> {
        let element = self.find(locator).await?;
        if clear_first {
            self.element_command(&element, "clear", json!({}), locator).await?;
        }
        self.element_command(&element, "value", json!({ "text": text }), locator).await
    }

    /// Re-run `attempt` until it yields a value or `timeout` elapses
    ///
    /// Missing and stale elements count as "not yet"; other errors end the wait.
    async fn poll_until<T, F, Fut>(
        &self,
        locator: &Locator,
        condition: &str,
        timeout: Duration,
        mut attempt: F,
    ) -> Result<T, BrowserError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, BrowserError>>,
    {
        let started = Instant::now();
        loop {
            match attempt().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) | Err(BrowserError::NoSuchElement { .. }) | Err(BrowserError::StaleElement { .. }) => {}
                Err(e) => return Err(e),
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::timeout(locator, condition, timeout));
            }
            tokio::time::sleep(POLL_INTERVAL.min(timeout)).await;
        }
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })), None)
            .await
            .map(|_| ())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let value = self.command(Method::GET, "/url", None, None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::Protocol {
                code: "invalid response".to_string(),
                message: "current url is not a string".to_string(),
            })
    }

    async fn refresh_page(&self) -> Result<(), BrowserError> {
        self.command(Method::POST, "/refresh", Some(json!({})), None)
            .await
            .map(|_| ())
    }

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError> {
        let element = self.find(locator).await?;
        self.element_command(&element, "click", json!({}), locator).await
    }

    async fn send_keys(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        self.type_into(locator, text.to_string(), true).await
    }

    async fn type_and_submit(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        let mut keys = text.to_string();
        keys.push(ENTER_KEY);
        self.type_into(locator, keys, true).await
    }

    async fn wait_until_present(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError> {
        self.poll_until(locator, "present", timeout, move || async move {
            self.find(locator).await.map(|_| Some(()))
        })
        .await
    }

    async fn wait_until_clickable(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError> {
        self.poll_until(locator, "clickable", timeout, move || async move {
            let element = self.find(locator).await?;
            let ready = self.element_flag(&element, "displayed", locator).await?
                && self.element_flag(&element, "enabled", locator).await?;
            Ok::<_, BrowserError>(ready.then_some(()))
        })
        .await
    }

    async fn upload_file(&self, locator: &Locator, path: &Path) -> Result<(), BrowserError> {
        // The driver resolves the path on its own side, so it must be absolute
        let absolute = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());
        self.type_into(locator, absolute.to_string_lossy().to_string(), false)
            .await
    }

    async fn quit(&self) -> Result<(), BrowserError> {
        send(&self.client, Method::DELETE, &self.session_url, None, None)
            .await
            .map(|_| ())
    }
}

/// Map a locator onto a W3C location strategy
fn strategy(locator: &Locator) -> (&'static str, String) {
    match locator {
        Locator::XPath(expr) => ("xpath", expr.clone()),
        Locator::Id(id) => ("css selector", format!("[id=\"{id}\"]")),
        Locator::Name(name) => ("css selector", format!("[name=\"{name}\"]")),
    }
}

/// Send one protocol request and unwrap its `value`
async fn send(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<Value>,
    locator: Option<&Locator>,
) -> Result<Value, BrowserError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await.map_err(|e| BrowserError::http(e.to_string()))?;
    let status = response.status();
    let payload: Value = response
        .json()
        .await
        .map_err(|e| BrowserError::http(format!("undecodable response ({status}): {e}")))?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }

    let code = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
    let message = value.get("message").and_then(Value::as_str).unwrap_or_default();
    Err(map_protocol_error(code, message, locator))
}

/// Translate a W3C error code into the browser error taxonomy
pub fn map_protocol_error(code: &str, message: &str, locator: Option<&Locator>) -> BrowserError {
    let target = || locator.map(ToString::to_string).unwrap_or_else(|| "<page>".to_string());
    match code {
        "stale element reference" => BrowserError::stale(target()),
        "no such element" => BrowserError::NoSuchElement { locator: target() },
        "timeout" | "script timeout" => BrowserError::timeout(target(), "responsive", Duration::ZERO),
        "invalid session id" | "session not created" => BrowserError::session(format!("{code}: {message}")),
        _ => BrowserError::Protocol {
            code: code.to_string(),
            message: message.to_string(),
        },
    }
}
