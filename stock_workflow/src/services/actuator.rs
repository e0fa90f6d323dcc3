//! Bounded-retry wrapper around browser interactions
//!
//! `RetryPolicy` takes the action as a value and decides what to repeat
//! through an explicit classification predicate, so new transient conditions
//! are added in `BrowserError::class` without touching call sites.
//! `UiActuator` pairs a policy with a browser session and exposes the
//! composite "wait, then act" interactions the workflow uses.

use std::fmt::Display;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Timings;
use crate::error::{BrowserError, FailureClass};
use crate::traits::{Browser, Locator};

/// Fixed-delay retry policy, stateless across calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_timings(timings: &Timings) -> Self {
        Self::new(timings.retry_attempts, timings.retry_delay)
    }

    /// Run `action` until it succeeds, fails fatally, or exhausts the attempt budget
    ///
    /// Fatal failures are returned on first occurrence. After `max_attempts`
    /// transient failures the last one is returned unchanged.
    pub async fn perform<T, E, F, Fut, C>(&self, label: &str, classify: C, mut action: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> FailureClass,
        E: Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match action().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("✅ {} succeeded after {} attempts", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) => match classify(&e) {
                    FailureClass::Fatal => return Err(e),
                    FailureClass::Transient if attempt >= self.max_attempts => {
                        warn!("❌ {} failed after {} attempts: {}", label, attempt, e);
                        return Err(e);
                    }
                    FailureClass::Transient => {
                        warn!(
                            "⏳ {} failed (attempt {}/{}), retrying in {}ms: {}",
                            label,
                            attempt,
                            self.max_attempts,
                            self.delay.as_millis(),
                            e
                        );
                        tokio::time::sleep(self.delay).await;
                    }
                },
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_timings(&Timings::default())
    }
}

/// Browser session plus retry policy
pub struct UiActuator<'a> {
    browser: &'a dyn Browser,
    policy: RetryPolicy,
    ui_timeout: Duration,
}

impl<'a> UiActuator<'a> {
    pub fn new(browser: &'a dyn Browser, policy: RetryPolicy, ui_timeout: Duration) -> Self {
        Self {
            browser,
            policy,
            ui_timeout,
        }
    }

    pub fn from_timings(browser: &'a dyn Browser, timings: &Timings) -> Self {
        Self::new(browser, RetryPolicy::from_timings(timings), timings.ui_timeout)
    }

    /// Wait for the element to be clickable, then click it
    pub async fn click_when_ready(&self, locator: &Locator) -> Result<(), BrowserError> {
        let (browser, timeout) = (self.browser, self.ui_timeout);
        self.policy
            .perform(&format!("click {locator}"), BrowserError::class, move || async move {
                browser.wait_until_clickable(locator, timeout).await?;
                browser.click(locator).await
            })
            .await
    }

    /// Wait for the element, clear it and type `text`
    pub async fn fill_when_present(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        let (browser, timeout) = (self.browser, self.ui_timeout);
        self.policy
            .perform(&format!("fill {locator}"), BrowserError::class, move || async move {
                browser.wait_until_present(locator, timeout).await?;
                browser.send_keys(locator, text).await
            })
            .await
    }

    /// Wait for the element, type `text` and press Enter
    pub async fn submit_when_present(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        let (browser, timeout) = (self.browser, self.ui_timeout);
        self.policy
            .perform(&format!("submit {locator}"), BrowserError::class, move || async move {
                browser.wait_until_present(locator, timeout).await?;
                browser.type_and_submit(locator, text).await
            })
            .await
    }

    /// Wait for the file input, then hand it `path`
    pub async fn upload_when_present(&self, locator: &Locator, path: &Path) -> Result<(), BrowserError> {
        let (browser, timeout) = (self.browser, self.ui_timeout);
        self.policy
            .perform(&format!("upload to {locator}"), BrowserError::class, move || async move {
                browser.wait_until_present(locator, timeout).await?;
                browser.upload_file(locator, path).await
            })
            .await
    }

    pub async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        let browser = self.browser;
        self.policy
            .perform(&format!("navigate to {url}"), BrowserError::class, move || browser.navigate(url))
            .await
    }

    pub async fn current_url(&self) -> Result<String, BrowserError> {
        let browser = self.browser;
        self.policy
            .perform("read current url", BrowserError::class, move || browser.current_url())
            .await
    }

    pub async fn refresh(&self) -> Result<(), BrowserError> {
        let browser = self.browser;
        self.policy
            .perform("refresh page", BrowserError::class, move || browser.refresh_page())
            .await
    }
}
