//! Sign-in to the stock site and landing on the stock in/out page

use shared::{run_debug, run_info, RunId};

use crate::config::{SiteConfig, Timings};
use crate::error::WorkflowResult;
use crate::services::actuator::UiActuator;
use crate::traits::{Credentials, Locator};

pub const USERNAME_FIELD: &str = "userName";
pub const PASSWORD_FIELD: &str = "password";

pub struct SiteLogin<'a> {
    site: &'a SiteConfig,
    timings: &'a Timings,
}

impl<'a> SiteLogin<'a> {
    pub fn new(site: &'a SiteConfig, timings: &'a Timings) -> Self {
        Self { site, timings }
    }

    /// Log in, then follow the post-login landing page over to the stock page
    ///
    /// The site lands on its dashboard after login; the stock page lives at the
    /// same address with the dashboard path swapped out.
    pub async fn sign_in(
        &self,
        run_id: &RunId,
        actuator: &UiActuator<'_>,
        credentials: &Credentials,
    ) -> WorkflowResult<String> {
        run_info!(run_id, "🔐 Logging in as {}", credentials.username);
        actuator.navigate(&self.site.login_url).await?;
        actuator
            .fill_when_present(&Locator::name(USERNAME_FIELD), &credentials.username)
            .await?;
        actuator
            .submit_when_present(&Locator::name(PASSWORD_FIELD), &credentials.password)
            .await?;
        tokio::time::sleep(self.timings.login_settle).await;

        let landing = actuator.current_url().await?;
        let stock_page = self.stock_page_url(&landing);
        run_debug!(run_id, "Landed on {}, moving to {}", landing, stock_page);
        actuator.navigate(&stock_page).await?;

        run_info!(run_id, "✅ Logged in and on the stock page");
        Ok(stock_page)
    }

    /// Landing URL with the dashboard path replaced by the stock page path
    pub fn stock_page_url(&self, landing: &str) -> String {
        landing.replacen(&self.site.dashboard_path, &self.site.stock_page_path, 1)
    }
}
