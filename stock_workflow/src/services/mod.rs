//! Service implementations
//!
//! Real implementations of the workflow's seams plus the stateful helpers
//! that sit on top of them: the template artifact store and the retrying
//! UI actuator.

pub mod actuator;
pub mod credentials;
pub mod google_auth;
pub mod login;
pub mod record_source;
pub mod template_store;
pub mod webdriver;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use actuator::{RetryPolicy, UiActuator};
pub use credentials::EnvCredentialSource;
pub use google_auth::ServiceAccountKey;
pub use login::SiteLogin;
pub use record_source::SheetsRecordSource;
pub use template_store::{AcquiredTemplate, TemplateStore};
pub use webdriver::{WebDriverBrowser, WebDriverLauncher};
