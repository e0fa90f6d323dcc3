//! Environment-based credentials for the stock site
//!
//! Each location has its own login, read from
//! `FRONO_<LOCATION>_USERNAME` and `FRONO_<LOCATION>_PASSWORD`.
//!
//! ## Configuration Sources
//! 1. `.env` file in the current directory or parent directories (if present)
//! 2. System environment variables
//!
//! Environment variables take precedence over .env file values.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{WorkflowError, WorkflowResult};
use crate::traits::{CredentialSource, Credentials};

/// Real credential source using environment variables
pub struct EnvCredentialSource {
    /// Fixed values consulted instead of the process environment
    overrides: Option<HashMap<String, String>>,
}

impl EnvCredentialSource {
    pub fn new() -> Self {
        Self { overrides: None }
    }

    /// Source that reads only the given pairs, never the environment
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            overrides: Some(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    /// Environment key names for a location
    pub fn key_names(location: &str) -> (String, String) {
        let prefix = format!("FRONO_{}", location.to_uppercase());
        (format!("{prefix}_USERNAME"), format!("{prefix}_PASSWORD"))
    }

    /// Load .env once per lookup; dotenv leaves already-set variables alone
    fn init_env() {
        let _ = dotenv::dotenv();
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let value = match &self.overrides {
            Some(pairs) => pairs.get(key).cloned(),
            None => std::env::var(key).ok(),
        };
        value.filter(|v| !v.is_empty())
    }
}

impl Default for EnvCredentialSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialSource for EnvCredentialSource {
    async fn credentials(&self, location: &str) -> WorkflowResult<Credentials> {
        if self.overrides.is_none() {
            Self::init_env();
        }

        let (user_key, password_key) = Self::key_names(location);
        let username = self.lookup(&user_key);
        let password = self.lookup(&password_key);

        match (username, password) {
            (Some(username), Some(password)) => Ok(Credentials { username, password }),
            (username, password) => {
                let mut keys = Vec::new();
                if username.is_none() {
                    keys.push(user_key);
                }
                if password.is_none() {
                    keys.push(password_key);
                }
                Err(WorkflowError::MissingCredentials {
                    location: location.to_string(),
                    keys,
                })
            }
        }
    }
}
