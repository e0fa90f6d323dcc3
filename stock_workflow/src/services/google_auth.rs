//! Service-account access tokens for the Sheets API
//!
//! A service account signs a short-lived RS256 assertion with its private key
//! and trades it at its token endpoint for a bearer token (the OAuth 2.0 JWT
//! bearer grant). Nothing is cached: a run fetches the sheet once.

use std::fmt;
use std::path::Path;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{WorkflowError, WorkflowResult};

/// Read-only access to spreadsheets, all the workflow needs
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a downloaded service-account key file the grant needs
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccountKey {
    pub async fn from_file(path: &Path) -> WorkflowResult<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            WorkflowError::source_unavailable(format!(
                "cannot read service account key {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            WorkflowError::source_unavailable(format!(
                "invalid service account key {}: {e}",
                path.display()
            ))
        })
    }

    /// Signed assertion for `scope`, valid for an hour from `issued_at` (unix seconds)
    pub fn assertion(&self, scope: &str, issued_at: i64) -> WorkflowResult<String> {
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: scope.to_string(),
            aud: self.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| WorkflowError::source_unavailable(format!("unusable service account private key: {e}")))?;
        encode(&header, &claims, &key)
            .map_err(|e| WorkflowError::source_unavailable(format!("cannot sign service account assertion: {e}")))
    }

    /// Exchange a fresh assertion for a bearer token at the key's token endpoint
    pub async fn access_token(&self, client: &reqwest::Client, scope: &str) -> WorkflowResult<String> {
        let assertion = self.assertion(scope, chrono::Utc::now().timestamp())?;

        let response = client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| WorkflowError::source_unavailable(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkflowError::source_unavailable(format!(
                "token endpoint returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| WorkflowError::source_unavailable(format!("undecodable token response: {e}")))?;
        debug!("Obtained Sheets access token for {}", self.client_email);
        Ok(token.access_token)
    }
}
