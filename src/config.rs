use serde::{Deserialize, Serialize};
use std::fmt;

/// Endpoints and limits used when delivering quiz results.
///
/// Every field has a production default, so a partial JSON document only needs
/// to name what it overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// OAuth token endpoint the signed assertion is exchanged at
    pub token_url: String,

    /// Base URL of the spreadsheets API, without a trailing slash
    pub sheets_api_url: String,

    /// OAuth scope requested for the access token
    pub scope: String,

    /// Lifetime of the signed assertion in seconds
    pub token_lifetime_secs: i64,

    /// SMTP relay used for e-mail delivery (implicit TLS)
    pub smtp_host: String,

    pub smtp_port: u16,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            sheets_api_url: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
            scope: "https://www.googleapis.com/auth/spreadsheets".to_string(),
            token_lifetime_secs: 3600,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
        }
    }
}

impl QuizConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Service-account credentials, as found in the provider's JSON key file.
///
/// Unknown fields of the key file are ignored.
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key_id: String,
    /// PEM-encoded RSA private key
    pub private_key: String,
}

impl ServiceAccount {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// Keep the private key out of logs.
impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}
