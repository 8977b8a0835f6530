#![cfg(feature = "quiz")]
use crate::config::{QuizConfig, ServiceAccount};
use crate::error::QuizError;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Claims of the signed assertion exchanged for an access token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Options for appending rows
#[derive(Clone, Debug)]
pub struct AppendOptions {
    /// Cell the append starts searching from, e.g. `Sheet1!A1`
    pub range: String,

    /// Add the local time as a last cell of every row
    pub include_timestamp: bool,
}

impl Default for AppendOptions {
    fn default() -> Self {
        Self {
            range: "Sheet1!A1".to_string(),
            include_timestamp: true,
        }
    }
}

/// Client for appending quiz results to a spreadsheet
pub struct SheetsClient {
    http: reqwest::Client,
    config: QuizConfig,
}

impl SheetsClient {
    pub fn new(config: QuizConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// Sign the RS256 assertion for `account`, issued at `issued_at` (Unix seconds).
    pub fn build_assertion(
        &self,
        account: &ServiceAccount,
        issued_at: i64,
    ) -> Result<String, QuizError> {
        let claims = Claims {
            iss: account.client_email.clone(),
            scope: self.config.scope.clone(),
            aud: self.config.token_url.clone(),
            iat: issued_at,
            exp: issued_at + self.config.token_lifetime_secs,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(account.private_key_id.clone());

        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())?;
        Ok(encode(&header, &claims, &key)?)
    }

    /// Exchange a freshly signed assertion for an access token.
    pub async fn access_token(&self, account: &ServiceAccount) -> Result<String, QuizError> {
        let assertion = self.build_assertion(account, chrono::Utc::now().timestamp())?;

        let response: TokenResponse = self
            .http
            .post(&self.config.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?
            .json()
            .await?;

        response.access_token.ok_or(QuizError::MissingToken)
    }

    /// URL of the append call for `spreadsheet_id` starting at `range`.
    pub fn append_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/{}/values/{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.config.sheets_api_url, spreadsheet_id, range
        )
    }

    /// Append `values` (one inner vector per row) and return the API's JSON response.
    ///
    /// Failures are logged before being returned.
    pub async fn append(
        &self,
        account: &ServiceAccount,
        spreadsheet_id: &str,
        values: Vec<Vec<Value>>,
        options: &AppendOptions,
    ) -> Result<Value, QuizError> {
        self.try_append(account, spreadsheet_id, values, options)
            .await
            .inspect_err(|e| error!("failed to append to sheet {}: {}", spreadsheet_id, e))
    }

    async fn try_append(
        &self,
        account: &ServiceAccount,
        spreadsheet_id: &str,
        values: Vec<Vec<Value>>,
        options: &AppendOptions,
    ) -> Result<Value, QuizError> {
        let token = self.access_token(account).await?;

        let values = if options.include_timestamp {
            let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            stamp_rows(values, &now)
        } else {
            values
        };
        debug!("appending {} rows to sheet {}", values.len(), spreadsheet_id);

        let response = self
            .http
            .post(self.append_url(spreadsheet_id, &options.range))
            .bearer_auth(token)
            .json(&json!({ "values": values }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;
        if status.is_success() {
            info!("appended rows to sheet {}", spreadsheet_id);
        } else {
            error!("sheet {} rejected append ({}): {}", spreadsheet_id, status, body);
        }
        Ok(body)
    }
}

/// Add `timestamp` as the last cell of every row.
pub fn stamp_rows(values: Vec<Vec<Value>>, timestamp: &str) -> Vec<Vec<Value>> {
    values
        .into_iter()
        .map(|mut row| {
            row.push(Value::String(timestamp.to_string()));
            row
        })
        .collect()
}

/// Append rows to a spreadsheet using the default endpoints.
pub async fn append_to_sheet(
    account: &ServiceAccount,
    spreadsheet_id: &str,
    values: Vec<Vec<Value>>,
    options: &AppendOptions,
) -> Result<Value, QuizError> {
    SheetsClient::new(QuizConfig::default())
        .append(account, spreadsheet_id, values, options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};

    const PRIVATE_KEY: &str = include_str!("../tests/fixtures/service_key.pem");
    const PUBLIC_KEY: &str = include_str!("../tests/fixtures/service_key.pub.pem");

    fn account() -> ServiceAccount {
        ServiceAccount {
            client_email: "grader@example.iam.gserviceaccount.com".to_string(),
            private_key_id: "key-1".to_string(),
            private_key: PRIVATE_KEY.to_string(),
        }
    }

    #[test]
    fn assertion_is_signed_with_key_id() {
        let client = SheetsClient::new(QuizConfig::default());
        let now = chrono::Utc::now().timestamp();
        let jwt = client.build_assertion(&account(), now).unwrap();

        let header = decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("key-1"));

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[client.config().token_url.as_str()]);
        let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap();
        let claims = decode::<Claims>(&jwt, &key, &validation).unwrap().claims;

        assert_eq!(claims.iss, "grader@example.iam.gserviceaccount.com");
        assert_eq!(claims.scope, "https://www.googleapis.com/auth/spreadsheets");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn bad_key_is_rejected() {
        let client = SheetsClient::new(QuizConfig::default());
        let mut account = account();
        account.private_key = "not a key".to_string();
        assert!(matches!(
            client.build_assertion(&account, 0),
            Err(QuizError::Jwt(_))
        ));
    }

    #[test]
    fn append_url_shape() {
        let client = SheetsClient::new(QuizConfig::default());
        assert_eq!(
            client.append_url("abc", "Sheet1!A1"),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Sheet1!A1:append\
             ?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
        );
    }

    #[test]
    fn rows_get_timestamp() {
        let rows = stamp_rows(
            vec![vec![json!("ada"), json!(1811123), json!("correct")]],
            "2024-01-02 03:04:05",
        );
        assert_eq!(
            rows,
            vec![vec![
                json!("ada"),
                json!(1811123),
                json!("correct"),
                json!("2024-01-02 03:04:05")
            ]]
        );
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_is_an_error() {
        let config = QuizConfig {
            token_url: "http://127.0.0.1:9/token".to_string(),
            ..QuizConfig::default()
        };
        let client = SheetsClient::new(config);
        let result = client
            .append(&account(), "abc", vec![vec![json!(1)]], &AppendOptions::default())
            .await;
        assert!(matches!(result, Err(QuizError::Http(_))));
    }
}
