use std::time::Duration as StdDuration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tokio::time::sleep;

use crate::db::models::Account;
use crate::mail::{MailMessage, MailProvider};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const TOKEN_SKEW_SECONDS: i64 = 60;
const SEARCH_PAGE_SIZE: usize = 50;
const MAX_RATE_LIMIT_RETRIES: usize = 5;
const REDACTED_BODY_MAX_LEN: usize = 200;

/// Gmail REST client. Acquires a live access token from the account's stored
/// refresh credential at connect time; a run never starts without one.
pub struct GmailProvider {
    client: Client,
    token: AccessToken,
}

impl GmailProvider {
    pub async fn connect(account: &Account) -> Result<Self> {
        let client = Client::new();
        let credentials = GmailCredentials::resolve(account)?;
        let token = fetch_token(&client, &credentials)
            .await
            .with_context(|| format!("authenticate gmail account {}", account.account_id))?;

        Ok(Self { client, token })
    }

    async fn get_with_retry(&self, url: Url) -> Result<String> {
        if self.token.is_expired() {
            return Err(anyhow!(
                "gmail access token expired mid-run; re-run sync to refresh"
            ));
        }

        let mut backoff_seconds = 1u64;

        for attempt in 0..=MAX_RATE_LIMIT_RETRIES {
            let response = self
                .client
                .get(url.clone())
                .bearer_auth(&self.token.value)
                .header("accept", "application/json")
                .send()
                .await
                .with_context(|| format!("gmail api request: {url}"))?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempt == MAX_RATE_LIMIT_RETRIES {
                    let body = response
                        .text()
                        .await
                        .context("read gmail 429 response body")?;
                    return Err(anyhow!(
                        "gmail api request exhausted retries: {}",
                        redact_response_body(&body)
                    ));
                }

                let retry_after_seconds = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(backoff_seconds);

                sleep(StdDuration::from_secs(retry_after_seconds)).await;
                backoff_seconds = (backoff_seconds * 2).min(32);
                continue;
            }

            let status = response.status();
            let body = response
                .text()
                .await
                .context("read gmail api response body")?;
            if !status.is_success() {
                return Err(anyhow!(
                    "gmail api request failed: status={} body={}",
                    status,
                    redact_response_body(&body)
                ));
            }

            return Ok(body);
        }

        Err(anyhow!("gmail api request failed without response"))
    }
}

#[async_trait(?Send)]
impl MailProvider for GmailProvider {
    fn name(&self) -> &str {
        "gmail_api"
    }

    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let url = Url::parse_with_params(
            &format!("{GMAIL_API_BASE}/users/me/messages"),
            [
                ("maxResults", SEARCH_PAGE_SIZE.to_string().as_str()),
                ("q", query),
            ],
        )
        .context("build gmail search url")?;

        let body = self.get_with_retry(url).await?;
        let list: GmailMessageList =
            serde_json::from_str(&body).context("decode gmail message list")?;

        Ok(list
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|stub| stub.id)
            .collect())
    }

    async fn fetch(&self, message_id: &str) -> Result<MailMessage> {
        let url = Url::parse(&format!(
            "{GMAIL_API_BASE}/users/me/messages/{message_id}?format=full"
        ))
        .context("build gmail fetch url")?;

        let body = self.get_with_retry(url).await?;
        serde_json::from_str(&body).context("decode gmail message")
    }
}

#[derive(Debug, Clone)]
struct GmailCredentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl GmailCredentials {
    fn resolve(account: &Account) -> Result<Self> {
        let client_id = std::env::var("SPENT_GMAIL_CLIENT_ID")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| config_string(account, "client_id"))
            .ok_or_else(|| {
                anyhow!("missing gmail client id (SPENT_GMAIL_CLIENT_ID/account.config)")
            })?;

        let client_secret = std::env::var("SPENT_GMAIL_CLIENT_SECRET")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| config_string(account, "client_secret"))
            .ok_or_else(|| {
                anyhow!("missing gmail client secret (SPENT_GMAIL_CLIENT_SECRET/account.config)")
            })?;

        let refresh_token = std::env::var("SPENT_GMAIL_REFRESH_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| config_string(account, "refresh_token"))
            .ok_or_else(|| {
                anyhow!("missing gmail refresh token (SPENT_GMAIL_REFRESH_TOKEN/account.config)")
            })?;

        Ok(Self {
            client_id,
            client_secret,
            refresh_token,
        })
    }
}

fn config_string(account: &Account, key: &str) -> Option<String> {
    account
        .config
        .as_ref()
        .and_then(|config| config.get(key))
        .and_then(|value| value.as_str())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

async fn fetch_token(client: &Client, credentials: &GmailCredentials) -> Result<AccessToken> {
    let token_url = std::env::var("SPENT_GMAIL_TOKEN_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string());

    let response = client
        .post(&token_url)
        .form(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await
        .with_context(|| format!("request gmail oauth token from {token_url}"))?;

    let status = response.status();
    let body = response.text().await.context("read gmail token response")?;
    if !status.is_success() {
        return Err(anyhow!(
            "gmail oauth token request failed: status={} body={}",
            status,
            redact_response_body(&body)
        ));
    }

    let payload: OAuthTokenResponse =
        serde_json::from_str(&body).context("decode gmail token JSON response")?;
    let expires_at = Utc::now()
        + Duration::seconds((payload.expires_in as i64).saturating_sub(TOKEN_SKEW_SECONDS));

    Ok(AccessToken {
        value: payload.access_token,
        expires_at,
    })
}

fn redact_response_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= REDACTED_BODY_MAX_LEN {
        trimmed.to_string()
    } else {
        format!(
            "{}…[truncated {} bytes]",
            &trimmed[..REDACTED_BODY_MAX_LEN],
            trimmed.len()
        )
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct GmailMessageList {
    messages: Option<Vec<GmailMessageStub>>,
}

#[derive(Debug, Clone, Deserialize)]
struct GmailMessageStub {
    id: String,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::json;

    use super::{AccessToken, GmailCredentials, GmailMessageList};
    use crate::db::models::Account;

    fn account_with_config(config: serde_json::Value) -> Account {
        Account {
            account_id: "acc-gmail".to_string(),
            email_address: "user@gmail.com".to_string(),
            display_name: None,
            enabled: true,
            last_sync: None,
            config: Some(config),
        }
    }

    #[test]
    fn credentials_resolve_from_account_config() {
        let account = account_with_config(json!({
            "client_id": "id-1",
            "client_secret": "secret-1",
            "refresh_token": "refresh-1",
        }));
        let credentials = GmailCredentials::resolve(&account).expect("resolve credentials");
        assert_eq!(credentials.client_id, "id-1");
        assert_eq!(credentials.refresh_token, "refresh-1");
    }

    #[test]
    fn credentials_missing_refresh_token_is_an_error() {
        let account = account_with_config(json!({
            "client_id": "id-1",
            "client_secret": "secret-1",
        }));
        let error = GmailCredentials::resolve(&account).expect_err("must fail");
        assert!(error.to_string().contains("refresh token"));
    }

    #[test]
    fn token_expiry_check() {
        let live = AccessToken {
            value: "t".to_string(),
            expires_at: Utc::now() + Duration::minutes(10),
        };
        let stale = AccessToken {
            value: "t".to_string(),
            expires_at: Utc::now() - Duration::seconds(1),
        };
        assert!(!live.is_expired());
        assert!(stale.is_expired());
    }

    #[test]
    fn message_list_tolerates_missing_messages_field() {
        let list: GmailMessageList = serde_json::from_str("{}").expect("decode empty list");
        assert!(list.messages.is_none());
    }
}
