//! Identity provider REST adapter
//!
//! Speaks the Identity Toolkit shape: password sign-in against the
//! accounts endpoint, refresh-token restoration against the secure
//! token endpoint, and token revocation on sign-out.

use async_trait::async_trait;
use serde::Deserialize;

use crate::application::ports::{IdentityError, IdentityGateway};
use crate::domain::identity::Account;

/// Accounts endpoint base
const IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Refresh-token exchange endpoint base
const TOKEN_BASE_URL: &str = "https://securetoken.googleapis.com/v1";

/// Token revocation endpoint
const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    id_token: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    user_id: String,
    id_token: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// REST identity gateway
pub struct IdentityClient {
    api_key: String,
    identity_base: String,
    token_base: String,
    revoke_url: String,
    client: reqwest::Client,
}

impl IdentityClient {
    /// Create a gateway with the given web API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            identity_base: IDENTITY_BASE_URL.to_string(),
            token_base: TOKEN_BASE_URL.to_string(),
            revoke_url: REVOKE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point every endpoint at a custom base (tests)
    pub fn with_base_urls(
        api_key: impl Into<String>,
        identity_base: impl Into<String>,
        token_base: impl Into<String>,
        revoke_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            identity_base: identity_base.into(),
            token_base: token_base.into(),
            revoke_url: revoke_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Classify an error payload from the provider
    fn classify_error(status: reqwest::StatusCode, body: &str) -> IdentityError {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error)
            .and_then(|error| error.message)
            .unwrap_or_default();

        if message.contains("INVALID_LOGIN_CREDENTIALS")
            || message.contains("INVALID_PASSWORD")
            || message.contains("EMAIL_NOT_FOUND")
        {
            return IdentityError::InvalidCredentials;
        }
        if status == reqwest::StatusCode::FORBIDDEN
            || message.contains("OPERATION_NOT_ALLOWED")
            || message.contains("UNAUTHORIZED")
            || message.contains("API key not valid")
        {
            return IdentityError::UnauthorizedClient;
        }
        IdentityError::RequestFailed(format!("HTTP {}: {}", status, message))
    }
}

#[async_trait]
impl IdentityGateway for IdentityClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Account, IdentityError> {
        let url = format!(
            "{}/accounts:signInWithPassword?key={}",
            self.identity_base, self.api_key
        );
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_error(status, &body));
        }

        let signed_in: SignInResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        Ok(Account {
            uid: signed_in.local_id,
            email: signed_in.email,
            id_token: signed_in.id_token,
            refresh_token: signed_in.refresh_token,
        })
    }

    async fn restore(&self, refresh_token: &str) -> Result<Account, IdentityError> {
        let url = format!("{}/token?key={}", self.token_base, self.api_key);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_error(status, &body));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        // The refresh exchange does not echo the email back; the account
        // is still fully usable for token-bearing calls.
        Ok(Account {
            uid: refreshed.user_id,
            email: String::new(),
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
        })
    }

    async fn sign_out(&self, account: &Account) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(&self.revoke_url)
            .form(&[("token", account.refresh_token.as_str())])
            .send()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_error(status, &body));
        }
        Ok(())
    }
}
