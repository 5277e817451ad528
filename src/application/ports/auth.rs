//! Identity gateway port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::identity::Account;

/// Identity errors
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The backend rejected this client's configuration. Callers may
    /// fall back to the guest identity instead of surfacing this.
    #[error("This client is not authorized for the identity backend")]
    UnauthorizedClient,

    #[error("Identity request failed: {0}")]
    RequestFailed(String),
}

/// Port for the external identity provider
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Email/password sign-in
    async fn sign_in(&self, email: &str, password: &str) -> Result<Account, IdentityError>;

    /// Restore a session from a stored refresh token
    async fn restore(&self, refresh_token: &str) -> Result<Account, IdentityError>;

    /// Revoke the account's session with the provider
    async fn sign_out(&self, account: &Account) -> Result<(), IdentityError>;
}
