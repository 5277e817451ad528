//! Identity value objects

use std::fmt;

/// Sentinel email carried by the locally fabricated guest identity
pub const GUEST_EMAIL: &str = "guest@vivavoce.local";

/// Synthetic token for the guest identity. Never sent to a backend.
const GUEST_TOKEN: &str = "guest-session-token";

/// A signed-in account returned by the identity gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
}

/// Who is signed in.
///
/// Guest is a deliberate tagged variant rather than an account-shaped
/// fake, so downstream code matches on it explicitly instead of relying
/// on structural compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// A real identity from the external provider
    Account(Account),
    /// Locally fabricated stand-in; lifecycle bounded to this process
    Guest,
}

impl Identity {
    /// Build the guest identity
    pub fn guest() -> Self {
        Self::Guest
    }

    /// The email shown for this identity
    pub fn email(&self) -> &str {
        match self {
            Self::Account(account) => &account.email,
            Self::Guest => GUEST_EMAIL,
        }
    }

    /// Bearer token for backend calls. The guest token is synthetic and
    /// only exists to keep token-shaped plumbing uniform.
    pub fn token(&self) -> &str {
        match self {
            Self::Account(account) => &account.id_token,
            Self::Guest => GUEST_TOKEN,
        }
    }

    /// Whether this is the local guest identity
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(account) => write!(f, "{}", account.email),
            Self::Guest => write!(f, "{} (guest)", GUEST_EMAIL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Identity {
        Identity::Account(Account {
            uid: "uid-1".into(),
            email: "user@example.com".into(),
            id_token: "tok".into(),
            refresh_token: "refresh".into(),
        })
    }

    #[test]
    fn guest_has_sentinel_email() {
        let guest = Identity::guest();
        assert!(guest.is_guest());
        assert_eq!(guest.email(), GUEST_EMAIL);
    }

    #[test]
    fn guest_token_is_synthetic() {
        assert!(!Identity::guest().token().is_empty());
    }

    #[test]
    fn account_is_not_guest() {
        let id = account();
        assert!(!id.is_guest());
        assert_eq!(id.email(), "user@example.com");
        assert_eq!(id.token(), "tok");
    }

    #[test]
    fn display_marks_guest() {
        assert!(Identity::guest().to_string().contains("guest"));
        assert_eq!(account().to_string(), "user@example.com");
    }
}
