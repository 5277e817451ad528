//! Live session status

use std::fmt;

/// Playback status of the live session.
///
/// Flow: `Inactive -> Listening` when a connect attempt starts,
/// `Listening <-> Speaking` driven by synthesized audio arriving and
/// draining, and any state `-> Inactive` on disconnect, close, or fatal
/// error. `Processing` is a declared status with no producer in the live
/// orchestrator; it is reserved for request/response flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LiveStatus {
    #[default]
    Inactive,
    Listening,
    Speaking,
    Processing,
}

impl LiveStatus {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Listening => "listening",
            Self::Speaking => "speaking",
            Self::Processing => "processing",
        }
    }

    /// Whether a session is currently up
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

impl fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_inactive() {
        assert_eq!(LiveStatus::default(), LiveStatus::Inactive);
    }

    #[test]
    fn display() {
        assert_eq!(LiveStatus::Inactive.to_string(), "inactive");
        assert_eq!(LiveStatus::Listening.to_string(), "listening");
        assert_eq!(LiveStatus::Speaking.to_string(), "speaking");
        assert_eq!(LiveStatus::Processing.to_string(), "processing");
    }

    #[test]
    fn activity() {
        assert!(!LiveStatus::Inactive.is_active());
        assert!(LiveStatus::Listening.is_active());
        assert!(LiveStatus::Speaking.is_active());
    }
}
