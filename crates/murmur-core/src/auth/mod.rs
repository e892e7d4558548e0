//! Shared-secret admin gate.

use std::fmt;

use crate::util::normalize_text_option;
use crate::{Error, Result};

/// Author recorded on history entries written by admin operations.
pub const ADMIN_AUTHOR: &str = "admin";

/// Holds the configured admin password. An unset or blank password disables
/// every admin operation.
#[derive(Clone, Default)]
pub struct AdminGate {
    secret: Option<String>,
}

impl fmt::Debug for AdminGate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AdminGate")
            .field("enabled", &self.is_enabled())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl AdminGate {
    #[must_use]
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: normalize_text_option(secret),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Exchange a password for an admin session.
    pub fn login(&self, password: &str) -> Result<AdminSession> {
        let Some(secret) = self.secret.as_deref() else {
            return Err(Error::Unauthorized(
                "admin access is disabled (MURMUR_ADMIN_PASSWORD is not set)".to_string(),
            ));
        };

        if constant_time_eq(secret.as_bytes(), password.trim().as_bytes()) {
            tracing::info!("Admin session opened");
            Ok(AdminSession { _private: () })
        } else {
            tracing::warn!("Rejected admin login attempt");
            Err(Error::Unauthorized("incorrect admin password".to_string()))
        }
    }
}

/// Proof of a successful admin login. Only [`AdminGate::login`] creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    _private: (),
}

impl AdminSession {
    #[must_use]
    pub const fn author(&self) -> &'static str {
        ADMIN_AUTHOR
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0_u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_opens_a_session() {
        let gate = AdminGate::new(Some("hunter2".to_string()));
        let session = gate.login(" hunter2 ").unwrap();
        assert_eq!(session.author(), "admin");
    }

    #[test]
    fn wrong_password_is_rejected() {
        let gate = AdminGate::new(Some("hunter2".to_string()));
        assert!(matches!(gate.login("hunter3"), Err(Error::Unauthorized(_))));
        assert!(matches!(gate.login(""), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn blank_secret_disables_admin() {
        let gate = AdminGate::new(Some("   ".to_string()));
        assert!(!gate.is_enabled());
        assert!(gate.login("   ").is_err());
        assert!(AdminGate::default().login("anything").is_err());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let gate = AdminGate::new(Some("hunter2".to_string()));
        let rendered = format!("{gate:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
