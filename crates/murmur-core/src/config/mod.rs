//! Environment-driven board configuration.
//!
//! Everything is read through a lookup closure so parsing is testable
//! without touching the process environment.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use crate::auth::AdminGate;
use crate::models::CollectionKind;
use crate::retention::DEFAULT_RETENTION_HOURS;
use crate::store::GitHubConfig;
use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Document locations and retention window used by the board service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSettings {
    pub feedback_path: String,
    pub tickets_path: String,
    pub retention_hours: u32,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            feedback_path: CollectionKind::Feedback.default_path().to_string(),
            tickets_path: CollectionKind::Tickets.default_path().to_string(),
            retention_hours: DEFAULT_RETENTION_HOURS,
        }
    }
}

impl BoardSettings {
    #[must_use]
    pub fn path(&self, kind: CollectionKind) -> &str {
        match kind {
            CollectionKind::Feedback => &self.feedback_path,
            CollectionKind::Tickets => &self.tickets_path,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub api_url: String,
    pub repo: String,
    pub branch: String,
    pub github_token: String,
    pub http_timeout: Duration,
    pub settings: BoardSettings,
    pub admin_password: Option<String>,
}

impl fmt::Debug for BoardConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BoardConfig")
            .field("api_url", &self.api_url)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("github_token", &"[REDACTED]")
            .field("http_timeout", &self.http_timeout)
            .field("settings", &self.settings)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl BoardConfig {
    pub fn from_env() -> Result<Self> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let github_token = required_trimmed(&lookup, "MURMUR_GITHUB_TOKEN")?;

        let repo = required_trimmed(&lookup, "MURMUR_REPO")?;
        let repo = repo.trim_matches('/').to_string();
        if repo.split('/').filter(|part| !part.is_empty()).count() != 2 {
            return Err(Error::Config(
                "MURMUR_REPO must look like owner/name".to_string(),
            ));
        }

        let branch = value_or_default(&lookup, "MURMUR_BRANCH", DEFAULT_BRANCH);

        let api_url = value_or_default(&lookup, "MURMUR_API_URL", DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        if !is_http_url(&api_url) {
            return Err(Error::Config(
                "MURMUR_API_URL must start with http:// or https://".to_string(),
            ));
        }

        let feedback_path = value_or_default(
            &lookup,
            "MURMUR_FEEDBACK_PATH",
            CollectionKind::Feedback.default_path(),
        );
        let tickets_path = value_or_default(
            &lookup,
            "MURMUR_TICKETS_PATH",
            CollectionKind::Tickets.default_path(),
        );
        if feedback_path == tickets_path {
            return Err(Error::Config(
                "MURMUR_FEEDBACK_PATH and MURMUR_TICKETS_PATH must differ".to_string(),
            ));
        }

        let retention_hours = value_or_default(
            &lookup,
            "MURMUR_RETENTION_HOURS",
            &DEFAULT_RETENTION_HOURS.to_string(),
        )
        .parse::<u32>()
        .ok()
        .filter(|hours| *hours > 0)
        .ok_or_else(|| {
            Error::Config("MURMUR_RETENTION_HOURS must be a positive integer".to_string())
        })?;

        let timeout_secs = value_or_default(
            &lookup,
            "MURMUR_HTTP_TIMEOUT_SECS",
            &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .ok()
        .filter(|secs| (1..=300).contains(secs))
        .ok_or_else(|| {
            Error::Config("MURMUR_HTTP_TIMEOUT_SECS must be an integer in [1, 300]".to_string())
        })?;

        Ok(Self {
            api_url,
            repo,
            branch,
            github_token,
            http_timeout: Duration::from_secs(timeout_secs),
            settings: BoardSettings {
                feedback_path,
                tickets_path,
                retention_hours,
            },
            admin_password: optional_trimmed(&lookup, "MURMUR_ADMIN_PASSWORD"),
        })
    }

    #[must_use]
    pub fn github_config(&self) -> GitHubConfig {
        GitHubConfig {
            api_url: self.api_url.clone(),
            repo: self.repo.clone(),
            branch: self.branch.clone(),
            token: self.github_token.clone(),
            timeout: self.http_timeout,
        }
    }

    #[must_use]
    pub fn admin_gate(&self) -> AdminGate {
        AdminGate::new(self.admin_password.clone())
    }
}

fn optional_trimmed(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}

fn required_trimmed(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    optional_trimmed(lookup, name)
        .ok_or_else(|| Error::Config(format!("missing required environment variable {name}")))
}

fn value_or_default(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<HashMap<_, _>>();
        move |name| values.get(name).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("MURMUR_GITHUB_TOKEN", "ghp_secret"),
            ("MURMUR_REPO", "campus/board-data"),
        ]
    }

    #[test]
    fn defaults_fill_everything_optional() {
        let config = BoardConfig::from_lookup(lookup_from(&minimal())).unwrap();
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.branch, "main");
        assert_eq!(config.settings, BoardSettings::default());
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.admin_password, None);
        assert!(!config.admin_gate().is_enabled());
    }

    #[test]
    fn overrides_are_applied() {
        let mut pairs = minimal();
        pairs.extend([
            ("MURMUR_BRANCH", "data"),
            ("MURMUR_API_URL", "http://localhost:9000/"),
            ("MURMUR_FEEDBACK_PATH", "board/feedback.json"),
            ("MURMUR_RETENTION_HOURS", "48"),
            ("MURMUR_ADMIN_PASSWORD", " letmein "),
        ]);
        let config = BoardConfig::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.settings.path(CollectionKind::Feedback), "board/feedback.json");
        assert_eq!(config.settings.retention_hours, 48);
        assert_eq!(config.admin_password.as_deref(), Some("letmein"));

        let github = config.github_config();
        assert_eq!(github.branch, "data");
        assert_eq!(github.token, "ghp_secret");
    }

    #[test]
    fn missing_token_is_reported_by_name() {
        let error = BoardConfig::from_lookup(lookup_from(&[("MURMUR_REPO", "a/b")])).unwrap_err();
        assert!(error.to_string().contains("MURMUR_GITHUB_TOKEN"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (key, value) in [
            ("MURMUR_REPO", "no-slash"),
            ("MURMUR_API_URL", "ftp://example.com"),
            ("MURMUR_RETENTION_HOURS", "0"),
            ("MURMUR_HTTP_TIMEOUT_SECS", "abc"),
            ("MURMUR_TICKETS_PATH", "feedback.json"),
        ] {
            let mut pairs = minimal();
            pairs.retain(|(existing, _)| *existing != key);
            pairs.push((key, value));
            assert!(
                matches!(
                    BoardConfig::from_lookup(lookup_from(&pairs)),
                    Err(Error::Config(_))
                ),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut pairs = minimal();
        pairs.push(("MURMUR_ADMIN_PASSWORD", "letmein"));
        let config = BoardConfig::from_lookup(lookup_from(&pairs)).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("ghp_secret"));
        assert!(!rendered.contains("letmein"));
    }
}
