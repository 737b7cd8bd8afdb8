//! Session resolution: which platform to talk to, and as whom.
//!
//! Every command needs a hostname and a bearer token. Rather than requiring
//! flags on every invocation, each is resolved through a chain:
//!
//! 1. `--hostname`: explicit per-command override (hostname only)
//! 2. `AE5_HOSTNAME` / `AE5_TOKEN` env vars: process/session level
//! 3. `~/.ae5/config.toml`: global default
//!
//! The resolved [`Session`] is passed explicitly to the HTTP client.
//! Nothing here logs in or caches credentials; obtaining the token is the
//! caller's business.

use std::env;

use crate::config::Config;
use crate::error::{Error, Result};

/// Error message shown when no hostname can be resolved.
pub const HOSTNAME_REQUIRED: &str = "hostname required: pass --hostname <host>, \
    set AE5_HOSTNAME, or add `hostname = \"...\"` to ~/.ae5/config.toml";

/// Error message shown when no token can be resolved.
pub const TOKEN_REQUIRED: &str = "token required: set AE5_TOKEN, \
    or add `token = \"...\"` to ~/.ae5/config.toml";

/// An authenticated handle on one platform instance.
#[derive(Clone)]
pub struct Session {
    pub hostname: String,
    pub token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("hostname", &self.hostname)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Session {
    /// Resolve the session from the tiered chain.
    pub fn resolve(explicit_hostname: Option<&str>, config: &Config) -> Result<Self> {
        let hostname = first_of(
            explicit_hostname.map(String::from),
            env::var("AE5_HOSTNAME").ok(),
            config.hostname.clone(),
        )
        .ok_or_else(|| Error::Config(HOSTNAME_REQUIRED.to_string()))?;

        let token = first_of(None, env::var("AE5_TOKEN").ok(), config.token.clone())
            .ok_or_else(|| Error::Config(TOKEN_REQUIRED.to_string()))?;

        Ok(Self { hostname, token })
    }
}

/// First non-empty value in chain order: explicit, environment, config.
fn first_of(
    explicit: Option<String>,
    from_env: Option<String>,
    from_config: Option<String>,
) -> Option<String> {
    [explicit, from_env, from_config]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_wins() {
        let value = first_of(Some("flag".into()), Some("env".into()), Some("file".into()));
        assert_eq!(value.as_deref(), Some("flag"));
    }

    #[test]
    fn env_beats_config() {
        let value = first_of(None, Some("env".into()), Some("file".into()));
        assert_eq!(value.as_deref(), Some("env"));
    }

    #[test]
    fn empty_values_fall_through() {
        let value = first_of(Some(String::new()), Some(String::new()), Some("file".into()));
        assert_eq!(value.as_deref(), Some("file"));
        assert_eq!(first_of(None, None, None), None);
    }

    #[test]
    fn debug_redacts_token() {
        let session = Session {
            hostname: "h".into(),
            token: "secret".into(),
        };
        assert!(!format!("{session:?}").contains("secret"));
    }
}
