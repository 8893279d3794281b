//! Token table loaded from configuration.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use super::IdentityProvider;
use crate::config::ConfigError;
use crate::domain::Identity;
use crate::error::BookingError;

/// Verifies bearer tokens against a fixed table.
///
/// The table is parsed from `AUTH_TOKENS`: comma-separated entries of the
/// form `token:user_id` or `token:user_id:admin`, e.g.
/// `s3cret:1:admin,guest-token:2`.
#[derive(Clone, Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenProvider {
    /// Parses the `AUTH_TOKENS` format. Blank input yields an empty table,
    /// which rejects every token.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidTokenEntry`] for a malformed or repeated entry.
    pub fn parse(table: &str) -> Result<Self, ConfigError> {
        let mut tokens = HashMap::new();
        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (token, identity) = parse_entry(entry)?;
            if tokens.insert(token.to_string(), identity).is_some() {
                return Err(invalid(entry, "token listed twice"));
            }
        }
        Ok(Self { tokens })
    }

    /// Number of configured tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if no token is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn invalid(entry: &str, reason: &'static str) -> ConfigError {
    // Only the user part is echoed back; the token itself stays out of logs.
    let shown = entry.split_once(':').map_or("", |(_, rest)| rest);
    ConfigError::InvalidTokenEntry {
        entry: format!("***:{shown}"),
        reason,
    }
}

fn parse_entry(entry: &str) -> Result<(&str, Identity), ConfigError> {
    let mut parts = entry.split(':').map(str::trim);
    let token = parts.next().filter(|t| !t.is_empty());
    let user_id = parts.next().and_then(|id| id.parse::<i32>().ok());
    let is_superuser = match parts.next() {
        None => false,
        Some(flag) if flag.eq_ignore_ascii_case("admin") || flag.eq_ignore_ascii_case("superuser") => {
            true
        }
        Some(_) => return Err(invalid(entry, "third field must be `admin`")),
    };
    if parts.next().is_some() {
        return Err(invalid(entry, "too many fields"));
    }
    match (token, user_id) {
        (Some(token), Some(user_id)) => Ok((
            token,
            Identity {
                user_id,
                is_superuser,
            },
        )),
        (None, _) => Err(invalid(entry, "empty token")),
        (Some(_), None) => Err(invalid(entry, "user id must be an integer")),
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn authenticate(&self, token: &str) -> Result<Identity, BookingError> {
        self.tokens.get(token).cloned().ok_or_else(|| {
            tracing::debug!("bearer token rejected");
            BookingError::Unauthorized
        })
    }
}
