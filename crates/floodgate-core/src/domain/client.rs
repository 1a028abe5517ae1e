use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Longest accepted client identity.
pub const MAX_CLIENT_ID_LEN: usize = 200;

/// Characters of the `User-Agent` header folded into the identity.
pub const USER_AGENT_PREFIX_LEN: usize = 50;

/// Characters of the address kept, leaving room for `:` and the agent prefix.
pub const ADDRESS_PREFIX_LEN: usize = MAX_CLIENT_ID_LEN - USER_AGENT_PREFIX_LEN - 1;

/// Rate-limit key for one client: network address plus a user-agent prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Derive the key from the peer address and the raw `User-Agent` header.
    /// Both parts are truncated, so the result always passes [`Self::validate`].
    pub fn derive(address: &str, user_agent: Option<&str>) -> Self {
        let address = prefix(address, ADDRESS_PREFIX_LEN);
        let agent = prefix(user_agent.unwrap_or_default(), USER_AGENT_PREFIX_LEN);

        Self(format!("{address}:{agent}"))
    }

    /// A valid key is non-blank and at most [`MAX_CLIENT_ID_LEN`] characters.
    pub fn validate(raw: &str) -> Result<(), DomainError> {
        if raw.trim().is_empty() {
            return Err(DomainError::InvalidClientId("empty".to_string()));
        }
        let len = raw.chars().count();
        if len > MAX_CLIENT_ID_LEN {
            return Err(DomainError::InvalidClientId(format!(
                "{len} characters exceeds {MAX_CLIENT_ID_LEN}"
            )));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn prefix(raw: &str, len: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "unknown".to_string();
    }
    trimmed.chars().take(len).collect()
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
