use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokens this close to expiry are treated as already expired.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// An OAuth2 user credential.
///
/// The serialized form uses the same keys as Google's "authorized user"
/// JSON, so a cache written by other Google tooling loads as-is.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "token")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// `None` means the expiry is unknown; such tokens are used until the API rejects them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= now + Duration::seconds(EXPIRY_MARGIN_SECS),
            None => false,
        }
    }

    /// True when every required scope was granted to this credential.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>, required: &[String]) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(now) && self.has_scopes(required)
    }

    /// Merges a refresh-grant response into this credential.
    ///
    /// Google usually does not rotate the refresh token, so the existing one
    /// is kept unless the grant carries a new value.
    pub fn refreshed(&self, grant: TokenGrant, now: DateTime<Utc>) -> Self {
        let mut credential = self.clone();
        credential.expiry = grant.expiry_from(now);
        credential.access_token = grant.access_token;
        if let Some(refresh_token) = grant.refresh_token {
            credential.refresh_token = Some(refresh_token);
        }
        if let Some(scope) = grant.scope {
            credential.scopes = split_scopes(&scope);
        }
        credential
    }
}

// Tokens never end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Response from Google's token endpoint, for both the authorization-code
/// and the refresh-token grants.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Space-separated list of granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenGrant {
    pub fn expiry_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in.map(|secs| now + Duration::seconds(secs))
    }
}

pub fn split_scopes(scope: &str) -> Vec<String> {
    scope.split_whitespace().map(str::to_string).collect()
}
