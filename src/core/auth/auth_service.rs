// Credential acquisition for the Google APIs.
//
// The service only decides *which* path to take (reuse, refresh, log in).
// Reading the cache, talking to the token endpoint and driving the browser
// login are all behind traits so the infra layer can plug in the real thing
// and tests can plug in fakes.

use super::auth_models::Credential;
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Credential cache error: {0}")]
    Store(String),
    #[error("Invalid client secrets file: {0}")]
    ClientSecrets(String),
    #[error("Token refresh failed: {0}")]
    Refresh(String),
    #[error("Authorization failed: {0}")]
    Authorization(String),
}

/// Persists the credential cache between runs.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns `Ok(None)` when nothing has been cached yet.
    async fn load(&self, path: &Path) -> Result<Option<Credential>, AuthError>;
    async fn save(&self, path: &Path, credential: &Credential) -> Result<(), AuthError>;
}

/// Exchanges a refresh token for a fresh access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError>;
}

/// Obtains a brand-new credential by asking the user to log in.
#[async_trait]
pub trait InteractiveAuthorizer: Send + Sync {
    async fn authorize(
        &self,
        credentials_path: &Path,
        scopes: &[String],
    ) -> Result<Credential, AuthError>;
}

/// Anything that can hand the workflow a usable credential.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn obtain_credential(
        &self,
        token_path: &Path,
        credentials_path: &Path,
    ) -> Result<Credential, AuthError>;
}

pub struct CredentialProvider<S, R, A> {
    store: S,
    refresher: R,
    authorizer: A,
    scopes: Vec<String>,
}

impl<S, R, A> CredentialProvider<S, R, A>
where
    S: CredentialStore,
    R: TokenRefresher,
    A: InteractiveAuthorizer,
{
    pub fn new(store: S, refresher: R, authorizer: A, scopes: Vec<String>) -> Self {
        Self {
            store,
            refresher,
            authorizer,
            scopes,
        }
    }

    async fn load_cached(&self, token_path: &Path) -> Option<Credential> {
        match self.store.load(token_path).await {
            Ok(cached) => cached,
            Err(e) => {
                // A corrupt cache is not fatal, the user can simply log in again
                tracing::warn!("Ignoring unreadable credential cache {}: {}", token_path.display(), e);
                None
            }
        }
    }
}

#[async_trait]
impl<S, R, A> CredentialSource for CredentialProvider<S, R, A>
where
    S: CredentialStore,
    R: TokenRefresher,
    A: InteractiveAuthorizer,
{
    async fn obtain_credential(
        &self,
        token_path: &Path,
        credentials_path: &Path,
    ) -> Result<Credential, AuthError> {
        if let Some(cached) = self.load_cached(token_path).await {
            if cached.is_valid_at(Utc::now(), &self.scopes) {
                tracing::debug!("Using cached credential from {}", token_path.display());
                return Ok(cached);
            }

            // Refreshing cannot widen the granted scopes, so a scope change needs a new login
            if cached.refresh_token.is_some() && cached.has_scopes(&self.scopes) {
                match self.refresher.refresh(&cached).await {
                    Ok(refreshed) => {
                        self.store.save(token_path, &refreshed).await?;
                        tracing::info!("Refreshed expired access token");
                        return Ok(refreshed);
                    }
                    Err(e) => {
                        tracing::warn!("Token refresh failed, falling back to login: {}", e);
                    }
                }
            } else if !cached.has_scopes(&self.scopes) {
                tracing::info!("Cached credential lacks required scopes; re-authorizing");
            }
        }

        tracing::info!("Starting interactive authorization");
        let credential = self
            .authorizer
            .authorize(credentials_path, &self.scopes)
            .await?;
        self.store.save(token_path, &credential).await?;
        tracing::info!("Saved new credential to {}", token_path.display());

        Ok(credential)
    }
}
