use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::core::auth::{AuthError, Credential, CredentialStore};

/// Simple JSON file store for the OAuth credential cache.
pub struct JsonTokenStore;

impl JsonTokenStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for JsonTokenStore {
    async fn load(&self, path: &Path) -> Result<Option<Credential>, AuthError> {
        if !path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(path)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        let credential: Credential =
            serde_json::from_str(&text).map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(Some(credential))
    }

    async fn save(&self, path: &Path, credential: &Credential) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AuthError::Store(e.to_string()))?;
            }
        }

        let text = serde_json::to_string_pretty(credential)
            .map_err(|e| AuthError::Store(e.to_string()))?;
        fs::write(path, text)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn credential() -> Credential {
        Credential {
            access_token: "ya29.token".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            token_uri: Some("https://oauth2.googleapis.com/token".to_string()),
            client_id: Some("client".to_string()),
            client_secret: Some("secret".to_string()),
            scopes: vec!["https://www.googleapis.com/auth/drive".to_string()],
            expiry: Some(Utc.with_ymd_and_hms(2030, 5, 1, 8, 0, 0).unwrap()),
        }
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTokenStore::new();

        let loaded = store.load(&dir.path().join("token.json")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn saved_credential_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");
        let store = JsonTokenStore::new();

        store.save(&path, &credential()).await.unwrap();
        let loaded = store.load(&path).await.unwrap();

        assert_eq!(loaded, Some(credential()));
    }

    #[tokio::test]
    async fn file_uses_google_token_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        JsonTokenStore::new().save(&path, &credential()).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["token"], "ya29.token");
        assert_eq!(raw["refresh_token"], "1//refresh");
    }

    #[tokio::test]
    async fn malformed_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonTokenStore::new().load(&path).await.unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
    }
}
