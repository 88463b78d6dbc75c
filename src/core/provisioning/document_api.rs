use super::document_models::{DocumentReference, Replacement, SubstitutionResult};
use crate::core::auth::{AuthError, Credential};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Authentication failed")]
    Authentication(#[from] AuthError),
    #[error("Remote service error: {0}")]
    RemoteService(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// The remote storage/editing service the workflow drives.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Copies `source_document_id` into a new document called `new_name`.
    async fn clone_document(
        &self,
        credential: &Credential,
        source_document_id: &str,
        new_name: &str,
    ) -> Result<DocumentReference, ProvisionError>;

    /// Applies every replacement, in order, as one batch. A rejected batch is a single error.
    async fn substitute_placeholders(
        &self,
        credential: &Credential,
        document_id: &str,
        replacements: &[Replacement],
    ) -> Result<SubstitutionResult, ProvisionError>;
}
