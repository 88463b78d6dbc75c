pub mod document_api;
pub mod document_models;
pub mod provisioning_service;

pub use document_api::{DocumentApi, ProvisionError};
pub use document_models::{
    DocumentKind, DocumentReference, ProvisioningConfig, ProvisioningRequest, Replacement,
    SubstitutionResult,
};
pub use provisioning_service::{
    ProvisionedDocument, ProvisioningReport, ProvisioningService, WorkflowFailure, WorkflowStage,
};
