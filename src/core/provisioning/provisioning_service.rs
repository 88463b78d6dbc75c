// The provisioning workflow.
//
// START -> AUTHENTICATED -> RESUME_CLONED -> RESUME_SUBSTITUTED
//       -> (COVER_LETTER_CLONED -> COVER_LETTER_SUBSTITUTED)? -> DONE
//
// Any failure stops the run. Documents already cloned stay where they are;
// the failure carries them so the caller can tell the user what to clean up.

use super::document_api::{DocumentApi, ProvisionError};
use super::document_models::{
    DocumentKind, DocumentReference, ProvisioningConfig, ProvisioningRequest, Replacement,
    SubstitutionResult,
};
use crate::core::auth::{Credential, CredentialSource};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Start,
    Authenticated,
    ResumeCloned,
    ResumeSubstituted,
    CoverLetterCloned,
    CoverLetterSubstituted,
    Done,
}

impl WorkflowStage {
    fn cloned(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Resume => WorkflowStage::ResumeCloned,
            DocumentKind::CoverLetter => WorkflowStage::CoverLetterCloned,
        }
    }

    fn substituted(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Resume => WorkflowStage::ResumeSubstituted,
            DocumentKind::CoverLetter => WorkflowStage::CoverLetterSubstituted,
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Start => "start",
            WorkflowStage::Authenticated => "authenticated",
            WorkflowStage::ResumeCloned => "resume cloned",
            WorkflowStage::ResumeSubstituted => "resume substituted",
            WorkflowStage::CoverLetterCloned => "cover letter cloned",
            WorkflowStage::CoverLetterSubstituted => "cover letter substituted",
            WorkflowStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A run that stopped early. `stage` is the last stage that completed.
#[derive(Debug, Error)]
#[error("Provisioning stopped after step '{stage}'")]
pub struct WorkflowFailure {
    pub stage: WorkflowStage,
    /// Documents that were cloned before the failure and were not rolled back.
    pub created: Vec<DocumentReference>,
    pub source: ProvisionError,
}

#[derive(Debug, Clone)]
pub struct ProvisionedDocument {
    pub kind: DocumentKind,
    pub reference: DocumentReference,
    pub substitution: SubstitutionResult,
}

impl ProvisionedDocument {
    pub fn url(&self) -> String {
        self.reference.edit_url()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProvisioningReport {
    pub documents: Vec<ProvisionedDocument>,
}

/// Progress bookkeeping for a single run.
struct WorkflowRun {
    stage: WorkflowStage,
    created: Vec<DocumentReference>,
}

impl WorkflowRun {
    fn new() -> Self {
        Self {
            stage: WorkflowStage::Start,
            created: Vec::new(),
        }
    }

    fn advance(&mut self, stage: WorkflowStage) {
        tracing::debug!("Workflow stage: {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    fn fail(&self, source: ProvisionError) -> WorkflowFailure {
        WorkflowFailure {
            stage: self.stage,
            created: self.created.clone(),
            source,
        }
    }
}

pub struct ProvisioningService<C: CredentialSource, D: DocumentApi> {
    credentials: C,
    documents: D,
    config: ProvisioningConfig,
}

impl<C: CredentialSource, D: DocumentApi> ProvisioningService<C, D> {
    pub fn new(credentials: C, documents: D, config: ProvisioningConfig) -> Self {
        Self {
            credentials,
            documents,
            config,
        }
    }

    /// Builds the display name for a cloned document from its string tag.
    pub fn build_document_name(
        &self,
        kind: &str,
        company_name: &str,
        role_name: &str,
    ) -> Result<String, ProvisionError> {
        super::document_models::build_document_name(
            &self.config.author,
            kind,
            company_name,
            role_name,
        )
    }

    pub async fn provision(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<ProvisioningReport, WorkflowFailure> {
        let mut run = WorkflowRun::new();

        let credential = self
            .credentials
            .obtain_credential(&self.config.token_path, &self.config.credentials_path)
            .await
            .map_err(|e| run.fail(e.into()))?;
        run.advance(WorkflowStage::Authenticated);

        let replacements = request.replacements();
        let mut report = ProvisioningReport::default();

        for kind in request.kinds() {
            let document = self
                .provision_document(&mut run, &credential, kind, request, &replacements)
                .await?;
            report.documents.push(document);
        }

        run.advance(WorkflowStage::Done);
        tracing::info!(
            "Provisioned {} document(s) for {} at {}",
            report.documents.len(),
            request.role_name,
            request.company_name
        );

        Ok(report)
    }

    async fn provision_document(
        &self,
        run: &mut WorkflowRun,
        credential: &Credential,
        kind: DocumentKind,
        request: &ProvisioningRequest,
        replacements: &[Replacement],
    ) -> Result<ProvisionedDocument, WorkflowFailure> {
        let name = self
            .build_document_name(kind.tag(), &request.company_name, &request.role_name)
            .map_err(|e| run.fail(e))?;
        let template_id = self.config.template_id(kind);

        tracing::info!("Cloning {} template into '{}'", kind.tag(), name);
        let reference = self
            .documents
            .clone_document(credential, template_id, &name)
            .await
            .map_err(|e| run.fail(e))?;
        run.created.push(reference.clone());
        run.advance(WorkflowStage::cloned(kind));

        let substitution = self
            .documents
            .substitute_placeholders(credential, &reference.id, replacements)
            .await
            .map_err(|e| run.fail(e))?;
        run.advance(WorkflowStage::substituted(kind));

        tracing::info!(
            "Filled {} placeholder occurrence(s) in {}",
            substitution.total_changed(),
            substitution.document_id
        );

        Ok(ProvisionedDocument {
            kind,
            reference,
            substitution,
        })
    }
}
