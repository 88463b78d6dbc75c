// Domain models for provisioning application documents.
// Nothing in here does I/O; names, placeholders and URLs are all pure
// functions of their inputs so they can be tested without a network.

use super::document_api::ProvisionError;
use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_AUTHOR: &str = "Barrett Smith";
pub const DEFAULT_RESUME_TEMPLATE_ID: &str = "1aZAY2BK0lA7cDR7V6u1UG7__xsC1d_5sigXj9PO1-yc";
pub const DEFAULT_COVER_LETTER_TEMPLATE_ID: &str = "1fo-3MXG_Nitq1T5WQV-FHN1ePp2rVGBrZSYNWI_L6x4";

/// Drive scope for copying files, Documents scope for editing them.
pub const DEFAULT_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/documents",
];

pub const TITLE_MARKER: &str = "{{title}}";
pub const COMPANY_MARKER: &str = "{{company_name}}";
pub const DATE_MARKER: &str = "{{date}}";

/// The two kinds of document a run can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Resume,
    CoverLetter,
}

impl DocumentKind {
    pub fn tag(self) -> &'static str {
        match self {
            DocumentKind::Resume => "resume",
            DocumentKind::CoverLetter => "cover_letter",
        }
    }

    /// Human readable label used inside document names.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Resume => "Resume",
            DocumentKind::CoverLetter => "Cover Letter",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentKind {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resume" => Ok(DocumentKind::Resume),
            "cover_letter" => Ok(DocumentKind::CoverLetter),
            other => Err(ProvisionError::InvalidArgument(format!(
                "Document kind must be one of resume or cover_letter. Got {}",
                other
            ))),
        }
    }
}

/// A document created by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReference {
    pub id: String,
    pub name: String,
}

impl DocumentReference {
    pub fn edit_url(&self) -> String {
        document_url(&self.id)
    }
}

/// One literal find/replace instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub marker: String,
    pub value: String,
}

impl Replacement {
    pub fn new(marker: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            value: value.into(),
        }
    }
}

/// Outcome of a substitution batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionResult {
    pub document_id: String,
    /// Occurrences changed per replacement, in request order.
    pub occurrences_changed: Vec<u32>,
}

impl SubstitutionResult {
    pub fn total_changed(&self) -> u32 {
        self.occurrences_changed.iter().sum()
    }
}

/// Startup configuration for the workflow. Built once in `main`, never global.
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    pub author: String,
    pub resume_template_id: String,
    pub cover_letter_template_id: String,
    pub scopes: Vec<String>,
    pub token_path: PathBuf,
    pub credentials_path: PathBuf,
}

impl ProvisioningConfig {
    pub fn template_id(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::Resume => &self.resume_template_id,
            DocumentKind::CoverLetter => &self.cover_letter_template_id,
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            resume_template_id: DEFAULT_RESUME_TEMPLATE_ID.to_string(),
            cover_letter_template_id: DEFAULT_COVER_LETTER_TEMPLATE_ID.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            token_path: PathBuf::from("token.json"),
            credentials_path: PathBuf::from("credentials.json"),
        }
    }
}

/// What the user asked for on this invocation.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    pub company_name: String,
    pub role_name: String,
    pub include_cover_letter: bool,
    /// The date written into `{{date}}` placeholders.
    pub date: NaiveDate,
}

impl ProvisioningRequest {
    pub fn new(
        company_name: impl Into<String>,
        role_name: impl Into<String>,
        include_cover_letter: bool,
        date: NaiveDate,
    ) -> Result<Self, ProvisionError> {
        let company_name = company_name.into();
        let role_name = role_name.into();

        if company_name.trim().is_empty() {
            return Err(ProvisionError::InvalidArgument(
                "Company name must not be empty".to_string(),
            ));
        }
        if role_name.trim().is_empty() {
            return Err(ProvisionError::InvalidArgument(
                "Role name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            company_name,
            role_name,
            include_cover_letter,
            date,
        })
    }

    /// Documents to produce, in order. The resume always comes first.
    pub fn kinds(&self) -> Vec<DocumentKind> {
        if self.include_cover_letter {
            vec![DocumentKind::Resume, DocumentKind::CoverLetter]
        } else {
            vec![DocumentKind::Resume]
        }
    }

    pub fn replacements(&self) -> Vec<Replacement> {
        placeholder_replacements(&self.company_name, &self.role_name, self.date)
    }
}

/// Formats `"<Author> - <Kind Label> - <company> - <role>"`. Inputs are inserted verbatim,
/// so a company or role containing `" - "` can produce the same name as another pair.
pub fn format_document_name(
    author: &str,
    kind: DocumentKind,
    company_name: &str,
    role_name: &str,
) -> String {
    format!(
        "{} - {} - {} - {}",
        author,
        kind.label(),
        company_name,
        role_name
    )
}

/// String-tagged variant of [`format_document_name`]; unknown tags are rejected.
pub fn build_document_name(
    author: &str,
    kind: &str,
    company_name: &str,
    role_name: &str,
) -> Result<String, ProvisionError> {
    let kind: DocumentKind = kind.parse()?;
    Ok(format_document_name(author, kind, company_name, role_name))
}

/// The placeholders every template understands, in the order they are sent.
pub fn placeholder_replacements(
    company_name: &str,
    role_name: &str,
    date: NaiveDate,
) -> Vec<Replacement> {
    vec![
        Replacement::new(TITLE_MARKER, role_name),
        Replacement::new(COMPANY_MARKER, company_name),
        Replacement::new(DATE_MARKER, date.format("%Y-%m-%d").to_string()),
    ]
}

pub fn document_url(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit", document_id)
}

/// Extracts the document ID from a Google Docs URL, or accepts a bare ID.
pub fn extract_doc_id(url_or_id: &str) -> Option<String> {
    let url_or_id = url_or_id.trim();
    if url_or_id.contains("docs.google.com") {
        if let Some(start) = url_or_id.find("/document/d/") {
            let after_d = &url_or_id[start + 12..];
            let end = after_d.find('/').unwrap_or(after_d.len());
            let id = &after_d[..end];
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
    } else if !url_or_id.is_empty() && !url_or_id.contains('/') && !url_or_id.contains(' ') {
        return Some(url_or_id.to_string());
    }
    None
}
