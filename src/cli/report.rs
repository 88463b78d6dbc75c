use crate::core::provisioning::{DocumentKind, ProvisioningReport, WorkflowFailure};

fn describe(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Resume => "resume",
        DocumentKind::CoverLetter => "cover letter",
    }
}

/// One line per provisioned document, in creation order.
pub fn report_lines(report: &ProvisioningReport) -> Vec<String> {
    report
        .documents
        .iter()
        .map(|doc| format!("The new {} is: {}", describe(doc.kind), doc.url()))
        .collect()
}

/// Documents a failed run left behind, so the user can finish or delete them.
pub fn leftover_lines(failure: &WorkflowFailure) -> Vec<String> {
    failure
        .created
        .iter()
        .map(|doc| format!("Left in place: {} ({})", doc.name, doc.edit_url()))
        .collect()
}

pub fn print_report(report: &ProvisioningReport) {
    for doc in &report.documents {
        tracing::debug!(
            "{} placeholder occurrence(s) filled in {}",
            doc.substitution.total_changed(),
            doc.reference.name
        );
    }
    for line in report_lines(report) {
        println!("{}", line);
    }
}

pub fn print_leftovers(failure: &WorkflowFailure) {
    for line in leftover_lines(failure) {
        eprintln!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provisioning::{
        DocumentReference, ProvisionError, ProvisionedDocument, SubstitutionResult, WorkflowStage,
    };

    fn doc(kind: DocumentKind, id: &str) -> ProvisionedDocument {
        ProvisionedDocument {
            kind,
            reference: DocumentReference {
                id: id.to_string(),
                name: format!("doc {}", id),
            },
            substitution: SubstitutionResult::default(),
        }
    }

    #[test]
    fn prints_one_url_per_document() {
        let report = ProvisioningReport {
            documents: vec![doc(DocumentKind::Resume, "R1"), doc(DocumentKind::CoverLetter, "C1")],
        };

        assert_eq!(
            report_lines(&report),
            vec![
                "The new resume is: https://docs.google.com/document/d/R1/edit".to_string(),
                "The new cover letter is: https://docs.google.com/document/d/C1/edit".to_string(),
            ]
        );
    }

    #[test]
    fn failure_lists_documents_left_behind() {
        let failure = WorkflowFailure {
            stage: WorkflowStage::ResumeCloned,
            created: vec![DocumentReference {
                id: "R1".to_string(),
                name: "Barrett Smith - Resume - Acme - Engineer".to_string(),
            }],
            source: ProvisionError::RemoteService("500".to_string()),
        };

        let lines = leftover_lines(&failure);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Barrett Smith - Resume - Acme - Engineer"));
        assert!(lines[0].ends_with("/document/d/R1/edit)"));
    }
}
