use chrono::NaiveDate;
use clap::Parser;

use crate::core::provisioning::{ProvisionError, ProvisioningRequest};

/// Copy the resume and cover letter templates for a job application.
#[derive(Debug, Parser)]
#[command(name = "resume_provisioner", version)]
pub struct CliArgs {
    /// The company name to be added to the title of the new files.
    pub company_name: String,

    /// The role name to be added to the title of the new files.
    pub role_name: String,

    /// Only create the resume
    #[arg(long)]
    pub no_cover_letter: bool,
}

impl CliArgs {
    /// Converts the parsed arguments into a workflow request dated `today`.
    pub fn into_request(self, today: NaiveDate) -> Result<ProvisioningRequest, ProvisionError> {
        ProvisioningRequest::new(
            self.company_name,
            self.role_name,
            !self.no_cover_letter,
            today,
        )
    }
}
