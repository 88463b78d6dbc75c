// This is the entry point of the resume provisioner.
//
// **Architecture Overview:**
// - `core/` = Business logic (credential decisions, naming, the workflow)
// - `infra/` = Implementations of core traits (Google APIs, token cache)
// - `cli/` = Command-line adapter (arguments in, URLs out)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run the workflow once and turn the outcome into an exit code

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "cli/cli_layer.rs"]
mod cli;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::report;
use crate::cli::CliArgs;
use crate::core::auth::CredentialProvider;
use crate::core::provisioning::document_models::extract_doc_id;
use crate::core::provisioning::{ProvisioningConfig, ProvisioningService};
use crate::infra::google::{GoogleDocsClient, GoogleOAuthClient, JsonTokenStore};

/// Reads an optional environment variable, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Template IDs may be given as bare IDs or as full Google Docs URLs.
fn template_id_from_env(name: &str, default: String) -> anyhow::Result<String> {
    match env_var(name) {
        Some(value) => extract_doc_id(&value)
            .with_context(|| format!("{} is not a Google Docs ID or URL: {}", name, value)),
        None => Ok(default),
    }
}

fn load_config() -> anyhow::Result<ProvisioningConfig> {
    let defaults = ProvisioningConfig::default();

    Ok(ProvisioningConfig {
        author: env_var("DOCUMENT_AUTHOR").unwrap_or(defaults.author),
        resume_template_id: template_id_from_env(
            "RESUME_TEMPLATE_ID",
            defaults.resume_template_id,
        )?,
        cover_letter_template_id: template_id_from_env(
            "COVER_LETTER_TEMPLATE_ID",
            defaults.cover_letter_template_id,
        )?,
        scopes: defaults.scopes,
        token_path: env_var("GOOGLE_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.token_path),
        credentials_path: env_var("GOOGLE_CREDENTIALS_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.credentials_path),
    })
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let request = args.into_request(chrono::Local::now().date_naive())?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let oauth_refresher = GoogleOAuthClient::new();
    let mut oauth_login = GoogleOAuthClient::new();
    if env_var("GOOGLE_OAUTH_NO_BROWSER").is_some() {
        oauth_login = oauth_login.without_browser();
    }

    let credentials = CredentialProvider::new(
        JsonTokenStore::new(),
        oauth_refresher,
        oauth_login,
        config.scopes.clone(),
    );
    let service = ProvisioningService::new(credentials, GoogleDocsClient::new(), config);

    match service.provision(&request).await {
        Ok(result) => {
            report::print_report(&result);
            Ok(())
        }
        Err(failure) => {
            report::print_leftovers(&failure);
            Err(failure.into())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file (if it exists) before the
    // log filter reads RUST_LOG
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout only carries the document URLs
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Provisioning failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
