// =============================================================================
// GOOGLE MODULE
// =============================================================================
//
// Integration with Google Drive and Google Docs for the provisioner.
//
// **Architecture:**
// This module lives in the infra layer because it handles external I/O
// (HTTP requests to Google APIs, the token cache on disk, the browser
// login). The core layer only knows about credentials and documents - it
// doesn't care where they come from.
//
// - `google_docs_client.rs` copies templates and fills placeholders.
// - `oauth_client.rs` refreshes tokens and runs the installed-app login.
// - `token_store.rs` persists the credential cache as JSON.

pub mod google_docs_client;
pub mod oauth_client;
pub mod token_store;

pub use google_docs_client::GoogleDocsClient;
pub use oauth_client::GoogleOAuthClient;
pub use token_store::JsonTokenStore;
