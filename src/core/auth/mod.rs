pub mod auth_models;
pub mod auth_service;

pub use auth_models::{Credential, TokenGrant};
pub use auth_service::{
    AuthError, CredentialProvider, CredentialSource, CredentialStore, InteractiveAuthorizer,
    TokenRefresher,
};
