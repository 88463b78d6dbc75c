// =============================================================================
// GOOGLE OAUTH2 CLIENT (INSTALLED APP FLOW)
// =============================================================================
//
// Implements the two token-endpoint interactions the credential provider
// needs:
//
// 1. **Refresh grant**: swap a stored refresh token for a new access token.
// 2. **Installed app flow**: open the consent page in the browser, receive the
//    authorization code on a loopback listener, exchange it for tokens.
//
// **Setup Instructions:**
//
// 1. Go to Google Cloud Console: https://console.cloud.google.com/
// 2. Enable the Google Drive API and the Google Docs API
// 3. "APIs & Services" > "Credentials" > "Create Credentials" >
//    "OAuth client ID" > "Desktop app"
// 4. Download the JSON and save it as `credentials.json` (or point
//    `GOOGLE_CREDENTIALS_PATH` at it)
//
// The first run opens a browser window; the resulting tokens are cached in
// `token.json` (`GOOGLE_TOKEN_PATH`) and reused afterwards.

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use rand::Rng;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::core::auth::auth_models::split_scopes;
use crate::core::auth::{AuthError, Credential, InteractiveAuthorizer, TokenGrant, TokenRefresher};

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// How long the user gets to finish the consent screen.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const SUCCESS_PAGE: &str = "<html><body><h3>Authorization complete.</h3>\
    <p>You may close this window and return to the terminal.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h3>Authorization failed.</h3>\
    <p>Check the terminal for details.</p></body></html>";

// =============================================================================
// CLIENT SECRETS
// =============================================================================

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth client registration, as downloaded from the Cloud Console.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// Desktop clients are wrapped in `installed`, web clients in `web`.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<OAuthClientConfig>,
    web: Option<OAuthClientConfig>,
}

impl OAuthClientConfig {
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let file: ClientSecretsFile =
            serde_json::from_str(json).map_err(|e| AuthError::ClientSecrets(e.to_string()))?;

        file.installed.or(file.web).ok_or_else(|| {
            AuthError::ClientSecrets(
                "expected an \"installed\" or \"web\" client section".to_string(),
            )
        })
    }

    pub async fn from_file(path: &Path) -> Result<Self, AuthError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AuthError::ClientSecrets(format!("could not read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Builds the consent page URL. `access_type=offline` asks for a refresh token.
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> Result<Url, AuthError> {
        let scope = scopes.join(" ");
        Url::parse_with_params(
            &self.auth_uri,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", scope.as_str()),
                ("state", state),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AuthError::ClientSecrets(format!("invalid auth_uri: {}", e)))
    }
}

// =============================================================================
// LOOPBACK CALLBACK
// =============================================================================

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCallback {
    pub code: String,
    pub state: Option<String>,
}

/// Interprets the query string of a redirect to `/`.
///
/// Returns `Ok(None)` when neither `code` nor `error` is present.
pub fn callback_from_query(
    params: &HashMap<String, String>,
) -> Result<Option<AuthorizationCallback>, AuthError> {
    if let Some(error) = params.get("error") {
        return Err(AuthError::Authorization(format!(
            "consent was not granted: {}",
            error
        )));
    }

    Ok(params.get("code").map(|code| AuthorizationCallback {
        code: code.clone(),
        state: params.get("state").cloned(),
    }))
}

type CallbackResult = Result<AuthorizationCallback, AuthError>;

/// Taken by the first request that carries a code or an error.
type CallbackSender = Arc<Mutex<Option<oneshot::Sender<CallbackResult>>>>;

async fn handle_redirect(
    State(sender): State<CallbackSender>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<&'static str>) {
    let outcome = match callback_from_query(&params) {
        Ok(Some(callback)) => Ok(callback),
        Ok(None) => return (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE)),
        Err(e) => Err(e),
    };

    let page = if outcome.is_ok() {
        SUCCESS_PAGE
    } else {
        FAILURE_PAGE
    };

    let pending = sender.lock().ok().and_then(|mut slot| slot.take());
    match pending {
        Some(tx) => {
            let _ = tx.send(outcome);
        }
        None => tracing::debug!("Ignoring repeated OAuth redirect"),
    }

    (StatusCode::OK, Html(page))
}

/// Serves the loopback redirect until one request carries a code or an error.
///
/// The server shuts down once this future completes or is dropped.
pub async fn wait_for_callback(listener: TcpListener) -> Result<AuthorizationCallback, AuthError> {
    let (callback_tx, callback_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let app = Router::new()
        .route("/", get(handle_redirect))
        .with_state(Arc::new(Mutex::new(Some(callback_tx))));

    tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            // Also fires when the sender is dropped, e.g. on timeout
            let _ = shutdown_rx.await;
        });
        if let Err(e) = server.await {
            tracing::warn!("OAuth callback server failed: {}", e);
        }
    });

    let outcome = callback_rx.await.map_err(|_| {
        AuthError::Authorization("callback server stopped before the redirect".to_string())
    });
    let _ = shutdown_tx.send(());

    outcome?
}

fn random_state() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

// =============================================================================
// TOKEN ENDPOINT CLIENT
// =============================================================================

pub struct GoogleOAuthClient {
    client: Client,
    open_browser: bool,
}

impl GoogleOAuthClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            open_browser: true,
        }
    }

    /// Only print the consent URL instead of launching a browser.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    async fn request_token(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenGrant, String> {
        let response = self
            .client
            .post(token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(format!("token endpoint returned {}: {}", status, text));
        }

        response.json().await.map_err(|e| e.to_string())
    }
}

impl Default for GoogleOAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenRefresher for GoogleOAuthClient {
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let missing = |field: &str| AuthError::Refresh(format!("cached credential has no {}", field));
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| missing("refresh_token"))?;
        let client_id = credential
            .client_id
            .as_deref()
            .ok_or_else(|| missing("client_id"))?;
        let client_secret = credential
            .client_secret
            .as_deref()
            .ok_or_else(|| missing("client_secret"))?;
        let token_uri = credential.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);

        tracing::debug!("Refreshing access token via {}", token_uri);

        let grant = self
            .request_token(
                token_uri,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                    ("client_id", client_id),
                    ("client_secret", client_secret),
                ],
            )
            .await
            .map_err(AuthError::Refresh)?;

        Ok(credential.refreshed(grant, Utc::now()))
    }
}

#[async_trait]
impl InteractiveAuthorizer for GoogleOAuthClient {
    async fn authorize(
        &self,
        credentials_path: &Path,
        scopes: &[String],
    ) -> Result<Credential, AuthError> {
        let client_config = OAuthClientConfig::from_file(credentials_path).await?;

        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| AuthError::Authorization(format!("cannot bind loopback: {}", e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::Authorization(e.to_string()))?
            .port();
        let redirect_uri = format!("http://127.0.0.1:{}/", port);

        let state = random_state();
        let url = client_config.authorization_url(&redirect_uri, scopes, &state)?;

        eprintln!(
            "Please visit this URL to authorize this application: {}",
            url
        );
        if self.open_browser {
            if let Err(e) = webbrowser::open(url.as_str()) {
                tracing::warn!("Could not open a browser: {}", e);
            }
        }

        let callback = tokio::time::timeout(CALLBACK_TIMEOUT, wait_for_callback(listener))
            .await
            .map_err(|_| {
                AuthError::Authorization("timed out waiting for the browser redirect".to_string())
            })??;

        if callback.state.as_deref() != Some(state.as_str()) {
            return Err(AuthError::Authorization(
                "state parameter mismatch in redirect".to_string(),
            ));
        }

        let grant = self
            .request_token(
                &client_config.token_uri,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", callback.code.as_str()),
                    ("client_id", client_config.client_id.as_str()),
                    ("client_secret", client_config.client_secret.as_str()),
                    ("redirect_uri", redirect_uri.as_str()),
                ],
            )
            .await
            .map_err(AuthError::Authorization)?;

        let expiry = grant.expiry_from(Utc::now());
        let granted = grant
            .scope
            .as_deref()
            .map(split_scopes)
            .unwrap_or_else(|| scopes.to_vec());

        tracing::info!("Authorization completed for client {}", client_config.client_id);

        Ok(Credential {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            token_uri: Some(client_config.token_uri),
            client_id: Some(client_config.client_id),
            client_secret: Some(client_config.client_secret),
            scopes: granted,
            expiry,
        })
    }
}
