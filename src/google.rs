use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Claims extracted from a verified Google ID token.
#[derive(Debug, Clone)]
pub struct GoogleIdentity {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Third-party identity seam. Production verifies against Google; tests
/// substitute a static verifier.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify_id_token(&self, id_token: &str) -> Result<GoogleIdentity, AppError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// Verifies ID tokens through Google's tokeninfo endpoint, which checks the
/// signature and expiry server-side; the audience is checked here against the
/// configured client id.
pub struct GoogleTokenVerifier {
    http: reqwest::Client,
    client_id: String,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
        }
    }
}

#[async_trait]
impl IdentityVerifier for GoogleTokenVerifier {
    async fn verify_id_token(&self, id_token: &str) -> Result<GoogleIdentity, AppError> {
        let response = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "tokeninfo request failed");
                AppError::InvalidIdToken
            })?;

        if !response.status().is_success() {
            return Err(AppError::InvalidIdToken);
        }

        let info: TokenInfo = response.json().await.map_err(|_| AppError::InvalidIdToken)?;
        if info.aud != self.client_id {
            warn!(aud = %info.aud, "google token minted for a different client");
            return Err(AppError::InvalidIdToken);
        }

        Ok(GoogleIdentity {
            sub: info.sub,
            email: info.email,
            name: info.name,
            picture: info.picture,
        })
    }
}
