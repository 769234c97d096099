// Password verification for protected QR codes

use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

use crate::db::RedirectStore;
use crate::services::jwt::JwtService;
use crate::utils::password::verify_access_password;

#[derive(Error, Debug)]
pub enum PasswordGateError {
    /// Unknown slug, or a code without a password
    #[error("QR code not found")]
    NotFound,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone)]
pub struct PasswordGateService {
    store: Arc<dyn RedirectStore>,
    jwt: Arc<JwtService>,
}

impl PasswordGateService {
    pub fn new(store: Arc<dyn RedirectStore>, jwt: Arc<JwtService>) -> Self {
        Self { store, jwt }
    }

    /// Check `password` for `slug` and return a signed verification token on success
    #[instrument(skip(self, password))]
    pub async fn verify(&self, slug: &str, password: &str) -> Result<String, PasswordGateError> {
        let target = self
            .store
            .find_by_slug(slug)
            .await
            .map_err(|e| PasswordGateError::Internal(e.to_string()))?
            .ok_or(PasswordGateError::NotFound)?;

        let hash = match target.qr.access_password {
            Some(hash) if !hash.is_empty() => hash,
            _ => return Err(PasswordGateError::NotFound),
        };

        // Hashing is CPU bound; keep it off the async workers
        let candidate = password.to_string();
        let matches = tokio::task::spawn_blocking(move || verify_access_password(&candidate, &hash))
            .await
            .map_err(|e| PasswordGateError::Internal(e.to_string()))?
            .map_err(|e| {
                tracing::error!("Stored access password for {} is unusable: {}", slug, e);
                PasswordGateError::Internal(e.to_string())
            })?;

        if !matches {
            tracing::info!("Wrong password attempt for {}", slug);
            return Err(PasswordGateError::WrongPassword);
        }

        self.jwt
            .issue_slug_access_token(slug)
            .map_err(|e| PasswordGateError::Internal(e.to_string()))
    }
}
