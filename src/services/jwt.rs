// HS256 token handling
// Dashboard bearer tokens are issued by the auth provider and only validated here.
// Slug tokens are issued here: the password verification cookie and the short-lived
// view pass a resolved scan carries to its landing page.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

use crate::app_config::AppConfig;
use crate::models::UserRole;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    EncodingError(String),

    #[error("Clock error: {0}")]
    ClockError(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token issued for a different QR code")]
    SlugMismatch,

    #[error("Token issued for a different purpose")]
    ScopeMismatch,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => JwtError::InvalidToken,
            _ => JwtError::EncodingError(err.to_string()),
        }
    }
}

/// Claims carried by dashboard bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
    pub aud: String,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
}

fn default_role() -> String {
    UserRole::User.as_str().to_string()
}

/// Lifetime of a view pass; only needs to cover the redirect hop and a page load
pub const VIEW_PASS_TTL_SECONDS: u64 = 300;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlugScope {
    /// Password verified for this slug
    Access,
    /// A scan of this slug was just allowed
    View,
}

/// Claims of per-slug tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlugAccessClaims {
    /// The slug this token is valid for
    pub sub: String,
    pub scope: SlugScope,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Clone)]
pub struct JwtConfig {
    pub algorithm: Algorithm,
    pub audience: String,
    pub issuer: String,
    pub access_encoding_key: EncodingKey,
    pub access_decoding_key: DecodingKey,
    pub slug_encoding_key: EncodingKey,
    pub slug_decoding_key: DecodingKey,
    pub slug_token_ttl: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("access_encoding_key", &"<redacted>")
            .field("access_decoding_key", &"<redacted>")
            .field("slug_encoding_key", &"<redacted>")
            .field("slug_decoding_key", &"<redacted>")
            .field("slug_token_ttl", &self.slug_token_ttl)
            .finish()
    }
}

impl JwtConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        let access_secret = config.jwt.access_secret.as_bytes();
        let slug_secret = config.redirect.access_cookie_secret.as_bytes();

        Self {
            algorithm: Algorithm::HS256,
            audience: config.jwt.audience.clone(),
            issuer: config.jwt.issuer.clone(),
            access_encoding_key: EncodingKey::from_secret(access_secret),
            access_decoding_key: DecodingKey::from_secret(access_secret),
            slug_encoding_key: EncodingKey::from_secret(slug_secret),
            slug_decoding_key: DecodingKey::from_secret(slug_secret),
            slug_token_ttl: config.redirect.access_cookie_ttl_seconds.max(1) as u64,
        }
    }
}

fn now_secs() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| JwtError::ClockError(e.to_string()))
}

#[derive(Debug, Clone)]
pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(JwtConfig::from_app_config(config))
    }

    /// Mint a dashboard token. Production tokens come from the auth provider;
    /// this exists for tooling and tests sharing the same secret.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
        ttl_seconds: u64,
    ) -> Result<String, JwtError> {
        let now = now_secs()?;
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.as_str().to_string(),
            aud: self.config.audience.clone(),
            iss: self.config.issuer.clone(),
            iat: now,
            exp: now + ttl_seconds,
        };

        encode(
            &Header::new(self.config.algorithm),
            &claims,
            &self.config.access_encoding_key,
        )
        .map_err(Into::into)
    }

    /// Validate a dashboard bearer token (signature, expiry, audience, issuer)
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, JwtError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.set_audience(&[self.config.audience.clone()]);
        validation.set_issuer(&[self.config.issuer.clone()]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;

        let token_data =
            decode::<AccessTokenClaims>(token, &self.config.access_decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    pub fn slug_token_ttl(&self) -> u64 {
        self.config.slug_token_ttl
    }

    /// Sign a proof that the caller knows the password for `slug`
    pub fn issue_slug_access_token(&self, slug: &str) -> Result<String, JwtError> {
        self.issue_slug_token(slug, SlugScope::Access, self.config.slug_token_ttl)
    }

    /// Sign a pass letting the landing page of `slug` open after an allowed scan
    pub fn issue_view_pass(&self, slug: &str) -> Result<String, JwtError> {
        self.issue_slug_token(slug, SlugScope::View, VIEW_PASS_TTL_SECONDS)
    }

    /// Check a verification cookie value against the slug being scanned
    pub fn verify_slug_access_token(&self, token: &str, slug: &str) -> Result<(), JwtError> {
        self.verify_slug_token(token, slug, SlugScope::Access)
    }

    pub fn verify_view_pass(&self, token: &str, slug: &str) -> Result<(), JwtError> {
        self.verify_slug_token(token, slug, SlugScope::View)
    }

    fn issue_slug_token(&self, slug: &str, scope: SlugScope, ttl: u64) -> Result<String, JwtError> {
        let now = now_secs()?;
        let claims = SlugAccessClaims {
            sub: slug.to_string(),
            scope,
            iat: now,
            exp: now + ttl,
        };

        encode(
            &Header::new(self.config.algorithm),
            &claims,
            &self.config.slug_encoding_key,
        )
        .map_err(Into::into)
    }

    fn verify_slug_token(&self, token: &str, slug: &str, scope: SlugScope) -> Result<(), JwtError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<SlugAccessClaims>(token, &self.config.slug_decoding_key, &validation)?;

        if token_data.claims.sub != slug {
            return Err(JwtError::SlugMismatch);
        }
        if token_data.claims.scope != scope {
            return Err(JwtError::ScopeMismatch);
        }

        Ok(())
    }
}
