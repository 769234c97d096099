// Authenticated caller extracted from a validated bearer token

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UserRole;
use crate::services::jwt::{AccessTokenClaims, JwtError};

/// Explicit identity handed to every dashboard handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub exp: u64,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl TryFrom<AccessTokenClaims> for AuthenticatedUser {
    type Error = JwtError;

    fn try_from(claims: AccessTokenClaims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidToken)?;
        // Unknown roles get the least privilege
        let role = claims.role.parse().unwrap_or(UserRole::User);

        Ok(Self {
            user_id,
            email: claims.email,
            role,
            exp: claims.exp,
        })
    }
}
