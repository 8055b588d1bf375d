use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::error::AppError;

const TOKEN_PREFIX: &str = "Token ";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub is_staff: bool,
}

/// Authenticated caller with staff rights.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[derive(sqlx::FromRow)]
struct TokenOwnerRow {
    id: i64,
    email: String,
    is_staff: bool,
}

/// Tokens are stored only as their SHA-256 hex digest.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Pulls the raw key out of `Authorization: Token <key>`.
fn token_from_parts(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::AuthenticationRequired)?;

    let token = auth_header
        .strip_prefix(TOKEN_PREFIX)
        .map(str::trim)
        .ok_or(AppError::AuthenticationRequired)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AppError::AuthenticationRequired);
    }

    Ok(token)
}

// Token auth extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts)?;

        let row: Option<TokenOwnerRow> = sqlx::query_as(
            "SELECT u.id, u.email, u.is_staff
             FROM auth_tokens t
             JOIN users u ON u.id = t.user_id
             WHERE t.key_hash = $1 AND u.is_active = true",
        )
        .bind(hash_token(token))
        .fetch_optional(&state.db.pool)
        .await?;

        let user = row.ok_or(AppError::AuthenticationRequired)?;

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            is_staff: user.is_staff,
        })
    }
}

impl FromRequestParts<Arc<crate::AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            tracing::debug!(user_id = user.user_id, "non-staff user attempted an admin action");
            return Err(AppError::PermissionDenied);
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/cinema/genres");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn hash_is_stable_hex() {
        let digest = hash_token("secret");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_token("secret"));
        assert_ne!(digest, hash_token("Secret"));
    }

    #[test]
    fn token_header_is_parsed() {
        let parts = parts_with(Some("Token abc123"));
        assert_eq!(token_from_parts(&parts).unwrap(), "abc123");
    }

    #[test]
    fn missing_or_foreign_scheme_is_rejected() {
        for header_value in [None, Some("Bearer abc"), Some("Token "), Some("Token a b")] {
            let parts = parts_with(header_value);
            assert!(matches!(
                token_from_parts(&parts),
                Err(AppError::AuthenticationRequired)
            ));
        }
    }
}
