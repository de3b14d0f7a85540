// src/session.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, utils::jwt::Claims};

/// Per-request view of the caller, built from the verified token.
///
/// Created when a request passes `auth_middleware` and dropped with the
/// request; workflow calls receive it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: i64,
    pub username: String,
}

impl SessionContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;
        Ok(Self {
            user_id,
            username: claims.username.clone(),
        })
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| AppError::AuthError("Not authenticated".to_string()))?;
        Self::from_claims(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            username: "ana".to_string(),
            exp: 0,
        }
    }

    #[test]
    fn builds_from_claims() {
        let session = SessionContext::from_claims(&claims("42")).unwrap();
        assert_eq!(session.user_id, 42);
        assert_eq!(session.username, "ana");
    }

    #[test]
    fn rejects_non_numeric_subject() {
        assert!(SessionContext::from_claims(&claims("admin")).is_err());
    }
}
