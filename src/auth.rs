//! Authenticated identity extraction and role gating.
//!
//! Token verification is owned by the upstream auth service; by the time a
//! request reaches this service the gateway has resolved it to a user id and
//! role, forwarded as `x-user-id` / `x-user-role` headers.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Unauthorized),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn require(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            let allowed = roles
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Err(AppError::Forbidden(allowed))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or(AppError::Unauthorized)?;
        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?
            .parse()?;
        Ok(Self { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_gate_lists_allowed_roles() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Seller,
        };
        assert!(user.require(&[Role::Seller]).is_ok());
        assert!(user.require(&[Role::Buyer, Role::Admin]).is_err());
        match user.require(&[Role::Buyer, Role::Admin]) {
            Err(AppError::Forbidden(allowed)) => assert_eq!(allowed, "buyer, admin"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
