//! Authorization gate
//!
//! Every sensitive operation declares the role set allowed to invoke it; the
//! gate verifies the bearer token and the caller's role before the operation
//! runs. There is no default-allow: a route is public only through the
//! explicit [`Access::Public`] marker.

use tracing::debug;

use gradevault_common::error::{AuthError, Error, Result};

use crate::token::TokenService;

pub const ROLE_STUDENT: &str = "STUDENT";
pub const ROLE_TEACHER: &str = "TEACHER";
pub const ROLE_ADMIN: &str = "ADMIN";

const BEARER_PREFIX: &str = "Bearer ";

/// Declared access policy of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No check performed, explicitly public
    Public,
    /// Caller must present a valid token whose role is in the set
    Roles(&'static [&'static str]),
}

/// Verified identity attached to the call context after the gate passes
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub role: String,
    pub name: String,
}

/// Run the gate for one request.
///
/// A missing header, a malformed `Bearer` prefix, and an invalid token are
/// treated identically; every failure collapses into one `AccessDenied`
/// outcome. On success the verified identity is returned for the call
/// context (`None` for public operations).
pub fn authorize(
    header: Option<&str>,
    access: &Access,
    tokens: &TokenService,
) -> Result<Option<Identity>> {
    let Access::Roles(required) = access else {
        return Ok(None);
    };

    let token = header
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| denied("missing or invalid credentials"))?;

    let claims = tokens
        .verify(token)
        .map_err(|_| denied("missing or invalid credentials"))?;

    if !required.contains(&claims.role.as_str()) {
        debug!(role = %claims.role, user_id = %claims.user_id, "role not in allowed set");
        return Err(denied(&format!(
            "required roles: {}",
            required.join(", ")
        )));
    }

    debug!(user_id = %claims.user_id, role = %claims.role, "authorization passed");
    Ok(Some(Identity {
        user_id: claims.user_id,
        role: claims.role,
        name: claims.name,
    }))
}

fn denied(msg: &str) -> Error {
    Error::Auth(AuthError::AccessDenied(msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAFF: Access = Access::Roles(&[ROLE_TEACHER, ROLE_ADMIN]);

    fn tokens() -> TokenService {
        TokenService::new(b"0123456789abcdef0123456789abcdef", 3600).unwrap()
    }

    fn bearer(service: &TokenService, user_id: &str, role: &str) -> String {
        format!("Bearer {}", service.issue(user_id, role, "Test").unwrap())
    }

    #[test]
    fn test_public_operation_skips_check() {
        let identity = authorize(None, &Access::Public, &tokens()).unwrap();
        assert!(identity.is_none());
    }

    #[test]
    fn test_missing_header_denied() {
        let err = authorize(None, &STAFF, &tokens()).unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::AccessDenied(_))));
    }

    #[test]
    fn test_malformed_prefix_denied_like_invalid_token() {
        let service = tokens();
        let raw = service.issue("A1", ROLE_ADMIN, "Test").unwrap();
        // Valid token, missing the Bearer prefix
        let err = authorize(Some(&raw), &STAFF, &service).unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::AccessDenied(_))));
    }

    #[test]
    fn test_wrong_role_denied_with_required_roles_named() {
        let service = tokens();
        let header = bearer(&service, "S1", ROLE_STUDENT);

        let err = authorize(Some(&header), &STAFF, &service).unwrap_err();
        match err {
            Error::Auth(AuthError::AccessDenied(msg)) => {
                assert!(msg.contains(ROLE_TEACHER));
                assert!(msg.contains(ROLE_ADMIN));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_matching_role_passes_and_populates_context() {
        let service = tokens();
        let header = bearer(&service, "A1", ROLE_ADMIN);

        let identity = authorize(Some(&header), &STAFF, &service)
            .unwrap()
            .unwrap();
        assert_eq!(identity.user_id, "A1");
        assert_eq!(identity.role, ROLE_ADMIN);
    }

    #[test]
    fn test_forged_token_denied() {
        let service = tokens();
        let forger = TokenService::new(b"wrong-secret-wrong-secret-wrong!", 3600).unwrap();
        let header = bearer(&forger, "A1", ROLE_ADMIN);

        let err = authorize(Some(&header), &STAFF, &service).unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::AccessDenied(_))));
    }
}
