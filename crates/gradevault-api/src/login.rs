//! Login flow
//!
//! The declared role selects the account table; the stored bcrypt hash is
//! verified and a token is issued on success. A failed login returns an
//! authentication error and no token.

use serde::{Deserialize, Serialize};

use gradevault_common::error::{AuthError, Error, Result};
use gradevault_common::types::{OperationDescriptor, OperationKind, Record};
use gradevault_security::{credential, gate, TokenService};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: String,
    pub name: String,
}

/// Account table and id column for a declared role
pub fn account_table(role: &str) -> Option<(&'static str, &'static str)> {
    match role {
        gate::ROLE_STUDENT => Some(("students", "student_id")),
        gate::ROLE_TEACHER => Some(("teachers", "teacher_id")),
        gate::ROLE_ADMIN => Some(("admins", "admin_id")),
        _ => None,
    }
}

/// Descriptor fetching the account row for a login attempt
pub fn account_descriptor(role: &str, user_id: &str) -> Option<OperationDescriptor> {
    let (table, id_column) = account_table(role)?;
    let mut desc =
        OperationDescriptor::new(OperationKind::Select, table).with_condition(id_column, user_id);
    desc.actor_role = Some(role.to_string());
    Some(desc)
}

/// Cost-12 hash used to burn the same bcrypt work on an unknown user as a
/// wrong password; its verify result is always discarded
const ABSENT_ACCOUNT_HASH: &str = "$2a$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW";

/// Verify the stored credential and issue a token for the account row.
///
/// `None` for the row (unknown user) and a failed password check produce the
/// same error and take the same bcrypt time, so callers cannot probe which
/// accounts exist through either the message or response timing.
pub fn authenticate_account(
    row: Option<&Record>,
    user_id: &str,
    password: &str,
    role: &str,
    tokens: &TokenService,
) -> Result<LoginResponse> {
    let failed = || Error::Auth(AuthError::AuthenticationFailed("invalid credentials".to_string()));

    let Some(row) = row else {
        let _ = credential::verify(password, ABSENT_ACCOUNT_HASH);
        return Err(failed());
    };
    let stored = row.get("password").and_then(|v| v.as_str()).ok_or_else(failed)?;

    if !credential::verify(password, stored) {
        return Err(failed());
    }

    let name = row
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or(user_id)
        .to_string();
    let token = tokens.issue(user_id, role, &name)?;

    Ok(LoginResponse {
        token,
        user_id: user_id.to_string(),
        role: role.to_string(),
        name,
    })
}
