//! Token issuance and verification
//!
//! Signed, time-boxed bearer credentials carrying identity and role claims.
//! Verification collapses every failure (bad signature, expired, malformed)
//! into the single `InvalidToken` kind so callers cannot learn which check
//! rejected them.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use gradevault_common::error::{AuthError, Error, Result};

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 tokens with a fixed TTL
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl TokenService {
    /// Build a token service from the signing secret. An empty secret is a
    /// startup misconfiguration and is rejected.
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Config("token signing secret is empty".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_secs,
        })
    }

    /// Sign claims for the given identity, stamped with issued-at and expiry
    pub fn issue(&self, user_id: &str, role: &str, name: &str) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            user_id: user_id.to_string(),
            role: role.to_string(),
            name: name.to_string(),
            iat: now,
            exp: now + self.ttl_secs as i64,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("token signing failed: {}", e)))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| Error::Auth(AuthError::InvalidToken))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn service() -> TokenService {
        TokenService::new(SECRET, 3600).unwrap()
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(TokenService::new(b"", 3600).is_err());
    }

    #[test]
    fn test_issue_then_verify_returns_claims() {
        let service = service();
        let token = service.issue("S1", "STUDENT", "Alice").unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.user_id, "S1");
        assert_eq!(claims.role, "STUDENT");
        assert_eq!(claims.name, "Alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let service = service();
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            user_id: "S1".to_string(),
            role: "STUDENT".to_string(),
            name: "Alice".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(Error::Auth(AuthError::InvalidToken))
        ));
    }

    #[test]
    fn test_tampered_signature_is_invalid() {
        let service = service();
        let token = service.issue("S1", "STUDENT", "Alice").unwrap();

        // Flip a single byte of the signature segment
        let mut bytes = token.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert!(matches!(
            service.verify(&tampered),
            Err(Error::Auth(AuthError::InvalidToken))
        ));
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let token = service().issue("S1", "STUDENT", "Alice").unwrap();
        let other = TokenService::new(b"another-secret-another-secret-ab", 3600).unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        assert!(matches!(
            service().verify("not.a.token"),
            Err(Error::Auth(AuthError::InvalidToken))
        ));
    }
}
