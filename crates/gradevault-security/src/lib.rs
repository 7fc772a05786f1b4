//! GradeVault Security Layer
//!
//! Provides:
//! - Field-level encryption (AES-CBC, `iv:ciphertext` base64 format)
//! - Credential hashing (bcrypt)
//! - Token issuance and verification (HS256 JWT)
//! - The authorization gate guarding every sensitive operation

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod credential;
pub mod crypto;
pub mod gate;
pub mod token;

pub use crypto::FieldCipher;
pub use gate::{authorize, Access, Identity};
pub use token::{Claims, TokenService};
