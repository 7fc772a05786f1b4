//! GradeVault API Layer
//!
//! The RPC surface consumed by the client tier: generic select/selectList/
//! insert/update/delete over operation descriptors, the audit endpoint, and
//! login. Every route carries an explicit access declaration checked by the
//! authorization gate.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod login;
pub mod response;
pub mod rest;

pub use response::ApiResponse;
pub use rest::RpcServer;
