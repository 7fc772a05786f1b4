//! GradeVault Data Access Gateway
//!
//! The sole entry point through which the application performs persistence.
//! Exposes select/selectList/insert/update/delete over a MySQL pool,
//! enforcing the table allow-list via the query compiler, plus the
//! append-only audit sink.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod audit;
mod gateway;
mod row;

pub use audit::AuditSink;
pub use gateway::Gateway;
