//! GradeVault Query Compiler
//!
//! Deterministically compiles generic [`OperationDescriptor`] commands into
//! parameterized SQL statements against an allow-listed set of tables.
//! Values are always bound as parameters, never concatenated into the
//! statement text.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod compiler;

pub use compiler::{QueryCompiler, Statement};
