//! Descriptor-to-SQL compilation
//!
//! Turns an [`OperationDescriptor`] into a `?`-parameterized statement plus
//! its bound values. The table name is checked against the allow-list before
//! anything is built; column identifiers are validated because they cannot be
//! bound as parameters.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use gradevault_common::error::{Error, QueryError, Result};
use gradevault_common::types::{OperationDescriptor, IN_SUFFIX, NOW_SENTINEL};

/// A compiled, parameterized SQL statement
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `?` placeholders
    pub sql: String,
    /// Values to bind, in placeholder order
    pub params: Vec<Value>,
}

/// Compiles operation descriptors against a fixed table allow-list
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    allowed_tables: HashSet<String>,
}

impl QueryCompiler {
    /// Create a compiler over the given allow-list
    pub fn new<I, S>(allowed_tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_tables: allowed_tables.into_iter().map(Into::into).collect(),
        }
    }

    /// Compile `SELECT * FROM <target> [WHERE <conditions>]`
    pub fn compile_select(&self, desc: &OperationDescriptor) -> Result<Statement> {
        self.validate_target(&desc.target)?;

        let mut sql = format!("SELECT * FROM {}", desc.target);
        let mut params = Vec::new();

        if !desc.conditions.is_empty() {
            let clause = build_where_clause(&desc.conditions, &mut params)?;
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }

        debug!(sql = %sql, "compiled SELECT");
        Ok(Statement { sql, params })
    }

    /// Compile `INSERT INTO <target> (cols...) VALUES (?...)`
    pub fn compile_insert(&self, desc: &OperationDescriptor) -> Result<Statement> {
        self.validate_target(&desc.target)?;

        if desc.data.is_empty() {
            return Err(malformed("INSERT requires a non-empty data map"));
        }

        let mut columns = Vec::with_capacity(desc.data.len());
        let mut placeholders = Vec::with_capacity(desc.data.len());
        let mut params = Vec::new();

        for (column, value) in &desc.data {
            validate_identifier(column)?;
            columns.push(column.as_str());

            if is_now_sentinel(value) {
                placeholders.push(NOW_SENTINEL);
            } else {
                validate_scalar(column, value)?;
                placeholders.push("?");
                params.push(value.clone());
            }
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            desc.target,
            columns.join(", "),
            placeholders.join(", ")
        );

        debug!(sql = %sql, "compiled INSERT");
        Ok(Statement { sql, params })
    }

    /// Compile `UPDATE <target> SET col = ?... WHERE <conditions>`.
    ///
    /// Conditions are mandatory; an unconditional UPDATE never reaches the
    /// storage layer.
    pub fn compile_update(&self, desc: &OperationDescriptor) -> Result<Statement> {
        self.validate_target(&desc.target)?;

        if desc.data.is_empty() {
            return Err(malformed("UPDATE requires a non-empty data map"));
        }
        if desc.conditions.is_empty() {
            return Err(Error::Query(QueryError::EmptyConditions("UPDATE")));
        }

        let mut assignments = Vec::with_capacity(desc.data.len());
        let mut params = Vec::new();

        for (column, value) in &desc.data {
            validate_identifier(column)?;

            if is_now_sentinel(value) {
                assignments.push(format!("{} = {}", column, NOW_SENTINEL));
            } else {
                validate_scalar(column, value)?;
                assignments.push(format!("{} = ?", column));
                params.push(value.clone());
            }
        }

        let clause = build_where_clause(&desc.conditions, &mut params)?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            desc.target,
            assignments.join(", "),
            clause
        );

        debug!(sql = %sql, "compiled UPDATE");
        Ok(Statement { sql, params })
    }

    /// Compile `DELETE FROM <target> WHERE <conditions>`.
    ///
    /// Conditions are mandatory; an unconditional DELETE never reaches the
    /// storage layer.
    pub fn compile_delete(&self, desc: &OperationDescriptor) -> Result<Statement> {
        self.validate_target(&desc.target)?;

        if desc.conditions.is_empty() {
            return Err(Error::Query(QueryError::EmptyConditions("DELETE")));
        }

        let mut params = Vec::new();
        let clause = build_where_clause(&desc.conditions, &mut params)?;
        let sql = format!("DELETE FROM {} WHERE {}", desc.target, clause);

        debug!(sql = %sql, "compiled DELETE");
        Ok(Statement { sql, params })
    }

    fn validate_target(&self, target: &str) -> Result<()> {
        if target.is_empty() {
            return Err(malformed("table name is required"));
        }
        if !self.allowed_tables.contains(target) {
            return Err(Error::Query(QueryError::InvalidTarget(target.to_string())));
        }
        Ok(())
    }
}

/// Build an ANDed WHERE clause, appending bound values to `params`.
///
/// Keys ending in `_in` compile to `col IN (?, ...)` from an array of
/// strings; every other key compiles to `col = ?`.
fn build_where_clause(
    conditions: &serde_json::Map<String, Value>,
    params: &mut Vec<Value>,
) -> Result<String> {
    let mut clauses = Vec::with_capacity(conditions.len());

    for (key, value) in conditions {
        if let Some(column) = key.strip_suffix(IN_SUFFIX) {
            validate_identifier(column)?;

            let Some(items) = value.as_array() else {
                return Err(malformed(&format!(
                    "condition '{}' must hold an array of strings",
                    key
                )));
            };
            if items.is_empty() {
                return Err(malformed(&format!(
                    "condition '{}' must not be an empty array",
                    key
                )));
            }
            for item in items {
                if !item.is_string() {
                    return Err(malformed(&format!(
                        "condition '{}' must hold only strings",
                        key
                    )));
                }
                params.push(item.clone());
            }

            let placeholders = vec!["?"; items.len()].join(", ");
            clauses.push(format!("{} IN ({})", column, placeholders));
        } else {
            validate_identifier(key)?;
            validate_scalar(key, value)?;
            clauses.push(format!("{} = ?", key));
            params.push(value.clone());
        }
    }

    Ok(clauses.join(" AND "))
}

fn is_now_sentinel(value: &Value) -> bool {
    value.as_str() == Some(NOW_SENTINEL)
}

/// Column identifiers are interpolated into the statement text, so they are
/// restricted to `[A-Za-z_][A-Za-z0-9_]*`.
fn validate_identifier(column: &str) -> Result<()> {
    let mut chars = column.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(malformed(&format!("invalid column identifier '{}'", column)))
    }
}

/// Values must be scalars; arrays are only legal behind `_in` keys and
/// nested structures are never legal.
fn validate_scalar(column: &str, value: &Value) -> Result<()> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => Ok(()),
        Value::Array(_) | Value::Object(_) => Err(malformed(&format!(
            "value for '{}' must be a scalar",
            column
        ))),
    }
}

fn malformed(msg: &str) -> Error {
    Error::Query(QueryError::MalformedDescriptor(msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradevault_common::types::OperationKind;
    use serde_json::json;

    fn compiler() -> QueryCompiler {
        QueryCompiler::new(["students", "grade_records", "courses"])
    }

    #[test]
    fn test_select_without_conditions_has_no_where() {
        let desc = OperationDescriptor::new(OperationKind::Select, "students");
        let stmt = compiler().compile_select(&desc).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM students");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_select_conditions_are_anded_and_bound() {
        let desc = OperationDescriptor::new(OperationKind::Select, "grade_records")
            .with_condition("student_id", "S1")
            .with_condition("exam_type", "final");

        let stmt = compiler().compile_select(&desc).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM grade_records WHERE student_id = ? AND exam_type = ?"
        );
        assert_eq!(stmt.params, vec![json!("S1"), json!("final")]);
    }

    #[test]
    fn test_select_in_condition_expands_placeholders() {
        let desc = OperationDescriptor::new(OperationKind::Select, "courses")
            .with_condition("course_id_in", json!(["C1", "C2", "C3"]));

        let stmt = compiler().compile_select(&desc).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM courses WHERE course_id IN (?, ?, ?)");
        assert_eq!(stmt.params, vec![json!("C1"), json!("C2"), json!("C3")]);
    }

    #[test]
    fn test_empty_in_array_is_malformed() {
        let desc = OperationDescriptor::new(OperationKind::Select, "courses")
            .with_condition("course_id_in", json!([]));

        let err = compiler().compile_select(&desc).unwrap_err();
        assert!(matches!(
            err,
            Error::Query(QueryError::MalformedDescriptor(_))
        ));
    }

    #[test]
    fn test_unlisted_table_rejected_before_compilation() {
        let desc = OperationDescriptor::new(OperationKind::Select, "mysql.user");
        let err = compiler().compile_select(&desc).unwrap_err();
        assert!(matches!(err, Error::Query(QueryError::InvalidTarget(_))));
    }

    #[test]
    fn test_insert_binds_values_not_text() {
        let desc = OperationDescriptor::new(OperationKind::Insert, "grade_records")
            .with_data("student_id", "S1'; DROP TABLE students; --")
            .with_data("score_encrypted", "abc:def")
            .with_data("created_at", NOW_SENTINEL);

        let stmt = compiler().compile_insert(&desc).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO grade_records (student_id, score_encrypted, created_at) VALUES (?, ?, NOW())"
        );
        // The malicious value travels as a bound parameter, never as SQL text
        assert_eq!(stmt.params.len(), 2);
        assert!(!stmt.sql.contains("DROP TABLE"));
    }

    #[test]
    fn test_insert_shape_is_deterministic_across_values() {
        let make = |id: &str| {
            OperationDescriptor::new(OperationKind::Insert, "grade_records")
                .with_data("student_id", id)
                .with_data("score", 91)
        };

        let a = compiler().compile_insert(&make("S1")).unwrap();
        let b = compiler().compile_insert(&make("S2")).unwrap();
        assert_eq!(a.sql, b.sql);
        assert_ne!(a.params, b.params);
    }

    #[test]
    fn test_update_compiles_set_and_where() {
        let desc = OperationDescriptor::new(OperationKind::Update, "students")
            .with_data("name", "Alice")
            .with_data("updated_at", NOW_SENTINEL)
            .with_condition("student_id", "S1");

        let stmt = compiler().compile_update(&desc).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE students SET name = ?, updated_at = NOW() WHERE student_id = ?"
        );
        assert_eq!(stmt.params, vec![json!("Alice"), json!("S1")]);
    }

    #[test]
    fn test_update_without_conditions_rejected() {
        let desc = OperationDescriptor::new(OperationKind::Update, "students")
            .with_data("name", "Alice");

        let err = compiler().compile_update(&desc).unwrap_err();
        assert!(matches!(
            err,
            Error::Query(QueryError::EmptyConditions("UPDATE"))
        ));
    }

    #[test]
    fn test_delete_without_conditions_rejected() {
        let desc = OperationDescriptor::new(OperationKind::Delete, "students");
        let err = compiler().compile_delete(&desc).unwrap_err();
        assert!(matches!(
            err,
            Error::Query(QueryError::EmptyConditions("DELETE"))
        ));
    }

    #[test]
    fn test_delete_with_conditions() {
        let desc = OperationDescriptor::new(OperationKind::Delete, "grade_records")
            .with_condition("record_id", 42);

        let stmt = compiler().compile_delete(&desc).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM grade_records WHERE record_id = ?");
        assert_eq!(stmt.params, vec![json!(42)]);
    }

    #[test]
    fn test_hostile_column_name_rejected() {
        let desc = OperationDescriptor::new(OperationKind::Select, "students")
            .with_condition("id = 1 OR 1=1 --", "x");

        let err = compiler().compile_select(&desc).unwrap_err();
        assert!(matches!(
            err,
            Error::Query(QueryError::MalformedDescriptor(_))
        ));
    }

    #[test]
    fn test_nested_value_rejected() {
        let desc = OperationDescriptor::new(OperationKind::Insert, "students")
            .with_data("profile", json!({"nested": true}));

        let err = compiler().compile_insert(&desc).unwrap_err();
        assert!(matches!(
            err,
            Error::Query(QueryError::MalformedDescriptor(_))
        ));
    }
}
