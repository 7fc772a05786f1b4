//! Common type definitions for GradeVault

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A database record, decoded as an ordered column -> value map
pub type Record = Map<String, Value>;

/// Suffix marking a condition key as an `IN (...)` filter
pub const IN_SUFFIX: &str = "_in";

/// Suffix marking an encrypted column; decryption populates the
/// suffix-stripped key alongside it
pub const ENCRYPTED_SUFFIX: &str = "_encrypted";

/// Reserved data value compiled as the SQL function rather than a bound
/// string parameter
pub const NOW_SENTINEL: &str = "NOW()";

// ============================================================================
// Operation descriptor
// ============================================================================

/// Operation kind, case-sensitive on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    #[serde(rename = "SELECT")]
    Select,
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
}

impl OperationKind {
    /// Wire/log name of the operation
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Select => "SELECT",
            OperationKind::Insert => "INSERT",
            OperationKind::Update => "UPDATE",
            OperationKind::Delete => "DELETE",
        }
    }
}

/// The single generic command unit driving all persistence.
///
/// `data` carries INSERT/UPDATE payloads; `conditions` carries equality
/// filters, or `IN` filters when the key ends in [`IN_SUFFIX`]. Values are
/// scalars, except `_in` keys which hold arrays of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Operation kind (required)
    #[serde(rename = "operation")]
    pub kind: OperationKind,

    /// Target table name, validated against the allow-list
    #[serde(rename = "table")]
    pub target: String,

    /// Column -> value payload for INSERT/UPDATE
    #[serde(default)]
    pub data: Map<String, Value>,

    /// Column -> value filters; empty means "no filter" for SELECT and is
    /// rejected for UPDATE/DELETE
    #[serde(default)]
    pub conditions: Map<String, Value>,

    /// Role carried alongside login-type operations
    #[serde(rename = "role", default, skip_serializing_if = "Option::is_none")]
    pub actor_role: Option<String>,
}

impl OperationDescriptor {
    /// Create a descriptor with empty data and conditions
    pub fn new(kind: OperationKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            data: Map::new(),
            conditions: Map::new(),
            actor_role: None,
        }
    }

    /// Add a data column
    #[must_use]
    pub fn with_data(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.data.insert(column.to_string(), value.into());
        self
    }

    /// Add a condition column
    #[must_use]
    pub fn with_condition(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.insert(column.to_string(), value.into());
        self
    }
}

// ============================================================================
// Audit records
// ============================================================================

/// Append-only log entry for a security-relevant operation.
///
/// The timestamp is assigned by the sink at insert time; records are never
/// updated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Operation type (INSERT/UPDATE/DELETE/LOGIN/...)
    pub operation_type: String,
    /// Table the operation touched
    pub table_name: String,
    /// Logical key of the affected record, "-" when unknown
    #[serde(default = "unknown_record_id")]
    pub record_id: String,
    /// Identity of the operator
    pub operator_id: String,
    /// Role of the operator
    pub operator_type: String,
    /// Source address of the request
    #[serde(default)]
    pub client_ip: String,
}

fn unknown_record_id() -> String {
    "-".to_string()
}

impl AuditRecord {
    pub fn new(
        operation_type: impl Into<String>,
        table_name: impl Into<String>,
        operator_id: impl Into<String>,
        operator_type: impl Into<String>,
    ) -> Self {
        Self {
            operation_type: operation_type.into(),
            table_name: table_name.into(),
            record_id: unknown_record_id(),
            operator_id: operator_id.into(),
            operator_type: operator_type.into(),
            client_ip: String::new(),
        }
    }

    #[must_use]
    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = record_id.into();
        self
    }

    #[must_use]
    pub fn with_client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = client_ip.into();
        self
    }
}
