//! Append-only audit sink
//!
//! Records security-relevant operations into `security_log`. Writes are
//! best-effort with respect to the caller's success path: a failed audit
//! write is logged and swallowed, never surfaced, never retried. Each row
//! carries a SHA-256 integrity hash over its field tuple so in-place edits
//! are detectable.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use sqlx::mysql::MySqlPool;
use tracing::{debug, error};

use gradevault_common::types::AuditRecord;

const INSERT_SQL: &str = "INSERT INTO security_log \
    (operation_type, table_name, record_id, operator_id, operator_type, client_ip, integrity_hash, operation_time) \
    VALUES (?, ?, ?, ?, ?, ?, ?, NOW())";

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS security_log (\
    id BIGINT AUTO_INCREMENT PRIMARY KEY, \
    operation_type VARCHAR(32) NOT NULL, \
    table_name VARCHAR(64) NOT NULL, \
    record_id VARCHAR(64) NOT NULL, \
    operator_id VARCHAR(64) NOT NULL, \
    operator_type VARCHAR(32) NOT NULL, \
    client_ip VARCHAR(64) NOT NULL, \
    integrity_hash CHAR(64) NOT NULL, \
    operation_time DATETIME NOT NULL)";

/// Best-effort writer for the append-only security log
pub struct AuditSink {
    pool: MySqlPool,
}

impl AuditSink {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Create the `security_log` table when absent
    pub async fn migrate(&self) -> sqlx::Result<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Write one audit record.
    ///
    /// Always reports success to the caller; a write failure must never
    /// block or roll back the primary operation.
    pub async fn record(&self, rec: &AuditRecord) -> bool {
        let result = sqlx::query(INSERT_SQL)
            .bind(&rec.operation_type)
            .bind(&rec.table_name)
            .bind(&rec.record_id)
            .bind(&rec.operator_id)
            .bind(&rec.operator_type)
            .bind(&rec.client_ip)
            .bind(integrity_hash(rec))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                debug!(
                    operator = %rec.operator_id,
                    operation = %rec.operation_type,
                    table = %rec.table_name,
                    "audit record written"
                );
            }
            Err(e) => {
                error!(error = %e, operation = %rec.operation_type, "audit write failed");
            }
        }

        true
    }

    /// Fire-and-forget variant for state-changing business calls
    pub fn record_detached(self: &Arc<Self>, rec: AuditRecord) {
        let sink = Arc::clone(self);
        tokio::spawn(async move {
            sink.record(&rec).await;
        });
    }
}

/// Hex SHA-256 over the canonical field tuple
fn integrity_hash(rec: &AuditRecord) -> String {
    let mut hasher = Sha256::new();
    for field in [
        &rec.operation_type,
        &rec.table_name,
        &rec.record_id,
        &rec.operator_id,
        &rec.operator_type,
        &rec.client_ip,
    ] {
        hasher.update(field.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}
