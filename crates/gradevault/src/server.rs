//! Server assembly
//!
//! Secrets are loaded once at startup into immutable services passed
//! explicitly to every component; a misconfigured key rejects startup
//! outright.

use std::sync::Arc;

use tracing::info;

use gradevault_api::RpcServer;
use gradevault_common::config::Config;
use gradevault_common::error::{Error, Result, StorageError};
use gradevault_gateway::{AuditSink, Gateway};
use gradevault_query::QueryCompiler;
use gradevault_security::{FieldCipher, TokenService};

/// The assembled GradeVault server
pub struct VaultServer {
    rpc: RpcServer,
}

impl VaultServer {
    /// Validate configuration, connect the pool, and wire the services
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing GradeVault services");

        // Fail fast on misconfigured key material
        let aes_key = config.security.decoded_aes_key()?;
        let cipher = Arc::new(FieldCipher::new(&aes_key)?);

        let jwt_secret = config.security.decoded_jwt_secret()?;
        let tokens = Arc::new(TokenService::new(
            &jwt_secret,
            config.security.jwt_ttl_secs,
        )?);

        let compiler = QueryCompiler::new(config.security.allowed_tables.clone());
        let gateway = Arc::new(Gateway::connect(&config.database, compiler).await?);

        let audit = Arc::new(AuditSink::new(gateway.pool().clone()));
        audit
            .migrate()
            .await
            .map_err(|e| Error::Storage(StorageError::Backend(e.to_string())))?;

        let rpc = RpcServer::new(&config.server, gateway, audit, cipher, tokens);

        info!(
            tables = config.security.allowed_tables.len(),
            "GradeVault services ready"
        );
        Ok(Self { rpc })
    }

    /// Run until the RPC server exits
    pub async fn run(&self) -> Result<()> {
        self.rpc.run().await
    }

    /// Graceful shutdown
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down GradeVault server");
        Ok(())
    }
}
