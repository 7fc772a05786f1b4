//! Configuration loading

use std::path::Path;
use anyhow::Result;
use gradevault_common::config::Config;

/// Load configuration from file, falling back to defaults plus environment
/// overrides when the file does not exist
pub async fn load(path: &str) -> Result<Config> {
    let path = Path::new(path);

    if path.exists() {
        Config::load(path).await.map_err(|e| anyhow::anyhow!(e))
    } else {
        let mut config = Config::default();
        config.apply_env_overrides();
        Ok(config)
    }
}
