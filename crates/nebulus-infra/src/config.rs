//! Memory configuration loader.
//!
//! Reads `memory.toml` from the data directory and deserializes it into
//! [`MemoryConfig`]. Falls back to defaults when the file is missing or
//! malformed -- configuration problems never stop the subsystem.

use std::path::Path;

use nebulus_types::config::MemoryConfig;

/// Load memory configuration from `{data_dir}/memory.toml`.
///
/// - Missing file: returns [`MemoryConfig::default()`] (debug log).
/// - Unreadable or unparsable file: logs a warning, returns the default.
pub async fn load_memory_config(data_dir: &Path) -> MemoryConfig {
    let config_path = data_dir.join("memory.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No memory.toml found at {}, using defaults", config_path.display());
            return MemoryConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return MemoryConfig::default();
        }
    };

    match toml::from_str::<MemoryConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            MemoryConfig::default()
        }
    }
}
