// src/pipeline/validate.rs

use crate::error::{AppError, Result};
use crate::models::Config;

/// Validate configuration and the inputs it points at.
pub fn run_validate(config: &Config) -> Result<()> {
    log::info!("Validating configuration...");

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    log::info!("✓ Config OK");
    log::info!("    user agent: {}", config.http.user_agent);
    log::info!("    request delay: {}ms", config.http.request_delay_ms);
    log::info!("    max hops: {}", config.resolver.max_hops);
    log::info!("    oracle columns: {}", config.oracle.columns.len());

    if let Some(path) = &config.report.guide_map {
        if !path.exists() {
            log::error!("Guide map not found at {}", path.display());
            return Err(AppError::input_missing(path));
        }
        log::info!("✓ Guide map found at {}", path.display());
    }

    log::info!("All validations passed!");
    Ok(())
}
