pub mod config;
pub mod patterns;
pub mod session;

use breatho_core::{BreathingPattern, Config, CoreError, PatternCatalog};

/// Resolve `requested` (or the configured default) against the config's catalog.
pub fn resolve_pattern(
    config: &Config,
    requested: Option<&str>,
) -> Result<(PatternCatalog, BreathingPattern), CoreError> {
    let catalog = config.catalog()?;
    let pattern = match requested {
        Some(key) => catalog
            .get(key)
            .cloned()
            .ok_or_else(|| CoreError::UnknownPattern(key.to_string()))?,
        None => config.default_pattern()?,
    };
    Ok((catalog, pattern))
}
