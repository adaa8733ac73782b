use super::SynthesisConfig;

/// Validate a loaded configuration.
///
/// # Errors
/// - The provider chain is empty
/// - The request timeout is zero
/// - The cache capacity is zero
pub(super) fn validate(config: &SynthesisConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.provider_chain.is_empty() {
        return Err("Provider chain must name at least one provider".into());
    }
    if config.request_timeout.is_zero() {
        return Err("Request timeout must be greater than zero".into());
    }
    if config.cache_max_entries == 0 {
        return Err("Cache capacity must be greater than zero".into());
    }
    if config.cache_ttl.is_some_and(|ttl| ttl.is_zero()) {
        return Err("Cache TTL must be greater than zero when set".into());
    }
    Ok(())
}
