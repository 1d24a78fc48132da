use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Site base URL is an http(s) URL
/// - At least one category is configured and keys are unique
/// - Batch size and worker counts are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if !config.site.base_url.starts_with("http://") && !config.site.base_url.starts_with("https://")
    {
        return Err(ConfigError::ValidationError(format!(
            "site.base_url must be an http(s) URL, got '{}'",
            config.site.base_url
        )));
    }

    if config.site.categories.is_empty() {
        return Err(ConfigError::ValidationError(
            "site.categories cannot be empty".to_string(),
        ));
    }

    for (i, category) in config.site.categories.iter().enumerate() {
        if category.key.is_empty() || category.path.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "site.categories[{i}] must have a non-empty key and path"
            )));
        }
        if config.site.categories[..i].iter().any(|c| c.key == category.key) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate category key '{}'",
                category.key
            )));
        }
    }

    if config.harvest.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "harvest.batch_size cannot be 0".to_string(),
        ));
    }

    if config.enrich.worker_count == 0 {
        return Err(ConfigError::ValidationError(
            "enrich.worker_count cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategorySpec;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_bad_base_url_fails() {
        let mut config = Config::default();
        config.site.base_url = "ftp://example.com".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_categories_fails() {
        let mut config = Config::default();
        config.site.categories.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_duplicate_category_key_fails() {
        let mut config = Config::default();
        config.site.categories = vec![
            CategorySpec::new("action", "dongzuo"),
            CategorySpec::new("action", "xiju"),
        ];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_batch_size_fails() {
        let mut config = Config::default();
        config.harvest.batch_size = 0;
        assert!(validate_config(&config).is_err());
    }
}
