use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("REELHARVEST_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[site]
base_url = "https://mirror.example.com"

[harvest]
batch_size = 5
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.site.base_url, "https://mirror.example.com");
        assert_eq!(config.harvest.batch_size, 5);
        // Unset sections keep their defaults.
        assert_eq!(config.enrich.worker_count, 2);
        assert!(!config.site.categories.is_empty());
    }

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.site.base_url, "https://www.piaohua.com");
        assert_eq!(config.harvest.batch_size, 10);
        assert_eq!(config.data_dir.to_string_lossy(), "scrape_data");
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
data_dir = "/tmp/harvest-data"

[enrich]
worker_count = 4

[[site.categories]]
key = "action"
path = "dongzuo"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.enrich.worker_count, 4);
        assert_eq!(config.site.categories.len(), 1);
        assert_eq!(config.data_dir.to_string_lossy(), "/tmp/harvest-data");
    }
}
