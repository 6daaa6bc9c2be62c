//! Configuration file loading.

use crate::config::Config;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Load configuration from a YAML file.
///
/// Only structural problems are caught here; option semantics (missing
/// handlers, port coercion, skip detection) are checked when the options are
/// normalized at startup.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let config: Config = serde_yaml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpSpec, HttpsSpec, Port};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_shorthand_config() {
        let yaml = r#"
global:
  log_level: debug
  log_format: pretty

http: 8080

https:
  port: "8443"
  root: /etc/dualserve/certs
  key: server.key
  cert: server.crt
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.global.log_level, "debug");
        assert!(matches!(
            config.http,
            Some(HttpSpec::Port(Port::Number(8080)))
        ));
        assert!(matches!(config.https, Some(HttpsSpec::Options(_))));
    }

    #[test]
    fn test_load_disabled_sections() {
        let yaml = "http: false\nhttps: false\n";

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(matches!(config.http, Some(HttpSpec::Enabled(false))));
        assert!(matches!(config.https, Some(HttpsSpec::Enabled(false))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.yaml");
        assert!(matches!(result.unwrap_err(), ConfigError::ReadError(_)));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not: valid: yaml: {{{}}}").unwrap();

        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }
}
