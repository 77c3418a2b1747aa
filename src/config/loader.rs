//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GateConfig, ConfigError> {
    let config: GateConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[listener]
bind_address = "127.0.0.1:9000"

[timeouts]
operation_ms = 750

[timeouts.endpoints]
"cardholders.add" = 1500

[compression]
min_gzip_bytes = 64

[[rules.groups]]
name = "staff"
min_card = 6000000
max_card = 6999999
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.timeouts.deadline_for("system.get"), Duration::from_millis(750));
        assert_eq!(config.timeouts.deadline_for("cardholders.add"), Duration::from_millis(1500));
        assert_eq!(config.compression.min_gzip_bytes, 64);
        assert_eq!(config.rules.groups[0].name, "staff");
        // untouched sections keep defaults
        assert_eq!(config.audit.queue_capacity, 1024);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = parse_config("[timeouts]\noperation_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("timeouts.operation_ms"));
    }

    #[test]
    fn test_rejects_bad_toml() {
        assert!(matches!(parse_config("[timeouts"), Err(ConfigError::Parse(_))));
    }
}
