//! Configuration loading failures.

/// Errors raised while loading or validating `strand.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        assert_eq!(
            format!("{}", ConfigError::Parse("line 3".into())),
            "failed to parse configuration: line 3"
        );
        assert_eq!(
            format!("{}", ConfigError::Validation("bad opt".into())),
            "invalid configuration: bad opt"
        );
    }
}
