use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown config category: {name}")]
    UnknownCategory { name: String },

    #[error("Unknown visualization type: {name}")]
    UnknownType { name: String },

    #[error("Duplicate config category: {name}")]
    DuplicateCategory { name: String },

    #[error("Duplicate visualization type: {name}")]
    DuplicateType { name: String },

    #[error("Invalid registry table: {0}")]
    Config(String),

    #[error("Config id space exhausted")]
    ConfigIdsExhausted,
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::UnknownCategory {
            name: "bogus".into(),
        };
        assert!(err.to_string().contains("bogus"));

        let err = CoreError::UnknownType {
            name: "radar".into(),
        };
        assert!(err.to_string().contains("radar"));
    }

    #[test]
    fn yaml_error_becomes_config_error() {
        let yaml_err = serde_yaml::from_str::<u32>("[1, 2").unwrap_err();
        let err: CoreError = yaml_err.into();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
