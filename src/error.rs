use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed region list '{input}': {reason}")]
    RegionParse { input: String, reason: String },

    #[error("Cannot parse parameter {key}='{value}': {reason}")]
    ParameterParse {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid value for {parameter}: {reason}")]
    InvalidValue { parameter: String, reason: String },

    #[error("Native call {operation} failed: {message}")]
    Native { operation: String, message: String },

    #[error("Platform has not been initialized")]
    NotInitialized,

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl ExtError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn invalid_value<P: Into<String>, R: Into<String>>(parameter: P, reason: R) -> Self {
        Self::InvalidValue {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn native<O: Into<String>, M: Into<String>>(operation: O, message: M) -> Self {
        Self::Native {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub(crate) fn region_parse<I: Into<String>, R: Into<String>>(input: I, reason: R) -> Self {
        Self::RegionParse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parameter_parse<K, V, R>(key: K, value: V, reason: R) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        Self::ParameterParse {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Errors from external collaborators that callers turn into
    /// "feature unavailable" instead of propagating.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            ExtError::Io(_) | ExtError::Native { .. } | ExtError::Component { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ExtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degradable_classification() {
        let io = ExtError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(io.is_degradable());
        assert!(ExtError::native("setCustomParameters", "driver rejected parameters").is_degradable());
        assert!(!ExtError::region_parse("(1,2)", "expected 5 fields").is_degradable());
        assert!(!ExtError::NotInitialized.is_degradable());
    }

    #[test]
    fn test_error_messages() {
        let err = ExtError::parameter_parse("nv-saturation", "abc", "invalid digit");
        assert_eq!(
            err.to_string(),
            "Cannot parse parameter nv-saturation='abc': invalid digit"
        );

        let err = ExtError::invalid_value("raw dump flag", "must fit in 3 bits");
        assert_eq!(
            err.to_string(),
            "Invalid value for raw dump flag: must fit in 3 bits"
        );
    }
}
