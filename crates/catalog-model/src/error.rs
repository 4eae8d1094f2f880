//! Error types for catalog domain values

/// Errors parsing a program path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Path string is empty
    #[error("program path is empty")]
    Empty,

    /// Path contains an empty segment (`"1..2"`)
    #[error("program path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Segment contains whitespace
    #[error("invalid path segment: '{0}'")]
    InvalidSegment(String),
}

/// Errors converting domain values to and from their stored form
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Program path could not be parsed
    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    /// Profile attributes did not match the profile kind
    #[error("invalid {kind} attributes: {source}")]
    ProfileAttributes {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ModelError {
    /// Create a profile attribute error for a kind
    pub fn profile_attributes(kind: &'static str, source: serde_json::Error) -> Self {
        Self::ProfileAttributes { kind, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_error_display() {
        let err = PathError::EmptySegment("1..2".to_string());
        assert_eq!(err.to_string(), "program path '1..2' contains an empty segment");
    }

    #[test]
    fn path_error_converts() {
        let err: ModelError = PathError::Empty.into();
        assert!(matches!(err, ModelError::Path(PathError::Empty)));
    }
}
