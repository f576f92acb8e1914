use thiserror::Error;

/// Errors surfaced by the engine's public entry points.
///
/// Only structurally invalid input is rejected; in-range values are tiered
/// or clamped by the components themselves, and a missing mastery record is
/// handled by zero-initialization rather than an error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

impl EngineError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_the_field() {
        let err = EngineError::validation("timeSpentSecs", "must be non-negative");
        assert_eq!(
            err.to_string(),
            "invalid timeSpentSecs: must be non-negative"
        );
    }
}
