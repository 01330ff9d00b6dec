#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Not-found error that never reveals whether the entity exists under
    /// another owner.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = CoreError::not_found("Calibration", "abc");
        assert_eq!(err.to_string(), "Calibration not found: abc");
    }

    #[test]
    fn validation_display() {
        let err = CoreError::Validation("fps must be finite".into());
        assert_eq!(err.to_string(), "Validation failed: fps must be finite");
    }
}
