#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed source data or limit configuration.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Non-finite or otherwise unusable reading values.
    #[error("Invalid input: {0}")]
    Input(String),
}
