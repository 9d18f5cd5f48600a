#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A spend request exceeded the spendable balance.
///
/// This is a business outcome, not an infrastructure failure: callers are
/// expected to surface it to the user and must not retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Insufficient balance: requested {requested}, available {available}")]
pub struct InsufficientBalance {
    pub requested: u32,
    pub available: u32,
}
