/// Result alias that carries the custom [`EngineError`] type.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Common error type for the core crate.
///
/// Every variant except the I/O wrappers is a contract violation raised at the
/// call that broke the contract. Nothing in the engine clamps bad input into a
/// "close enough" value.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A component was constructed or reconfigured with values it cannot
    /// operate on, e.g. a non-positive loop length.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A segment declaration was rejected. The builder is left unchanged.
    #[error("invalid segment [{from}, {to}): {reason}")]
    InvalidSegment { from: f64, to: f64, reason: String },
    /// A modulator slot index outside `[0, capacity)`.
    #[error("slot index {index} out of range for capacity {capacity}")]
    IndexOutOfRange { index: usize, capacity: usize },
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration files that fail to parse.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Creates an [`EngineError::InvalidConfiguration`] from any message.
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub(crate) fn segment<T: Into<String>>(from: f64, to: f64, reason: T) -> Self {
        Self::InvalidSegment {
            from,
            to,
            reason: reason.into(),
        }
    }
}
