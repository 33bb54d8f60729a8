/// Convenience alias used across the crate.
pub type ReelcastResult<T> = Result<T, ReelcastError>;

/// Error taxonomy for loading, compositing, capturing and orchestrating a render.
#[derive(thiserror::Error, Debug)]
pub enum ReelcastError {
    /// Malformed input values.
    #[error("validation error: {0}")]
    Validation(String),

    /// A render was rejected before any recording started.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The authoritative duration was non-finite or non-positive.
    #[error("invalid audio duration: {0}")]
    InvalidAudioDuration(f64),

    /// A resource could not be fetched or decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The recorder or encoder failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// The drawing surface failed.
    #[error("render error: {0}")]
    Render(String),

    /// The generative collaborator failed.
    #[error("generation error: {0}")]
    Generation(String),

    /// Anything else, with its source chain preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelcastError {
    /// Build a [`ReelcastError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelcastError::Precondition`].
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Build a [`ReelcastError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`ReelcastError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ReelcastError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelcastError::Generation`].
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Return `true` for failures that abort a render before recording starts.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_) | Self::InvalidAudioDuration(_))
    }
}
