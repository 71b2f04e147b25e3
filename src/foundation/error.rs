/// Convenience result type used across quantum-brush.
pub type BrushResult<T> = Result<T, BrushError>;

/// Top-level error taxonomy used by the stroke pipeline.
#[derive(thiserror::Error, Debug)]
pub enum BrushError {
    /// Malformed outbound payload, rejected before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// The effect service rejected the request, returned a structured error, or could not be
    /// reached at all.
    #[error("remote error: {0}")]
    Remote(String),

    /// Local raster decode/encode/render failure.
    #[error("composition error: {0}")]
    Composition(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Invalid client or CLI configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BrushError {
    /// Build a [`BrushError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BrushError::Remote`] value.
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Build a [`BrushError::Composition`] value.
    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    /// Build a [`BrushError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`BrushError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The bare, user-facing message without the category prefix.
    ///
    /// Remote messages are surfaced verbatim, so this is what gets stored on a failed stroke.
    pub fn message(&self) -> String {
        match self {
            Self::Validation(m)
            | Self::Remote(m)
            | Self::Composition(m)
            | Self::Serde(m)
            | Self::Config(m) => m.clone(),
            Self::Other(e) => format!("{e:#}"),
        }
    }
}

impl From<reqwest::Error> for BrushError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::remote("effect service request timed out");
        }
        if err.is_decode() {
            return Self::remote(format!("failed to decode effect service response: {err}"));
        }
        Self::remote(format!("effect service unreachable: {err}"))
    }
}

impl From<image::ImageError> for BrushError {
    fn from(err: image::ImageError) -> Self {
        Self::composition(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
