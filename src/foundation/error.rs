pub type CardResult<T> = Result<T, CardError>;

/// Errors raised by the card export pipeline, the camera collaborator and the fireworks engine.
///
/// Only `ImageLoadTimeout` and `CameraUnavailable` are recoverable inside the library; the
/// export entry points report everything else to the user and return it to the caller.
#[derive(thiserror::Error, Debug)]
pub enum CardError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("export surface unavailable: {0}")]
    ExportSurfaceUnavailable(String),

    #[error("image load timed out after {timeout_ms} ms")]
    ImageLoadTimeout { timeout_ms: u64 },

    #[error("rasterization failed: {0}")]
    Rasterization(String),

    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("an export is already in progress")]
    ExportInProgress,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CardError {
    pub fn camera_unavailable(msg: impl Into<String>) -> Self {
        Self::CameraUnavailable(msg.into())
    }

    pub fn surface_unavailable(msg: impl Into<String>) -> Self {
        Self::ExportSurfaceUnavailable(msg.into())
    }

    pub fn rasterization(msg: impl Into<String>) -> Self {
        Self::Rasterization(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Message shown to the user: the underlying failure without the category prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::CameraUnavailable(m)
            | Self::ExportSurfaceUnavailable(m)
            | Self::Rasterization(m)
            | Self::Encoding(m)
            | Self::Validation(m) => m.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
