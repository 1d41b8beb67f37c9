/// Crate-wide result alias.
pub type PointCloudResult<T> = Result<T, PointCloudError>;

#[derive(thiserror::Error, Debug)]
/// Error kinds surfaced by sampling, simulation, and painting.
pub enum PointCloudError {
    /// Markup could not be read or parsed.
    #[error("load error: {0}")]
    Load(String),

    /// Configuration or scene input is out of range.
    #[error("validation error: {0}")]
    Validation(String),

    /// Painting or encoding a frame failed.
    #[error("render error: {0}")]
    Render(String),

    /// The surface was used after teardown.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PointCloudError {
    /// Build a [`PointCloudError::Load`].
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build a [`PointCloudError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PointCloudError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PointCloudError::Lifecycle`].
    pub fn lifecycle(msg: impl Into<String>) -> Self {
        Self::Lifecycle(msg.into())
    }
}
