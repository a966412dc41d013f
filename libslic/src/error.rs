use thiserror::Error;

/// Result type for SLIC operations
pub type Result<T> = std::result::Result<T, SlicError>;

/// Errors that can occur when segmenting an image
#[derive(Error, Debug)]
pub enum SlicError {
    #[error("Invalid input image: {width}x{height} (dimensions must be non-zero)")]
    InvalidInput { width: u32, height: u32 },

    #[error("Invalid parameter: {name} = {value} (must be positive and finite; spacing may give at most {max} clusters)", max = crate::MAX_CLUSTERS)]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A segmentation is already in flight for this session")]
    Busy,

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),
}

impl SlicError {
    /// Returns true if the call was rejected while validating its arguments
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::InvalidParameter { .. })
    }

    /// Returns true if retrying the same request later may succeed
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Busy | Self::TaskFailed(_))
    }
}
