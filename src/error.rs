use alloc::string::String;
use enough::StopReason;

use crate::codec::{CodecError, DecodePath};

/// Errors from surface management, decoding and drawing.
///
/// Every failure is reported to the immediate caller only. A failed update
/// is meant to be dropped; none of these errors leave a surface in a state
/// that must not be painted, except where noted on the operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RasterError {
    #[error("allocation of {0} bytes failed")]
    AllocationFailure(usize),

    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("{path:?} decode failed: {source}")]
    DecodeFailure {
        path: DecodePath,
        #[source]
        source: CodecError,
    },

    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for RasterError {
    fn from(r: StopReason) -> Self {
        RasterError::Cancelled(r)
    }
}

impl RasterError {
    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        RasterError::PreconditionViolation(msg.into())
    }
}
