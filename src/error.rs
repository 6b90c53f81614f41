//! Error types for filter operations.

use thiserror::Error;

use crate::engine::FilterKind;

/// Error type for filter operations.
///
/// Every variant except [`FilterError::WorkerPanicked`] is raised before any
/// worker thread is started.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Filter name did not match any known kind.
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    /// Worker count must be at least one.
    #[error("invalid worker count: {0}")]
    InvalidWorkers(usize),

    /// Buffer length does not match `width * height`.
    #[error("size mismatch: expected {expected} pixels, got {actual}")]
    SizeMismatch {
        /// Pixel count implied by the dimensions.
        expected: usize,
        /// Pixel count actually supplied.
        actual: usize,
    },

    /// `width * height` does not fit in `usize`.
    #[error("image dimensions overflow")]
    DimensionOverflow,

    /// Kernel divisor evaluated to zero for the given parameter.
    #[error("{0} kernel has a zero factor")]
    ZeroFactor(FilterKind),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Worker threads could not be started.
    #[error("failed to start worker threads: {0}")]
    ThreadPool(String),

    /// A worker thread panicked; segments that finished stay written.
    #[error("worker thread panicked")]
    WorkerPanicked,
}

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Checks that `len` matches `width * height`, returning the pixel count.
pub(crate) fn check_dimensions(len: usize, width: usize, height: usize) -> FilterResult<usize> {
    let expected = width
        .checked_mul(height)
        .ok_or(FilterError::DimensionOverflow)?;
    if len != expected {
        return Err(FilterError::SizeMismatch {
            expected,
            actual: len,
        });
    }
    Ok(expected)
}
