//! Error kinds shared by the whole engine.
use thiserror::Error;

/// Errors raised by the core engine. Construction-time failures leave the
/// owning collection unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Negative sizes, out-of-range indices or mismatched fitness dimensions.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Unknown tag or statistic id on a strict operation.
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// Duplicate tag or statistic id on a strict add.
    #[error("already exists: {0}")]
    AlreadyExists(&'static str),

    /// Operation not applicable to the target in its current configuration.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// Numeric parameter outside its documented range.
    #[error("out of range: {0}")]
    OutOfRange(&'static str),

    /// A fixed-size resource has no free entries to hand out.
    #[error("exhausted: {0}")]
    Exhausted(&'static str),
}

pub type Result<T> = std::result::Result<T, CoreError>;
