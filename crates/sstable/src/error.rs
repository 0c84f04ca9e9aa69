use thiserror::Error;

/// Errors produced by the block codecs and the format layer.
///
/// `Truncated` means the input ended before a declared length; `Corrupt`
/// means the length was satisfied but a structural check failed. Builder
/// misuse (out-of-order keys) is rejected deterministically with
/// `KeyOrder`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Input shorter than the structure it claims to contain.
    #[error("truncated {0}")]
    Truncated(&'static str),

    /// Integrity or structure check failed on sufficiently long input.
    #[error("corrupt block: {0}")]
    Corrupt(&'static str),

    /// A builder was given keys that are not strictly increasing.
    #[error("keys must be added in strictly increasing order")]
    KeyOrder,
}
