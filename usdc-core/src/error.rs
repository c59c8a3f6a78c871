//! Error taxonomy for the crate-file codec (see the error handling design
//! section of the project's specification documents).

use std::fmt;

/// The six failure categories the codec can surface. Every variant is
/// converted into the workspace's shared [`usdc_base::Error`] at the point
/// it's raised, so callers only ever see one `Result` type.
#[derive(Debug)]
pub enum CrateError {
    /// A caller-supplied value doesn't match any encodable `ValueType`.
    TypeUnsupported { type_name: &'static str },
    /// A read ran off the end of the byte source.
    ShortRead { context: &'static str, needed: usize, got: usize },
    /// Boot header magic, version, or TOC offset failed validation.
    MalformedHeader { detail: String },
    /// A representation word decoded to an invalid type tag or an
    /// INLINE/ARRAY/COMPRESSED combination §4.4 never produces.
    MalformedRepresentation { detail: String },
    /// LZ4 or the int-pack codec failed to inflate a block, or the
    /// inflated size didn't match what the section header promised.
    CompressionFailure { detail: String },
    /// An array's declared element count doesn't fit the remaining bytes.
    PayloadMismatch { expected: usize, actual: usize },
}

impl fmt::Display for CrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrateError::TypeUnsupported { type_name } => {
                write!(f, "value type unsupported: {type_name}")
            }
            CrateError::ShortRead { context, needed, got } => {
                write!(f, "short read in {context}: needed {needed} bytes, got {got}")
            }
            CrateError::MalformedHeader { detail } => {
                write!(f, "malformed boot header: {detail}")
            }
            CrateError::MalformedRepresentation { detail } => {
                write!(f, "malformed representation word: {detail}")
            }
            CrateError::CompressionFailure { detail } => {
                write!(f, "compression failure: {detail}")
            }
            CrateError::PayloadMismatch { expected, actual } => {
                write!(f, "payload mismatch: expected {expected} bytes, found {actual}")
            }
        }
    }
}

impl std::error::Error for CrateError {}

// usdc_base::Error carries a blanket `From<E: std::error::Error + Send +
// Sync + 'static>` impl, so `CrateError` converts with plain `?` at call
// sites without a bespoke `From` here.

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn display_mentions_category() {
        let e = CrateError::TypeUnsupported { type_name: "quatf" };
        assert!(e.to_string().contains("quatf"));
    }
}
