//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when working with the middleware protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Record text does not follow the `TAG;key=value;...` shape.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A recognized record is missing a required field.
    #[error("missing field `{field}` in {tag} record")]
    MissingField {
        /// Record tag.
        tag: &'static str,
        /// The missing field key.
        field: &'static str,
    },

    /// A field value could not be parsed.
    #[error("invalid value `{value}` for field `{field}`")]
    InvalidField {
        /// The field key.
        field: String,
        /// The offending value.
        value: String,
    },

    /// A complete frame was not valid UTF-8.
    #[error("invalid UTF-8 in frame")]
    InvalidUtf8,

    /// The receive buffer grew past the configured cap without a separator.
    #[error("frame too large: maximum {max} bytes, got {actual}")]
    FrameTooLarge {
        /// Maximum allowed length.
        max: usize,
        /// Buffered length when the cap was hit.
        actual: usize,
    },
}
