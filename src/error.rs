use std::fmt;

use crate::bag::BagError;
use crate::codec::CodecError;

/// Error type for accessor and migration operations.
///
/// Decode and legacy-parse failures are logged and degraded to "no data";
/// only host failures and encode failures reach the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropsError {
    Bag(BagError),
    Codec(CodecError),
}

impl fmt::Display for PropsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropsError::Bag(err) => write!(f, "host bag error: {}", err),
            PropsError::Codec(err) => write!(f, "codec error: {}", err),
        }
    }
}

impl std::error::Error for PropsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PropsError::Bag(err) => Some(err),
            PropsError::Codec(err) => Some(err),
        }
    }
}

impl From<BagError> for PropsError {
    fn from(err: BagError) -> Self {
        PropsError::Bag(err)
    }
}

impl From<CodecError> for PropsError {
    fn from(err: CodecError) -> Self {
        PropsError::Codec(err)
    }
}
