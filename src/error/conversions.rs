//! Type Conversions for SyncReadableError

use super::types::SyncReadableError;

impl From<serde_json::Error> for SyncReadableError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidOptions(err.to_string())
    }
}
