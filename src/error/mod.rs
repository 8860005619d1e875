//! Error handling for sync-readable.
//!
//! Errors raised by the wrapped factory or its source stream are never
//! converted: they travel through the proxy as the caller's own error type.
//! [`SyncReadableError`] only covers failures of the adapter machinery itself.

mod conversions;
pub mod types;

pub use types::*;
