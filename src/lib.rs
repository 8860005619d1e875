//! sync-readable
//!
//! Turns a function that returns a future of a stream into a function that
//! returns a stream immediately.
//!
//! Some APIs need a stream at call time even though the real stream is only
//! known after an asynchronous step (opening a file, connecting, negotiating).
//! [`sync_readable`] bridges the gap: every call returns a [`ProxyStream`]
//! synchronously, and the proxy forwards the real source once the factory's
//! future resolves. Failures never escape the call; they arrive as errors on
//! the proxy.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use serde_json::json;
//! use sync_readable::{sync_readable, Source, StreamEvent};
//!
//! let open = sync_readable(|values: Vec<serde_json::Value>| async move {
//!     Ok::<_, std::io::Error>(Source::objects(futures::stream::iter(values.into_iter().map(Ok))))
//! });
//!
//! let events: Vec<_> = open(vec![json!(42), json!("foo")]).events().collect().await;
//! assert_eq!(events.last(), Some(&StreamEvent::Close));
//! ```
#![deny(unsafe_code)]

pub mod adapter;
pub mod chunk;
pub mod error;
pub mod options;
pub mod proxy;
pub mod readable;

pub use adapter::{Adapter, sync_readable};
pub use chunk::Chunk;
pub use error::{Result, SyncReadableError};
pub use options::{AdapterOptions, Driver, StreamOptions};
pub use proxy::{Events, ProxyHandle, ProxyStream, StreamEvent};
pub use readable::{Readable, Source};
