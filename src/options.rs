//! Stream and adapter options
//!
//! [`StreamOptions`] describes the flow-control settings of one side of a
//! stream. [`AdapterOptions`] configures how an [`Adapter`](crate::Adapter)
//! builds and drives its proxies.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sync_readable::{AdapterOptions, StreamOptions};
//!
//! let options = AdapterOptions::builder()
//!     .readable(StreamOptions::objects())
//!     .build();
//!
//! let from_json = AdapterOptions::from_json(r#"{ "readable": { "objectMode": true } }"#)?;
//! assert_eq!(options.readable, from_json.readable);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default high-water mark for byte-mode streams, in bytes.
pub const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024;

/// Default high-water mark for object-mode streams, in chunks.
pub const DEFAULT_OBJECT_HIGH_WATER_MARK: usize = 16;

/// Flow-control settings for one side of a stream.
///
/// In byte mode the buffer is measured with [`Chunk::chunk_len`](crate::Chunk::chunk_len);
/// in object mode every chunk counts as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawStreamOptions")]
pub struct StreamOptions {
    /// Buffer level at which writers start waiting.
    #[serde(rename = "highWaterMark")]
    pub high_water_mark: usize,
    /// Whether chunks are counted as objects instead of bytes.
    #[serde(rename = "objectMode")]
    pub object_mode: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            object_mode: false,
        }
    }
}

impl StreamOptions {
    /// Create a new builder for StreamOptions
    pub fn builder() -> StreamOptionsBuilder {
        StreamOptionsBuilder::default()
    }

    /// Object-mode options with the default object high-water mark.
    pub fn objects() -> Self {
        Self {
            high_water_mark: DEFAULT_OBJECT_HIGH_WATER_MARK,
            object_mode: true,
        }
    }
}

// Wire form: a missing high-water mark depends on the mode.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStreamOptions {
    #[serde(default, alias = "high_water_mark")]
    high_water_mark: Option<usize>,
    #[serde(default, alias = "object_mode")]
    object_mode: bool,
}

impl From<RawStreamOptions> for StreamOptions {
    fn from(raw: RawStreamOptions) -> Self {
        StreamOptions::builder()
            .object_mode(raw.object_mode)
            .maybe_high_water_mark(raw.high_water_mark)
            .build()
    }
}

/// Builder for StreamOptions
#[derive(Debug, Default)]
pub struct StreamOptionsBuilder {
    high_water_mark: Option<usize>,
    object_mode: Option<bool>,
}

impl StreamOptionsBuilder {
    /// Set the high-water mark
    pub fn high_water_mark(mut self, high_water_mark: usize) -> Self {
        self.high_water_mark = Some(high_water_mark);
        self
    }

    fn maybe_high_water_mark(mut self, high_water_mark: Option<usize>) -> Self {
        self.high_water_mark = high_water_mark;
        self
    }

    /// Enable or disable object mode
    pub fn object_mode(mut self, object_mode: bool) -> Self {
        self.object_mode = Some(object_mode);
        self
    }

    /// Build the options. An unset high-water mark follows the mode's default.
    pub fn build(self) -> StreamOptions {
        let object_mode = self.object_mode.unwrap_or(false);
        let default_mark = if object_mode {
            DEFAULT_OBJECT_HIGH_WATER_MARK
        } else {
            DEFAULT_HIGH_WATER_MARK
        };
        StreamOptions {
            high_water_mark: self.high_water_mark.unwrap_or(default_mark),
            object_mode,
        }
    }
}

/// Where the pump of each proxy runs.
#[derive(Debug, Clone, Default)]
pub enum Driver {
    /// Spawn on the current tokio runtime, or poll inline when there is none.
    #[default]
    Auto,
    /// Spawn on the given runtime.
    Runtime(tokio::runtime::Handle),
    /// Poll the pump from the proxy's own `poll_next`.
    Inline,
}

/// Configuration for an [`Adapter`](crate::Adapter)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdapterOptions {
    /// Readable options a proxy starts with, until its source attaches
    pub readable: StreamOptions,
    /// Writable options a proxy starts with, until its source attaches
    pub writable: StreamOptions,
    /// How proxies are driven
    #[serde(skip)]
    pub driver: Driver,
}

impl AdapterOptions {
    /// Create a new builder for AdapterOptions
    pub fn builder() -> AdapterOptionsBuilder {
        AdapterOptionsBuilder::default()
    }

    /// Parse options from JSON. The driver always stays [`Driver::Auto`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builder for AdapterOptions
#[derive(Debug, Default)]
pub struct AdapterOptionsBuilder {
    readable: Option<StreamOptions>,
    writable: Option<StreamOptions>,
    driver: Option<Driver>,
}

impl AdapterOptionsBuilder {
    /// Set the initial readable options
    pub fn readable(mut self, options: StreamOptions) -> Self {
        self.readable = Some(options);
        self
    }

    /// Set the initial writable options
    pub fn writable(mut self, options: StreamOptions) -> Self {
        self.writable = Some(options);
        self
    }

    /// Set the driver
    pub fn driver(mut self, driver: Driver) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Build the configuration
    pub fn build(self) -> AdapterOptions {
        AdapterOptions {
            readable: self.readable.unwrap_or_default(),
            writable: self.writable.unwrap_or_default(),
            driver: self.driver.unwrap_or_default(),
        }
    }
}
