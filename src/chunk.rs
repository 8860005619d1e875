//! Chunk measurement
//!
//! A proxy buffers chunks until its high-water mark is reached. In byte mode
//! the buffer level is the sum of [`Chunk::chunk_len`]; in object mode every
//! chunk counts as one and this trait's length is ignored.

use bytes::Bytes;

/// A value that can travel through a proxy stream.
///
/// The default length is 1, so object-like types only need an empty impl:
///
/// ```rust,ignore
/// impl sync_readable::Chunk for MyEvent {}
/// ```
pub trait Chunk {
    /// Size of the chunk when the stream is in byte mode.
    fn chunk_len(&self) -> usize {
        1
    }
}

/// Buffer size of `chunk` under the given mode.
pub(crate) fn measure<T: Chunk>(chunk: &T, object_mode: bool) -> usize {
    if object_mode { 1 } else { chunk.chunk_len() }
}

impl Chunk for Bytes {
    fn chunk_len(&self) -> usize {
        self.len()
    }
}

impl Chunk for Vec<u8> {
    fn chunk_len(&self) -> usize {
        self.len()
    }
}

impl Chunk for Box<[u8]> {
    fn chunk_len(&self) -> usize {
        self.len()
    }
}

impl Chunk for &'static [u8] {
    fn chunk_len(&self) -> usize {
        self.len()
    }
}

impl Chunk for String {
    fn chunk_len(&self) -> usize {
        self.len()
    }
}

impl Chunk for &'static str {
    fn chunk_len(&self) -> usize {
        self.len()
    }
}

// Values behave like objects even outside object mode.
impl Chunk for serde_json::Value {}

macro_rules! scalar_chunk {
    ($($ty:ty),* $(,)?) => {
        $(impl Chunk for $ty {})*
    };
}

scalar_chunk!(
    bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);
