//! Test fixtures: timed and failing sources for driving adapters
#![allow(dead_code)]

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::Stream;
use futures::stream;
use sync_readable::Source;

/// Error used by fixtures; compared by message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boom(pub &'static str);

impl fmt::Display for Boom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for Boom {}

/// An object-mode source over a fixed list, with no delays.
pub type VecSource<T> = Source<stream::Iter<std::vec::IntoIter<Result<T, Boom>>>>;

pub fn vec_source<T>(items: Vec<T>) -> VecSource<T> {
    let items: Vec<Result<T, Boom>> = items.into_iter().map(Ok).collect();
    Source::objects(stream::iter(items))
}

/// An object-mode source that emits one item per millisecond, then ends.
pub fn data_source<T: Send + 'static>(
    items: Vec<T>,
) -> Source<impl Stream<Item = Result<T, Boom>> + Send + 'static> {
    Source::objects(async_stream::stream! {
        for item in items {
            tokio::time::sleep(Duration::from_millis(1)).await;
            yield Ok(item);
        }
    })
}

pub async fn data_source_async<T: Send + 'static>(
    items: Vec<T>,
) -> Result<Source<impl Stream<Item = Result<T, Boom>> + Send + 'static>, Boom> {
    Ok(data_source(items))
}

/// A source that fails with `error` on its first poll after a yield.
pub fn error_source<T: Send + 'static>(
    error: Boom,
) -> Source<impl Stream<Item = Result<T, Boom>> + Send + 'static> {
    Source::objects(async_stream::stream! {
        tokio::task::yield_now().await;
        yield Err::<T, Boom>(error);
    })
}

pub async fn error_source_async<T: Send + 'static>(
    error: Boom,
) -> Result<Source<impl Stream<Item = Result<T, Boom>> + Send + 'static>, Boom> {
    Ok(error_source::<T>(error))
}

pub async fn reject<T>(error: Boom) -> Result<VecSource<T>, Boom> {
    Err(error)
}

/// Sets its flag when dropped; tie it to a source to observe release.
pub struct DropFlag(pub Arc<AtomicBool>);

impl DropFlag {
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (Self(flag.clone()), flag)
    }
}

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// A source that never yields and reports when it is dropped.
pub fn pending_source<T: Send + 'static>(
    flag: DropFlag,
) -> Source<impl Stream<Item = Result<T, Boom>> + Send + 'static> {
    Source::objects(async_stream::stream! {
        let _flag = flag;
        let item: Result<T, Boom> = futures::future::pending().await;
        yield item;
    })
}
