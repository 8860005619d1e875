//! Readable sources
//!
//! [`Readable`] is what a factory must resolve to: a fallible stream that can
//! also report its flow-control settings. [`Source`] attaches settings to any
//! plain `TryStream`.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, TryStream};
use pin_project_lite::pin_project;

use crate::options::StreamOptions;

/// A fallible stream that exposes its readable and writable settings.
///
/// When a proxy attaches to a source it copies both settings, so downstream
/// consumers see the same flow control as the real source.
pub trait Readable: TryStream {
    /// Readable-side settings.
    fn readable_state(&self) -> StreamOptions {
        StreamOptions::default()
    }

    /// Writable-side settings.
    fn writable_state(&self) -> StreamOptions {
        StreamOptions::default()
    }
}

pin_project! {
    /// A `TryStream` paired with explicit stream settings.
    #[derive(Debug)]
    pub struct Source<S> {
        #[pin]
        inner: S,
        readable: StreamOptions,
        writable: StreamOptions,
    }
}

impl<S> Source<S> {
    /// Wrap a stream with default (byte-mode) settings.
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            readable: StreamOptions::default(),
            writable: StreamOptions::default(),
        }
    }

    /// Wrap a stream in object mode on both sides.
    pub fn objects(stream: S) -> Self {
        Self {
            inner: stream,
            readable: StreamOptions::objects(),
            writable: StreamOptions::objects(),
        }
    }

    pub fn with_readable_state(mut self, options: StreamOptions) -> Self {
        self.readable = options;
        self
    }

    pub fn with_writable_state(mut self, options: StreamOptions) -> Self {
        self.writable = options;
        self
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, T, E> Stream for Source<S>
where
    S: Stream<Item = Result<T, E>>,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S, T, E> Readable for Source<S>
where
    S: Stream<Item = Result<T, E>>,
{
    fn readable_state(&self) -> StreamOptions {
        self.readable
    }

    fn writable_state(&self) -> StreamOptions {
        self.writable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn source_reports_settings_and_forwards() {
        let items: Vec<Result<u32, ()>> = vec![Ok(1), Ok(2)];
        let source = Source::objects(futures::stream::iter(items))
            .with_writable_state(StreamOptions::default());
        assert_eq!(source.readable_state(), StreamOptions::objects());
        assert_eq!(source.writable_state(), StreamOptions::default());

        let collected: Vec<u32> = source.try_collect().await.unwrap();
        assert_eq!(collected, vec![1, 2]);
    }
}
