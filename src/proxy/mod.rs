//! Proxy Stream
//!
//! The stream handed to the caller before the real source exists. A proxy
//! is a buffering pipe: its pump (spawned or polled inline) writes the
//! source's chunks in, and the caller reads them out either as a plain
//! `Stream<Item = Result<T, E>>` or as [`StreamEvent`]s via [`ProxyStream::events`].

mod events;
mod pipe;

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures::Stream;
use futures::future::BoxFuture;
use futures::stream::FusedStream;

use crate::options::StreamOptions;
use crate::readable::Readable;

pub use events::{Events, StreamEvent};
pub(crate) use pipe::Pipe;

/// Stream returned synchronously by an [`Adapter`](crate::Adapter).
///
/// Yields `Ok(chunk)` for each forwarded chunk and `Err(e)` when the factory
/// or the source fails, then ends. Dropping the proxy destroys it, which
/// stops forwarding and releases the source.
pub struct ProxyStream<T, E> {
    pipe: Pipe<T, E>,
    // Present only when the pump is polled inline.
    pump: Option<BoxFuture<'static, ()>>,
}

impl<T, E> ProxyStream<T, E> {
    pub(crate) fn new(pipe: Pipe<T, E>, pump: Option<BoxFuture<'static, ()>>) -> Self {
        Self { pipe, pump }
    }

    /// Destroy the proxy.
    ///
    /// The first call discards buffered chunks and queues `Error(error)` (when
    /// given) followed by `Close`; they are delivered on the next poll, never
    /// inside this call. Later calls, or calls after the proxy already ended,
    /// do nothing. Always returns `self`.
    pub fn destroy(&self, error: Option<E>) -> &Self {
        if self.pipe.destroy(error) {
            tracing::trace!("proxy destroyed");
        }
        self
    }

    /// `true` once the proxy was destroyed or its source failed.
    pub fn is_destroyed(&self) -> bool {
        self.pipe.is_destroyed()
    }

    /// `true` once the source was exhausted.
    pub fn is_ended(&self) -> bool {
        self.pipe.is_ended()
    }

    /// Amount currently buffered, in bytes or objects depending on the mode.
    pub fn buffered(&self) -> usize {
        self.pipe.buffered()
    }

    /// Current readable settings.
    pub fn readable_state(&self) -> StreamOptions {
        self.pipe.readable_state()
    }

    /// Current writable settings.
    pub fn writable_state(&self) -> StreamOptions {
        self.pipe.writable_state()
    }

    /// Change the readable settings. Overwritten when the source attaches.
    pub fn set_readable_state(&self, options: StreamOptions) -> &Self {
        self.pipe.set_readable_state(options);
        self
    }

    /// Change the writable settings. Overwritten when the source attaches.
    pub fn set_writable_state(&self, options: StreamOptions) -> &Self {
        self.pipe.set_writable_state(options);
        self
    }

    /// A cloneable handle that can destroy this proxy from anywhere.
    pub fn handle(&self) -> ProxyHandle<T, E> {
        ProxyHandle {
            pipe: self.pipe.clone(),
        }
    }

    /// Switch to the event view, which also reports `End` and `Close`.
    pub fn events(self) -> Events<T, E> {
        Events::new(self)
    }

    pub(crate) fn poll_event(&mut self, cx: &mut Context<'_>) -> Poll<Option<StreamEvent<T, E>>> {
        if let Some(pump) = self.pump.as_mut()
            && pump.as_mut().poll(cx).is_ready()
        {
            self.pump = None;
        }
        self.pipe.poll_event(cx)
    }
}

impl<T, E> fmt::Debug for ProxyStream<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyStream")
            .field("readable", &self.readable_state())
            .field("writable", &self.writable_state())
            .field("destroyed", &self.is_destroyed())
            .field("ended", &self.is_ended())
            .field("inline", &self.pump.is_some())
            .finish()
    }
}

impl<T, E> Drop for ProxyStream<T, E> {
    fn drop(&mut self) {
        self.pipe.destroy(None);
    }
}

impl<T, E> Stream for ProxyStream<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match ready!(this.poll_event(cx)) {
                Some(StreamEvent::Data(chunk)) => return Poll::Ready(Some(Ok(chunk))),
                Some(StreamEvent::Error(error)) => return Poll::Ready(Some(Err(error))),
                Some(StreamEvent::End) => continue,
                Some(StreamEvent::Close) | None => return Poll::Ready(None),
            }
        }
    }
}

impl<T, E> FusedStream for ProxyStream<T, E> {
    fn is_terminated(&self) -> bool {
        self.pipe.is_closed()
    }
}

impl<T, E> Readable for ProxyStream<T, E> {
    fn readable_state(&self) -> StreamOptions {
        self.pipe.readable_state()
    }

    fn writable_state(&self) -> StreamOptions {
        self.pipe.writable_state()
    }
}

/// Shareable destroy handle for a [`ProxyStream`].
pub struct ProxyHandle<T, E> {
    pipe: Pipe<T, E>,
}

impl<T, E> Clone for ProxyHandle<T, E> {
    fn clone(&self) -> Self {
        Self {
            pipe: self.pipe.clone(),
        }
    }
}

impl<T, E> fmt::Debug for ProxyHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyHandle")
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl<T, E> ProxyHandle<T, E> {
    /// Same as [`ProxyStream::destroy`]; returns `true` if this call destroyed the proxy.
    pub fn destroy(&self, error: Option<E>) -> bool {
        let destroyed = self.pipe.destroy(error);
        if destroyed {
            tracing::trace!("proxy destroyed through handle");
        }
        destroyed
    }

    pub fn is_destroyed(&self) -> bool {
        self.pipe.is_destroyed()
    }
}
