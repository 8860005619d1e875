//! Event view of a proxy stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use futures::stream::FusedStream;

use crate::proxy::ProxyStream;

/// Everything a proxy emits, in emission order.
///
/// A proxy emits any number of `Data`, then either `End` (clean source
/// exhaustion) or at most one `Error`, and finally exactly one `Close`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent<T, E> {
    /// A chunk forwarded from the source.
    Data(T),
    /// The source was exhausted.
    End,
    /// The factory or the source failed, or the proxy was destroyed with an error.
    Error(E),
    /// Terminal event; nothing follows it.
    Close,
}

impl<T, E> StreamEvent<T, E> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Close)
    }
}

/// Stream of [`StreamEvent`]s, see [`ProxyStream::events`].
#[derive(Debug)]
pub struct Events<T, E> {
    proxy: ProxyStream<T, E>,
}

impl<T, E> Events<T, E> {
    pub(crate) fn new(proxy: ProxyStream<T, E>) -> Self {
        Self { proxy }
    }

    /// The proxy this view reads from.
    pub fn get_ref(&self) -> &ProxyStream<T, E> {
        &self.proxy
    }

    pub fn into_inner(self) -> ProxyStream<T, E> {
        self.proxy
    }
}

impl<T, E> Stream for Events<T, E> {
    type Item = StreamEvent<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().proxy.poll_event(cx)
    }
}

impl<T, E> FusedStream for Events<T, E> {
    fn is_terminated(&self) -> bool {
        self.proxy.is_terminated()
    }
}
