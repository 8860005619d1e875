//! Adapter
//!
//! Turns a factory returning a future of a stream into a function that
//! returns a [`ProxyStream`] immediately.
//!
//! Each call invokes the factory synchronously, wraps its future in a pump and
//! hands the pump to the configured [`Driver`]. The pump awaits the future,
//! copies the source's settings onto the proxy and forwards chunks until the
//! source ends, fails or the proxy is destroyed. A rejected future destroys
//! the proxy with the rejection error.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use sync_readable::{sync_readable, Source};
//!
//! let open = sync_readable(|name: String| async move {
//!     let chunks = fetch_chunks(&name).await?;
//!     Ok::<_, MyError>(Source::new(futures::stream::iter(chunks)))
//! });
//!
//! // Returned before `fetch_chunks` has even started.
//! let mut stream = open("report".to_string());
//! while let Some(chunk) = stream.next().await {
//!     handle(chunk?);
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{FutureExt, StreamExt, TryStreamExt};
use tokio::runtime::Handle;
use tracing::Instrument;

use crate::chunk::Chunk;
use crate::options::{AdapterOptions, Driver};
use crate::proxy::{Pipe, ProxyStream};
use crate::readable::Readable;

static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(1);

/// Wraps a stream factory so that calls return a [`ProxyStream`] right away.
#[derive(Debug, Clone)]
pub struct Adapter<F> {
    factory: F,
    options: AdapterOptions,
}

impl<F> Adapter<F> {
    pub fn new(factory: F) -> Self {
        Self::with_options(factory, AdapterOptions::default())
    }

    pub fn with_options(factory: F, options: AdapterOptions) -> Self {
        Self { factory, options }
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// Invoke the factory with `args` and return the proxy for its stream.
    ///
    /// Never blocks and never fails: a rejected future or a failing source
    /// surfaces as an error on the returned proxy.
    pub fn call<A, Fut, R>(&self, args: A) -> ProxyStream<R::Ok, R::Error>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<R, R::Error>> + Send + 'static,
        R: Readable + Send + 'static,
        R::Ok: Chunk + Send + 'static,
        R::Error: Send + 'static,
    {
        let call_id = NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed);
        let span = tracing::debug_span!("sync_readable", call = call_id);
        let pipe = Pipe::new(self.options.readable, self.options.writable);

        let future = span.in_scope(|| {
            tracing::debug!("invoking factory");
            (self.factory)(args)
        });
        let pump = pump(future, pipe.clone()).instrument(span).boxed();

        match self.spawn_handle() {
            Some(handle) => {
                drop(handle.spawn(pump));
                ProxyStream::new(pipe, None)
            }
            None => ProxyStream::new(pipe, Some(pump)),
        }
    }

    fn spawn_handle(&self) -> Option<Handle> {
        match &self.options.driver {
            Driver::Auto => match Handle::try_current() {
                Ok(handle) => Some(handle),
                Err(_) => {
                    tracing::debug!("no tokio runtime, pump will be polled by the proxy");
                    None
                }
            },
            Driver::Runtime(handle) => Some(handle.clone()),
            Driver::Inline => None,
        }
    }
}

/// Wrap `factory` with default options; see [`Adapter`].
pub fn sync_readable<F, A, Fut, R>(factory: F) -> impl Fn(A) -> ProxyStream<R::Ok, R::Error>
where
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<R, R::Error>> + Send + 'static,
    R: Readable + Send + 'static,
    R::Ok: Chunk + Send + 'static,
    R::Error: Send + 'static,
{
    let adapter = Adapter::new(factory);
    move |args| adapter.call(args)
}

// Destroys the pipe if the pump is dropped before reaching a terminal state,
// e.g. when its runtime shuts down.
struct PumpGuard<T, E>(Pipe<T, E>);

impl<T, E> Drop for PumpGuard<T, E> {
    fn drop(&mut self) {
        if self.0.destroy(None) {
            tracing::debug!("pump dropped before the proxy closed");
        }
    }
}

// The guard is built before the first poll so an unpolled pump still closes
// the proxy when it is dropped.
fn pump<Fut, R>(future: Fut, pipe: Pipe<R::Ok, R::Error>) -> impl Future<Output = ()>
where
    Fut: Future<Output = Result<R, R::Error>>,
    R: Readable,
    R::Ok: Chunk,
{
    let guard = PumpGuard(pipe);
    async move {
        let pipe = &guard.0;

        // The factory's future always runs to completion, even for a destroyed proxy.
        let source = match future.await {
            Ok(source) => source,
            Err(error) => {
                tracing::debug!("factory rejected");
                pipe.destroy(Some(error));
                return;
            }
        };
        if pipe.is_destroyed() {
            tracing::trace!("proxy destroyed before the source resolved");
            return;
        }

        let readable = source.readable_state();
        let writable = source.writable_state();
        pipe.attach(readable, writable);
        tracing::debug!(
            readable.high_water_mark = readable.high_water_mark,
            readable.object_mode = readable.object_mode,
            writable.high_water_mark = writable.high_water_mark,
            writable.object_mode = writable.object_mode,
            "source attached"
        );

        let mut source = Box::pin(source.into_stream());
        loop {
            let next = tokio::select! {
                biased;
                _ = pipe.cancelled() => {
                    tracing::trace!("proxy destroyed, dropping source");
                    return;
                }
                next = source.next() => next,
            };
            match next {
                Some(Ok(chunk)) => {
                    if let Err(err) = pipe.write(chunk).await {
                        tracing::trace!(%err, "stopped forwarding");
                        return;
                    }
                }
                Some(Err(error)) => {
                    tracing::debug!("source errored");
                    pipe.fail(error);
                    return;
                }
                None => {
                    tracing::debug!("source exhausted");
                    pipe.finish();
                    return;
                }
            }
        }
    }
}
