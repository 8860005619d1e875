//! The buffering pipe shared by a proxy and its pump.
//!
//! The pump writes chunks and terminal events in; the proxy reads events out.
//! Every terminal transition (end, source failure, destroy) is taken at most
//! once, and each one queues exactly one `Close`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use futures_util::future::poll_fn;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::chunk::{Chunk, measure};
use crate::error::{Result, SyncReadableError};
use crate::options::StreamOptions;
use crate::proxy::StreamEvent;

struct Shared<T, E> {
    // Each event carries the buffer size it was charged on push.
    queue: VecDeque<(StreamEvent<T, E>, usize)>,
    buffered: usize,
    readable: StreamOptions,
    writable: StreamOptions,
    ended: bool,
    destroyed: bool,
    closed: bool,
    read_waker: Option<Waker>,
    write_waker: Option<Waker>,
}

impl<T, E> Shared<T, E> {
    fn capacity(&self) -> usize {
        self.readable
            .high_water_mark
            .saturating_add(self.writable.high_water_mark)
    }

    fn terminated(&self) -> bool {
        self.ended || self.destroyed
    }

    fn check_writable(&self) -> Result<()> {
        if self.ended {
            return Err(SyncReadableError::WriteAfterEnd);
        }
        if self.destroyed {
            return Err(SyncReadableError::Destroyed);
        }
        Ok(())
    }

    fn take_wakers(&mut self) -> [Option<Waker>; 2] {
        [self.read_waker.take(), self.write_waker.take()]
    }
}

fn wake_all(wakers: [Option<Waker>; 2]) {
    for waker in wakers.into_iter().flatten() {
        waker.wake();
    }
}

pub(crate) struct Pipe<T, E> {
    shared: Arc<Mutex<Shared<T, E>>>,
    token: CancellationToken,
}

impl<T, E> Clone for Pipe<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            token: self.token.clone(),
        }
    }
}

impl<T, E> Pipe<T, E> {
    pub(crate) fn new(readable: StreamOptions, writable: StreamOptions) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                queue: VecDeque::new(),
                buffered: 0,
                readable,
                writable,
                ended: false,
                destroyed: false,
                closed: false,
                read_waker: None,
                write_waker: None,
            })),
            token: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared<T, E>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn readable_state(&self) -> StreamOptions {
        self.lock().readable
    }

    pub(crate) fn writable_state(&self) -> StreamOptions {
        self.lock().writable
    }

    pub(crate) fn set_readable_state(&self, options: StreamOptions) {
        let wakers = {
            let mut shared = self.lock();
            shared.readable = options;
            shared.take_wakers()
        };
        wake_all(wakers);
    }

    pub(crate) fn set_writable_state(&self, options: StreamOptions) {
        let wakers = {
            let mut shared = self.lock();
            shared.writable = options;
            shared.take_wakers()
        };
        wake_all(wakers);
    }

    /// Overwrite both sides with the source's settings.
    pub(crate) fn attach(&self, readable: StreamOptions, writable: StreamOptions) {
        let wakers = {
            let mut shared = self.lock();
            shared.readable = readable;
            shared.writable = writable;
            shared.take_wakers()
        };
        wake_all(wakers);
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }

    pub(crate) fn is_ended(&self) -> bool {
        self.lock().ended
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Resolves once the pipe reached a terminal state.
    pub(crate) fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Bytes (or objects) currently buffered.
    pub(crate) fn buffered(&self) -> usize {
        self.lock().buffered
    }

    fn poll_write_ready(&self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        let mut shared = self.lock();
        if let Err(err) = shared.check_writable() {
            return Poll::Ready(Err(err));
        }
        // One chunk is always admitted into an empty buffer.
        if shared.buffered == 0 || shared.buffered < shared.capacity() {
            return Poll::Ready(Ok(()));
        }
        shared.write_waker = Some(cx.waker().clone());
        Poll::Pending
    }

    /// Queue `Error` (if any) and `Close`, discarding buffered chunks.
    ///
    /// Returns `false` if the pipe already ended or was destroyed.
    pub(crate) fn destroy(&self, error: Option<E>) -> bool {
        let wakers = {
            let mut shared = self.lock();
            if shared.terminated() {
                return false;
            }
            shared.destroyed = true;
            shared.queue.clear();
            shared.buffered = 0;
            if let Some(error) = error {
                shared.queue.push_back((StreamEvent::Error(error), 0));
            }
            shared.queue.push_back((StreamEvent::Close, 0));
            shared.take_wakers()
        };
        self.token.cancel();
        wake_all(wakers);
        true
    }

    /// Queue `Error` and `Close` behind the chunks already forwarded.
    pub(crate) fn fail(&self, error: E) -> bool {
        self.terminate(Some(error), false)
    }

    /// Queue `End` and `Close` behind the chunks already forwarded.
    pub(crate) fn finish(&self) -> bool {
        self.terminate(None, true)
    }

    fn terminate(&self, error: Option<E>, end: bool) -> bool {
        let wakers = {
            let mut shared = self.lock();
            if shared.terminated() {
                return false;
            }
            if end {
                shared.ended = true;
                shared.queue.push_back((StreamEvent::End, 0));
            } else {
                shared.destroyed = true;
            }
            if let Some(error) = error {
                shared.queue.push_back((StreamEvent::Error(error), 0));
            }
            shared.queue.push_back((StreamEvent::Close, 0));
            shared.take_wakers()
        };
        self.token.cancel();
        wake_all(wakers);
        true
    }

    pub(crate) fn poll_event(&self, cx: &mut Context<'_>) -> Poll<Option<StreamEvent<T, E>>> {
        let (event, writer) = {
            let mut shared = self.lock();
            match shared.queue.pop_front() {
                Some((event, size)) => {
                    shared.buffered = shared.buffered.saturating_sub(size);
                    if matches!(event, StreamEvent::Close) {
                        shared.closed = true;
                    }
                    (event, shared.write_waker.take())
                }
                None if shared.closed => return Poll::Ready(None),
                None => {
                    shared.read_waker = Some(cx.waker().clone());
                    return Poll::Pending;
                }
            }
        };
        if let Some(waker) = writer {
            waker.wake();
        }
        Poll::Ready(Some(event))
    }
}

impl<T: Chunk, E> Pipe<T, E> {
    fn push(&self, chunk: T) -> Result<()> {
        let reader = {
            let mut shared = self.lock();
            shared.check_writable()?;
            let object_mode = shared.readable.object_mode;
            let size = measure(&chunk, object_mode);
            // Empty byte chunks carry no data.
            if size == 0 && !object_mode {
                return Ok(());
            }
            shared.buffered += size;
            shared.queue.push_back((StreamEvent::Data(chunk), size));
            shared.read_waker.take()
        };
        if let Some(waker) = reader {
            waker.wake();
        }
        Ok(())
    }

    /// Wait for buffer room, then queue `chunk`.
    pub(crate) async fn write(&self, chunk: T) -> Result<()> {
        poll_fn(|cx| self.poll_write_ready(cx)).await?;
        self.push(chunk)
    }
}
