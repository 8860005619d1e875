//! End-to-end tests for sync_readable: forwarding, failure propagation and
//! settings propagation through the proxy.

#[path = "support/stream_fixture.rs"]
mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use serde_json::json;
use sync_readable::{Adapter, ProxyStream, Source, StreamEvent, StreamOptions, sync_readable};
use tokio::sync::oneshot;

use support::{Boom, VecSource};

#[tokio::test]
async fn emits_data_from_the_input_stream() {
    let expected = vec![json!(42), json!("foo"), json!({ "bar": "baz" })];

    let proxy = sync_readable(support::data_source_async::<serde_json::Value>)(expected.clone());

    let events: Vec<_> = proxy.events().collect().await;
    let mut want: Vec<_> = expected.into_iter().map(StreamEvent::Data).collect();
    want.push(StreamEvent::End);
    want.push(StreamEvent::Close);
    assert_eq!(events, want);
}

#[tokio::test]
async fn result_view_yields_chunks_in_order() {
    let proxy = sync_readable(support::data_source_async::<u32>)(vec![1, 2, 3]);
    let items: Vec<Result<u32, Boom>> = proxy.collect().await;
    assert_eq!(items, vec![Ok(1), Ok(2), Ok(3)]);
}

#[tokio::test]
async fn errors_if_the_input_stream_errors() {
    let proxy = sync_readable(support::error_source_async::<u32>)(Boom("Boom!"));

    let mut events = proxy.events();
    assert_eq!(events.next().await, Some(StreamEvent::Error(Boom("Boom!"))));
    assert_eq!(events.next().await, Some(StreamEvent::Close));
    assert_eq!(events.next().await, None);
    assert_eq!(events.next().await, None);
    assert!(events.get_ref().is_destroyed());
}

#[tokio::test]
async fn errors_if_the_asynchronous_function_rejects() {
    let proxy = sync_readable(support::reject::<u32>)(Boom("Boom!"));

    let events: Vec<_> = proxy.events().collect().await;
    assert_eq!(
        events,
        vec![StreamEvent::Error(Boom("Boom!")), StreamEvent::Close]
    );
}

#[tokio::test]
async fn source_error_follows_forwarded_chunks() {
    let proxy = sync_readable(|_: ()| async {
        let items = vec![Ok(1u32), Ok(2), Err(Boom("late")), Ok(3)];
        Ok::<_, Boom>(Source::objects(stream::iter(items)))
    })(());

    let items: Vec<_> = proxy.collect().await;
    assert_eq!(items, vec![Ok(1), Ok(2), Err(Boom("late"))]);
}

#[tokio::test]
async fn proxy_is_returned_before_the_source_resolves() {
    let open = sync_readable(|rx: oneshot::Receiver<VecSource<u32>>| async move {
        rx.await.map_err(|_| Boom("sender dropped"))
    });
    let (tx, rx) = oneshot::channel();
    let mut proxy = open(rx);

    assert!(futures::poll!(proxy.next()).is_pending());
    assert_eq!(ProxyStream::buffered(&proxy), 0);
    assert!(!proxy.is_destroyed());

    assert!(tx.send(support::vec_source(vec![7])).is_ok());
    assert_eq!(proxy.next().await, Some(Ok(7)));
    assert_eq!(proxy.next().await, None);
    assert!(proxy.is_ended());
}

#[tokio::test]
async fn copies_source_settings_on_attach() {
    let readable = StreamOptions::builder()
        .object_mode(true)
        .high_water_mark(4)
        .build();
    let writable = StreamOptions::builder().high_water_mark(64).build();

    let mut proxy = sync_readable(move |_: ()| async move {
        let items = vec![Ok::<_, Boom>(Bytes::from_static(b"abc"))];
        Ok::<_, Boom>(
            Source::new(stream::iter(items))
                .with_readable_state(readable)
                .with_writable_state(writable),
        )
    })(());

    assert_eq!(proxy.readable_state(), StreamOptions::default());
    proxy.set_readable_state(StreamOptions::objects());

    assert_eq!(proxy.next().await, Some(Ok(Bytes::from_static(b"abc"))));
    assert_eq!(proxy.readable_state(), readable);
    assert_eq!(proxy.writable_state(), writable);
}

#[tokio::test(start_paused = true)]
async fn pump_waits_at_the_high_water_mark() {
    let produced = Arc::new(AtomicUsize::new(0));
    let counter = produced.clone();
    let mut proxy = sync_readable(move |_: ()| {
        let counter = counter.clone();
        async move {
            let items = stream::iter(0u32..).map(move |n| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Boom>(n)
            });
            let one = StreamOptions::builder().object_mode(true).high_water_mark(1).build();
            Ok::<_, Boom>(
                Source::new(items)
                    .with_readable_state(one)
                    .with_writable_state(one),
            )
        }
    })(());

    tokio::time::sleep(Duration::from_millis(20)).await;
    // Two chunks buffered, a third pulled and waiting for room.
    assert_eq!(ProxyStream::buffered(&proxy), 2);
    assert_eq!(produced.load(Ordering::SeqCst), 3);

    assert_eq!(proxy.next().await, Some(Ok(0)));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(ProxyStream::buffered(&proxy), 2);
    assert_eq!(produced.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn byte_chunks_are_forwarded_unchanged() {
    let proxy = sync_readable(|parts: Vec<&'static str>| async move {
        let chunks: Vec<Result<Bytes, Boom>> =
            parts.into_iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))).collect();
        Ok::<_, Boom>(Source::new(stream::iter(chunks)))
    })(vec!["hello ", "world"]);

    let body: Vec<u8> = proxy
        .map(|chunk| chunk.unwrap().to_vec())
        .concat()
        .await;
    assert_eq!(body, b"hello world");
}

#[tokio::test]
async fn proxies_can_be_adapted_again() {
    let inner = sync_readable(support::data_source_async::<u32>);
    let outer = sync_readable(move |items: Vec<u32>| {
        let proxy = inner(items);
        async move { Ok::<_, Boom>(proxy) }
    });

    let items: Vec<_> = outer(vec![5, 6]).collect().await;
    assert_eq!(items, vec![Ok(5), Ok(6)]);
}

#[tokio::test]
async fn calls_are_independent() {
    let adapter = Adapter::new(support::data_source_async::<u32>);

    let first = adapter.call(vec![1, 2]);
    let second = adapter.call(vec![3]);
    let rejected = sync_readable(support::reject::<u32>)(Boom("only me"));

    let (a, b, c) = tokio::join!(
        first.collect::<Vec<_>>(),
        second.collect::<Vec<_>>(),
        rejected.collect::<Vec<_>>()
    );
    assert_eq!(a, vec![Ok(1), Ok(2)]);
    assert_eq!(b, vec![Ok(3)]);
    assert_eq!(c, vec![Err(Boom("only me"))]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn works_on_a_multi_thread_runtime() {
    let proxy = sync_readable(support::data_source_async::<String>)(vec![
        "a".to_string(),
        "b".to_string(),
    ]);
    let events: Vec<_> = proxy.events().collect().await;
    assert_eq!(
        events,
        vec![
            StreamEvent::Data("a".to_string()),
            StreamEvent::Data("b".to_string()),
            StreamEvent::End,
            StreamEvent::Close,
        ]
    );
}
