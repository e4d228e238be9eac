mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use common::{FakeTransport, OK_HELLO};
use http_body_util::{BodyExt, Empty};
use pkgfetch_client::{ConnectionPool, FetchStats, PoolKey, PooledConnection, Transport};

fn pool(transport: &Arc<FakeTransport>) -> (ConnectionPool, Arc<FetchStats>) {
    let stats = Arc::new(FetchStats::new());
    let transport: Arc<dyn Transport> = Arc::clone(transport) as Arc<dyn Transport>;
    let pool = ConnectionPool::new(transport, Arc::clone(&stats));
    (pool, stats)
}

fn key(host: &str) -> PoolKey {
    PoolKey::new(host, 80, None, false)
}

/// Push one request through and drain the canned reply.
async fn round_trip(conn: &mut PooledConnection) {
    let request = http::Request::builder()
        .uri("/")
        .header(http::header::HOST, conn.key().host.as_str())
        .body(Empty::<Bytes>::new())
        .expect("request");
    let response = conn.send(request).await.expect("send");
    let body = response.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(&body[..], b"hello");
}

#[tokio::test]
async fn released_connection_is_reused() {
    let transport = Arc::new(FakeTransport::new(OK_HELLO));
    let (pool, stats) = pool(&transport);

    let mut first = pool.acquire(&key("a.test")).await.expect("acquire");
    assert!(!first.is_reused());
    round_trip(&mut first).await;
    let id = first.id();
    pool.release(first);
    assert_eq!(pool.idle_count(), 1);

    let mut second = pool.acquire(&key("a.test")).await.expect("acquire");
    assert!(second.is_reused());
    assert_eq!(second.id(), id);
    round_trip(&mut second).await;
    pool.release(second);

    assert_eq!(transport.connects(), 1);
    assert_eq!(transport.requests().len(), 2);
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.connections_opened, 1);
    assert_eq!(snapshot.connections_reused, 1);
}

#[tokio::test]
async fn keys_get_separate_connections() {
    let transport = Arc::new(FakeTransport::new(OK_HELLO));
    let (pool, _) = pool(&transport);

    let a = pool.acquire(&key("a.test")).await.expect("acquire a");
    let b = pool.acquire(&key("b.test")).await.expect("acquire b");
    assert_ne!(a.id(), b.id());
    assert_eq!(transport.connects(), 2);
    pool.release(a);
    pool.release(b);
    assert_eq!(pool.idle_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_never_share_a_connection() {
    let transport = Arc::new(FakeTransport::new(OK_HELLO).delay(Duration::from_millis(5)));
    let (pool, _) = pool(&transport);
    let pool = Arc::new(pool);
    let holders = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let holders = Arc::clone(&holders);
            let overlaps = Arc::clone(&overlaps);
            tokio::spawn(async move {
                for _ in 0..5 {
                    let mut conn = pool.acquire(&key("shared.test")).await.expect("acquire");
                    if holders.fetch_add(1, Ordering::SeqCst) > 0 {
                        overlaps.fetch_add(1, Ordering::SeqCst);
                    }
                    round_trip(&mut conn).await;
                    holders.fetch_sub(1, Ordering::SeqCst);
                    pool.release(conn);
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.expect("worker");
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(transport.connects(), 1);
    assert_eq!(transport.requests().len(), 40);
}

#[tokio::test]
async fn checkout_timeout_opens_a_pool_external_connection() {
    let transport = Arc::new(FakeTransport::new(OK_HELLO));
    let (pool, _) = pool(&transport);
    let pool = pool.with_checkout_timeout(Some(Duration::from_millis(20)));

    let held = pool.acquire(&key("busy.test")).await.expect("acquire");
    let extra = pool.acquire(&key("busy.test")).await.expect("fallback");
    assert!(held.is_pooled());
    assert!(!extra.is_pooled());
    assert_ne!(held.id(), extra.id());

    // Only the pooled connection is kept
    pool.release(extra);
    assert_eq!(pool.idle_count(), 0);
    pool.release(held);
    assert_eq!(pool.idle_count(), 1);
}

#[tokio::test]
async fn waiting_caller_gets_the_released_connection() {
    let transport = Arc::new(FakeTransport::new(OK_HELLO));
    let (pool, _) = pool(&transport);
    let pool = Arc::new(pool);

    let held = pool.acquire(&key("wait.test")).await.expect("acquire");
    let id = held.id();

    let waiter = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            let conn = pool.acquire(&key("wait.test")).await.expect("acquire after wait");
            (conn.id(), conn.is_reused())
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());
    pool.release(held);

    assert_eq!(waiter.await.expect("waiter"), (id, true));
    assert_eq!(transport.connects(), 1);
}

#[tokio::test]
async fn discarded_connection_is_replaced() {
    let transport = Arc::new(FakeTransport::new(OK_HELLO));
    let (pool, stats) = pool(&transport);

    let conn = pool.acquire(&key("a.test")).await.expect("acquire");
    pool.discard(conn);
    assert_eq!(pool.idle_count(), 0);

    let conn = pool.acquire(&key("a.test")).await.expect("acquire");
    assert!(!conn.is_reused());
    drop(conn);

    assert_eq!(transport.connects(), 2);
    assert_eq!(stats.snapshot().connections_discarded, 1);
}

#[tokio::test]
async fn discarding_the_last_connection_forgets_the_key() {
    let transport = Arc::new(FakeTransport::new(OK_HELLO));
    let (pool, _) = pool(&transport);

    for n in 0..20 {
        let conn = pool
            .acquire(&key(&format!("host{n}.test")))
            .await
            .expect("acquire");
        pool.discard(conn);
    }
    assert_eq!(pool.slot_count(), 0);
}

#[tokio::test]
async fn close_all_drops_idle_connections() {
    let transport = Arc::new(FakeTransport::new(OK_HELLO));
    let (pool, _) = pool(&transport);

    for host in ["a.test", "b.test", "c.test"] {
        let conn = pool.acquire(&key(host)).await.expect("acquire");
        pool.release(conn);
    }
    let busy = pool.acquire(&key("a.test")).await.expect("acquire");

    assert_eq!(pool.close_all(), 2);
    assert_eq!(pool.idle_count(), 0);
    // Only the slot still checked out survives
    assert_eq!(pool.slot_count(), 1);

    pool.release(busy);
    assert_eq!(pool.idle_count(), 1);
}

#[tokio::test]
async fn failed_connect_frees_the_slot() {
    let transport = Arc::new(FakeTransport::new(OK_HELLO));
    let (pool, _) = pool(&transport);

    transport.fail_next("connection refused");
    let err = pool
        .acquire(&key("flaky.test"))
        .await
        .expect_err("first connect fails");
    assert!(err.is_connect());

    let conn = pool.acquire(&key("flaky.test")).await.expect("slot is free again");
    assert!(!conn.is_reused());
    assert_eq!(transport.keys().len(), 2);
}

#[tokio::test]
async fn peer_closed_idle_connection_is_not_reused() {
    let transport = Arc::new(FakeTransport::new(OK_HELLO).replies_per_connection(0));
    let (pool, stats) = pool(&transport);

    let mut conn = pool.acquire(&key("flaky.test")).await.expect("acquire");
    let request = http::Request::builder()
        .uri("/")
        .body(Empty::<Bytes>::new())
        .expect("request");
    let err = conn.send(request).await.expect_err("peer hung up");
    assert!(err.is_incomplete_message() || err.is_canceled() || err.is_closed());

    pool.discard(conn);
    let conn = pool.acquire(&key("flaky.test")).await.expect("acquire");
    assert!(!conn.is_reused());
    assert_eq!(stats.snapshot().connections_opened, 2);
}
