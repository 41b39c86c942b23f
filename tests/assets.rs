use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use blockgame_assets::store::{FsStore, ListOptions, Listing, MemoryStore, ObjectStore, Payload, PutOptions};
use blockgame_assets::{AssetService, QueryParams, StoreError, app};
use bytes::Bytes;
use http::{StatusCode, header};
use http_body_util::BodyExt;
use tokio::sync::Barrier;

const INVALID: &str = r#"{"error":"Missing or invalid platform or arch query parameters"}"#;
const INTERNAL: &str = r#"{"error":"Internal Server Error"}"#;

/// Wraps a [`MemoryStore`], counting calls and optionally failing them.
#[derive(Default)]
struct TestStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    fail_get: bool,
    fail_list_prefix: Option<&'static str>,
    fail_put: bool,
    omit_objects: bool,
}

impl TestStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for TestStore {
    async fn get(&self, path: &str) -> Result<Option<Payload>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get {
            return Err(StoreError::Backend("get refused".into()));
        }
        self.inner.get(path).await
    }

    async fn list(&self, opts: ListOptions) -> Result<Listing, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list_prefix == Some(opts.prefix.as_str()) {
            return Err(StoreError::Backend("list refused".into()));
        }
        if self.omit_objects {
            return Ok(Listing { objects: None });
        }
        self.inner.list(opts).await
    }

    async fn put(&self, path: &str, body: Bytes, opts: PutOptions) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put {
            return Err(StoreError::Backend("put refused".into()));
        }
        self.inner.put(path, body, opts).await
    }
}

struct Reply {
    status: StatusCode,
    headers: http::HeaderMap,
    body: Bytes,
}

async fn get(store: Arc<dyn ObjectStore>, uri: &str) -> Reply {
    let router = app(AssetService::new(store));
    let req = http::Request::builder().uri(uri).body(()).unwrap();
    let res = router.dispatch(req).await;
    let (parts, body) = res.into_parts();
    Reply {
        status: parts.status,
        headers: parts.headers,
        body: body.collect().await.unwrap().to_bytes(),
    }
}

fn seeded() -> TestStore {
    let store = TestStore::default();
    store.inner.insert("libs/common/a.so", "a").unwrap();
    store.inner.insert("libs/windows-x64/b.dll", "b").unwrap();
    store.inner.insert("libs/windows-x64/", "").unwrap();
    store
}

const WINDOWS_X64_LISTING: &str = concat!(
    r#"[{"name":"a.so","url":"https://assets.blockgame.james090500.com/libs/common/a.so"},"#,
    r#"{"name":"b.dll","url":"https://assets.blockgame.james090500.com/libs/windows-x64/b.dll"}]"#,
);

#[tokio::test]
async fn missing_parameters_are_rejected_without_store_access() {
    for uri in [
        "/api/assets",
        "/api/assets?platform=linux",
        "/api/assets?arch=x64",
        "/api/assets?platform=&arch=x64",
    ] {
        let store = Arc::new(TestStore::default());
        let reply = get(store.clone(), uri).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(reply.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(reply.body, INVALID);
        assert_eq!(store.calls(), 0, "{uri} touched the store");
    }
}

#[tokio::test]
async fn disallowed_combination_is_rejected() {
    let store = Arc::new(TestStore::default());
    let reply = get(store.clone(), "/api/assets?platform=linux&arch=x86").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body, INVALID);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn cache_hit_returns_stored_bytes_with_cache_control() {
    let cached = r#"[{"name":"a.so","url":"https://assets.blockgame.james090500.com/libs/common/a.so"}]"#;
    let store = MemoryStore::new();
    store.insert("libs/linux-x64.json", cached).unwrap();
    // Would change the listing if it were regenerated.
    store.insert("libs/common/other.jar", "x").unwrap();

    let reply = get(Arc::new(store), "/api/assets?platform=linux&arch=x64").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(reply.headers[header::CACHE_CONTROL], "public, max-age=3600");
    assert_eq!(reply.body, cached);
}

#[tokio::test]
async fn cache_miss_generates_filters_and_persists() {
    let store = Arc::new(seeded());
    let reply = get(store.clone(), "/api/assets?platform=windows&arch=x64").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[header::CONTENT_TYPE], "application/json");
    // Only listings read back from the store carry Cache-Control.
    assert!(reply.headers.get(header::CACHE_CONTROL).is_none());
    assert_eq!(reply.body, WINDOWS_X64_LISTING);

    assert_eq!(store.inner.body("libs/windows-x64.json").unwrap(), WINDOWS_X64_LISTING);
    assert_eq!(store.inner.content_type("libs/windows-x64.json").as_deref(), Some("application/json"));
}

#[tokio::test]
async fn second_request_is_served_from_cache_with_same_body() {
    let store: Arc<dyn ObjectStore> = Arc::new(seeded());
    let first = get(store.clone(), "/api/assets?platform=windows&arch=x64").await;
    let second = get(store, "/api/assets?platform=windows&arch=x64").await;

    assert_eq!(first.body, second.body);
    assert!(first.headers.get(header::CACHE_CONTROL).is_none());
    assert_eq!(second.headers[header::CACHE_CONTROL], "public, max-age=3600");
}

#[tokio::test]
async fn variant_with_no_assets_yields_empty_array() {
    let store = Arc::new(TestStore::default());
    let reply = get(store.clone(), "/api/assets?platform=macos&arch=arm64").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "[]");
    assert_eq!(store.inner.body("libs/macos-arm64.json").unwrap(), "[]");
}

#[tokio::test]
async fn listing_without_objects_field_is_treated_as_empty() {
    let store = Arc::new(TestStore { omit_objects: true, ..Default::default() });
    let reply = get(store, "/api/assets?platform=linux&arch=x64").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "[]");
}

#[tokio::test]
async fn put_failure_is_generic_500() {
    let store = Arc::new(TestStore { fail_put: true, ..seeded() });
    let reply = get(store.clone(), "/api/assets?platform=windows&arch=x64").await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(reply.body, INTERNAL);
    assert!(store.inner.body("libs/windows-x64.json").is_none());
}

#[tokio::test]
async fn one_failed_listing_fails_the_request() {
    let store = Arc::new(TestStore { fail_list_prefix: Some("libs/windows-x64/"), ..seeded() });
    let reply = get(store, "/api/assets?platform=windows&arch=x64").await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body, INTERNAL);
}

/// Holds every `list` call until a second one arrives.
struct RendezvousStore {
    inner: MemoryStore,
    barrier: Barrier,
}

#[async_trait]
impl ObjectStore for RendezvousStore {
    async fn get(&self, path: &str) -> Result<Option<Payload>, StoreError> {
        self.inner.get(path).await
    }

    async fn list(&self, opts: ListOptions) -> Result<Listing, StoreError> {
        self.barrier.wait().await;
        self.inner.list(opts).await
    }

    async fn put(&self, path: &str, body: Bytes, opts: PutOptions) -> Result<(), StoreError> {
        self.inner.put(path, body, opts).await
    }
}

#[tokio::test]
async fn prefix_listings_are_issued_concurrently() {
    let store = RendezvousStore { inner: MemoryStore::new(), barrier: Barrier::new(2) };
    store.inner.insert("libs/common/a.so", "a").unwrap();
    store.inner.insert("libs/windows-x64/b.dll", "b").unwrap();

    // Sequential listings would park the first call on the barrier forever.
    let reply = tokio::time::timeout(
        Duration::from_secs(2),
        get(Arc::new(store), "/api/assets?platform=windows&arch=x64"),
    )
    .await
    .expect("listings ran one after the other");

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, WINDOWS_X64_LISTING);
}

#[tokio::test]
async fn get_failure_is_generic_500() {
    let store = Arc::new(TestStore { fail_get: true, ..Default::default() });
    let reply = get(store, "/api/assets?platform=linux&arch=x64").await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body, INTERNAL);
}

#[tokio::test]
async fn filesystem_cache_hit_is_streamed_through() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("libs/common")).unwrap();
    std::fs::create_dir_all(dir.path().join("libs/linux-x64/natives")).unwrap();
    std::fs::write(dir.path().join("libs/common/lwjgl.jar"), b"jar").unwrap();
    std::fs::write(dir.path().join("libs/linux-x64/natives/liblwjgl.so"), b"so").unwrap();
    let store: Arc<dyn ObjectStore> = Arc::new(FsStore::new(dir.path()));

    let fresh = get(store.clone(), "/api/assets?platform=linux&arch=x64").await;
    assert_eq!(
        fresh.body,
        concat!(
            r#"[{"name":"lwjgl.jar","url":"https://assets.blockgame.james090500.com/libs/common/lwjgl.jar"},"#,
            r#"{"name":"liblwjgl.so","url":"https://assets.blockgame.james090500.com/libs/linux-x64/natives/liblwjgl.so"}]"#,
        )
    );
    assert!(dir.path().join("libs/linux-x64.json").is_file());

    let cached = get(store, "/api/assets?platform=linux&arch=x64").await;
    assert_eq!(cached.status, StatusCode::OK);
    assert_eq!(cached.headers[header::CACHE_CONTROL], "public, max-age=3600");
    assert_eq!(cached.body, fresh.body);
}

#[tokio::test]
async fn respond_accepts_parameters_parsed_from_a_full_url() {
    let service = AssetService::new(Arc::new(seeded()))
        .with_base_url("https://cdn.example.com/")
        .with_cache_max_age(60);
    let query = QueryParams::from_url("https://example.com/api/assets?platform=windows&arch=x64").unwrap();

    let res = service.respond(&query).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body = res.into_inner().into_body().collect().await.unwrap().to_bytes();
    assert_eq!(
        body,
        concat!(
            r#"[{"name":"a.so","url":"https://cdn.example.com/libs/common/a.so"},"#,
            r#"{"name":"b.dll","url":"https://cdn.example.com/libs/windows-x64/b.dll"}]"#,
        )
    );

    let cached = service.respond(&query).await;
    assert_eq!(cached.headers()[header::CACHE_CONTROL], "public, max-age=60");
}

#[tokio::test]
async fn health_endpoints() {
    let live = get(Arc::new(MemoryStore::new()), "/healthz").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, r#"{"status":"ok"}"#);

    let ready = get(Arc::new(MemoryStore::new()), "/readyz").await;
    assert_eq!(ready.status, StatusCode::OK);

    let broken = TestStore { fail_list_prefix: Some("libs/common/"), ..Default::default() };
    let not_ready = get(Arc::new(broken), "/readyz").await;
    assert_eq!(not_ready.status, StatusCode::SERVICE_UNAVAILABLE);
}
