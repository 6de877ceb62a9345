use lantern::http::request::{Method, Request, RequestBuilder};
use lantern::http::response::{Response, StatusCode};
use lantern::routing::{Route, Router, route};
use lantern::store::BlobStore;

mod common;
use common::{BrokenStore, MemoryStore};

/// Routes and handles a request the same way a connection does.
async fn serve<S: BlobStore>(router: &Router<S>, request: &Request) -> Response {
    let route = router.route(request);
    router.handle(&route, request).await
}

#[test]
fn test_route_root_is_exact() {
    assert_eq!(route(&Method::GET, "/"), Route::Root);
    assert_eq!(route(&Method::GET, "//"), Route::NotFound);
}

#[test]
fn test_route_echo_remainder() {
    assert_eq!(route(&Method::GET, "/echo/foo"), Route::Echo("foo".to_string()));
    assert_eq!(route(&Method::GET, "/echo/"), Route::Echo(String::new()));
    assert_eq!(
        route(&Method::GET, "/echo/a/b%20c"),
        Route::Echo("a/b%20c".to_string())
    );
    assert_eq!(route(&Method::GET, "/echo"), Route::NotFound);
}

#[test]
fn test_route_user_agent_prefix() {
    assert_eq!(route(&Method::GET, "/user-agent"), Route::UserAgent);
    assert_eq!(route(&Method::GET, "/user-agent/extra"), Route::UserAgent);
    assert_eq!(route(&Method::GET, "/User-Agent"), Route::NotFound);
}

#[test]
fn test_route_files_by_method() {
    assert_eq!(
        route(&Method::GET, "/files/report.txt"),
        Route::FileGet("report.txt".to_string())
    );
    assert_eq!(
        route(&Method::POST, "/files/report.txt"),
        Route::FilePost("report.txt".to_string())
    );
    assert_eq!(route(&Method::GET, "/files"), Route::NotFound);
}

#[test]
fn test_route_method_partitions_table() {
    assert_eq!(route(&Method::POST, "/"), Route::NotFound);
    assert_eq!(route(&Method::POST, "/echo/foo"), Route::NotFound);
    assert_eq!(
        route(&Method::Other("PUT".to_string()), "/files/a"),
        Route::NotFound
    );
    assert_eq!(route(&Method::GET, "/unknown/path"), Route::NotFound);
}

#[test]
fn test_router_route_uses_request_method_and_path() {
    let router = Router::new(MemoryStore::default());
    let request = RequestBuilder::new()
        .method(Method::POST)
        .path("/files/upload.bin")
        .build()
        .unwrap();

    assert_eq!(
        router.route(&request),
        Route::FilePost("upload.bin".to_string())
    );
}

#[tokio::test]
async fn test_handle_user_agent() {
    let router = Router::new(MemoryStore::default());
    let request = RequestBuilder::new()
        .method(Method::GET)
        .path("/user-agent")
        .header("User-Agent", "xyz/1.0")
        .build()
        .unwrap();

    let response = serve(&router, &request).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"xyz/1.0".to_vec());
    assert_eq!(response.headers.get("Content-Type"), Some("text/plain"));
}

#[tokio::test]
async fn test_handle_user_agent_missing_header() {
    let router = Router::new(MemoryStore::default());
    let request = RequestBuilder::new()
        .method(Method::GET)
        .path("/user-agent")
        .build()
        .unwrap();

    let response = serve(&router, &request).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert!(response.body.is_empty());
    assert_eq!(response.headers.get("Content-Length"), Some("0"));
}

#[tokio::test]
async fn test_handle_file_round_trip() {
    let router = Router::new(MemoryStore::default());
    let post = RequestBuilder::new()
        .method(Method::POST)
        .path("/files/report.txt")
        .body(b"hello\r\nworld".to_vec())
        .build()
        .unwrap();
    let get = RequestBuilder::new()
        .method(Method::GET)
        .path("/files/report.txt")
        .build()
        .unwrap();

    assert_eq!(serve(&router, &post).await.status, StatusCode::Created);

    let response = serve(&router, &get).await;
    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"hello\r\nworld".to_vec());
    assert_eq!(
        response.headers.get("Content-Type"),
        Some("application/octet-stream")
    );
}

#[tokio::test]
async fn test_handle_missing_file() {
    let router = Router::new(MemoryStore::default());
    let get = RequestBuilder::new()
        .method(Method::GET)
        .path("/files/missing.txt")
        .build()
        .unwrap();

    let response = serve(&router, &get).await;

    assert_eq!(response.status, StatusCode::NotFound);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_handle_store_failures_are_500() {
    let router = Router::new(BrokenStore);
    let get = RequestBuilder::new()
        .method(Method::GET)
        .path("/files/a")
        .build()
        .unwrap();
    let post = RequestBuilder::new()
        .method(Method::POST)
        .path("/files/a")
        .body(b"x".to_vec())
        .build()
        .unwrap();

    assert_eq!(
        serve(&router, &get).await.status,
        StatusCode::InternalServerError
    );
    assert_eq!(
        serve(&router, &post).await.status,
        StatusCode::InternalServerError
    );
}
