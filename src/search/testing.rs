//! Local HTTP server for provider tests.

use std::time::Duration;

use axum::{http::StatusCode, response::Html, routing::get, Router};
use reqwest::Client;

/// Bind `127.0.0.1:0`, build the router with the server's own base URL
/// (so fixture pages can link back to it) and serve it in the background.
pub(crate) async fn spawn_server(build: impl FnOnce(&str) -> Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = build(&base);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

/// Serve the same HTML page on every request to `path`.
pub(crate) fn page(router: Router, path: &str, html: String) -> Router {
    router.route(
        path,
        get(move || {
            let html = html.clone();
            async move { Html(html) }
        }),
    )
}

/// Answer `path` with 503.
pub(crate) fn unavailable(router: Router, path: &str) -> Router {
    router.route(path, get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }))
}

/// Never answer `path` within a test's lifetime.
pub(crate) fn hanging(router: Router, path: &str) -> Router {
    router.route(
        path,
        get(|| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Html("too late")
        }),
    )
}

pub(crate) fn client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}
