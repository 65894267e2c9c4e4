//! In-process stand-in for the wallet service proxy.

use axum::Router;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port and return its base URL.
pub(crate) async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("Mock server has no local address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Mock server crashed");
    });

    format!("http://{}", addr)
}
