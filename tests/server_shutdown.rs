use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use marquee::server::serve_with_shutdown;

/// A shutdown signal must let in-flight requests run to completion while
/// the listener stops accepting new connections.
#[tokio::test]
async fn shutdown_drains_in_flight_requests_and_closes_the_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            "done"
        }),
    );

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve_with_shutdown(listener, app, async move {
        let _ = shutdown_rx.await;
        "SIGTERM"
    }));

    // Park a request inside the slow handler.
    let url = format!("http://{addr}/slow");
    let in_flight = tokio::spawn({
        let url = url.clone();
        async move { reqwest::Client::new().get(url).send().await.unwrap() }
    });

    // Give the request time to reach the handler, then trip the drain.
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(()).unwrap();

    let response = in_flight.await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "done");

    server.await.unwrap().unwrap();

    // The drain is complete and the listener is gone.
    let refused = reqwest::Client::new().get(url).send().await;
    assert!(refused.is_err());
}
