//! Shared utilities for integration testing: mock rate providers.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Start a programmable mock rate provider on an ephemeral port.
///
/// The handler decides the status and body per request. Returns the bound
/// address; build endpoint URLs as `http://{addr}/latest`.
pub async fn start_provider<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        // Drain the request head before answering.
                        let mut buf = [0u8; 2048];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a provider that always answers with the same status and body.
#[allow(dead_code)]
pub async fn start_fixed_provider(status: u16, body: String) -> SocketAddr {
    start_provider(move || {
        let body = body.clone();
        async move { (status, body) }
    })
    .await
}

/// A well-formed `rates`-shaped body: USD base with EUR and GBP.
#[allow(dead_code)]
pub fn rates_body() -> String {
    serde_json::json!({
        "base_code": "USD",
        "rates": {"USD": 1.0, "EUR": 0.9, "GBP": 0.8}
    })
    .to_string()
}

/// The same table in the `conversion_rates` alias shape.
#[allow(dead_code)]
pub fn conversion_rates_body() -> String {
    serde_json::json!({
        "result": "success",
        "conversion_rates": {"USD": 1.0, "EUR": 0.9, "GBP": 0.8}
    })
    .to_string()
}

/// Engine config pointed at two mock providers, tuned for fast tests:
/// no request spacing, short backoff, short debounce.
#[allow(dead_code)]
pub fn test_config(primary: SocketAddr, fallback: SocketAddr) -> fx_engine::EngineConfig {
    let mut config = fx_engine::EngineConfig::default();
    config.providers.primary_url = format!("http://{primary}/latest");
    config.providers.fallback_url = format!("http://{fallback}/latest");
    config.rate_limit.min_interval_ms = 0;
    config.retry.max_rounds = 1;
    config.retry.backoff_base_ms = 20;
    config.timeouts.request_secs = 5;
    config.debounce.quiet_period_ms = 100;
    config
}
