//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use brief_gateway::config::GatewayConfig;
use brief_gateway::http::HttpServer;
use brief_gateway::lifecycle::Shutdown;
use brief_gateway::security::rate_limit::MemoryStore;
use brief_gateway::upstream::OpenRouterClient;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const APP_URL: &str = "https://brief.example.com";
pub const SECRET: &str = "integration-secret";

/// Request bodies the mock upstream has received.
pub type Captured = Arc<Mutex<Vec<String>>>;

/// A complete brief with every required heading.
pub fn full_brief() -> String {
    brief_gateway::brief::DEFAULT_SECTIONS
        .iter()
        .map(|s| format!("**{}**\n- point one\n\n- point two\n", s.title))
        .collect()
}

/// Chat completions JSON wrapping `content`.
pub fn completion(content: &str) -> String {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

async fn read_request(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < end + 4 + length {
                let n = socket.read(&mut chunk).await.ok()?;
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            return Some(String::from_utf8_lossy(&buf[end + 4..]).into_owned());
        }
    }
}

/// Start a mock chat completions API answering every request with
/// `status` and `body`.
pub async fn start_mock_upstream(status: u16, body: String) -> (SocketAddr, Captured) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured: Captured = Arc::default();
    let seen = captured.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut socket).await {
                    seen.lock().unwrap().push(request);
                }
                let status_text = match status {
                    200 => "200 OK",
                    500 => "500 Internal Server Error",
                    _ => "503 Service Unavailable",
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
    });

    (addr, captured)
}

/// Gateway config pointed at a mock upstream.
pub fn test_config(upstream: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.admission.app_url = APP_URL.into();
    config.admission.shared_secret = Some(SECRET.into());
    config.upstream.base_url = format!("http://{}", upstream);
    config.upstream.api_key = Some("sk-test".into());
    config
}

/// Run a gateway on an ephemeral port with the in-memory store.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let model = OpenRouterClient::new(&config.upstream, &config.admission.app_url, Duration::from_secs(5)).unwrap();
    let server = HttpServer::new(config, Arc::new(MemoryStore::new()), Arc::new(model));
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// Client request builder with origin and token preset.
pub fn authed(client: &reqwest::Client, gateway: SocketAddr, path: &str) -> reqwest::RequestBuilder {
    client
        .post(format!("http://{}{}", gateway, path))
        .header("origin", APP_URL)
        .header("x-app-token", SECRET)
}
