//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use request_gateway::config::{DirectiveConfig, GatewayConfig, LocationConfig, ScopeDefaults};
use request_gateway::{GatewayServer, Shutdown};

/// One request as seen by a mock backend.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct ReceivedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Start a mock backend whose responses are computed from the parsed
/// request. Binds an ephemeral port and returns its address.
pub async fn start_backend<F>(respond: F) -> SocketAddr
where
    F: Fn(ReceivedRequest) -> (u16, Vec<u8>) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let respond = respond.clone();
                    tokio::spawn(async move {
                        handle_connection(socket, respond).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend returning a fixed response and recording every request
/// it receives.
#[allow(dead_code)]
pub async fn start_recording_backend(
    status: u16,
    body: &'static [u8],
) -> (SocketAddr, Arc<Mutex<Vec<ReceivedRequest>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();
    let addr = start_backend(move |req| {
        record.lock().unwrap().push(req);
        (status, body.to_vec())
    })
    .await;
    (addr, seen)
}

async fn handle_connection<F>(mut socket: TcpStream, respond: Arc<F>)
where
    F: Fn(ReceivedRequest) -> (u16, Vec<u8>) + Send + Sync + 'static,
{
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];

    // Read until the end of the header block.
    let header_end = loop {
        if let Some(pos) = find_terminator(&buf) {
            break pos;
        }
        match socket.read(&mut tmp).await {
            Ok(0) => return,
            Ok(n) => buf.extend_from_slice(&tmp[..n]),
            Err(_) => return,
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            if name == "content-length" {
                content_length = value.parse().unwrap_or(0);
            }
            headers.push((name, value));
        }
    }

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        match socket.read(&mut tmp).await {
            Ok(0) => break,
            Ok(n) => body.extend_from_slice(&tmp[..n]),
            Err(_) => return,
        }
    }
    body.truncate(content_length);

    let (status, response_body) = respond(ReceivedRequest {
        method,
        path,
        headers,
        body,
    });
    let status_text = match status {
        200 => "200 OK",
        201 => "201 Created",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status_text,
        response_body.len()
    );
    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(&response_body).await;
    let _ = socket.shutdown().await;
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Spawn a gateway on an ephemeral port. The returned `Shutdown` must be
/// kept alive for the lifetime of the test.
#[allow(dead_code)]
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = GatewayServer::new(config).expect("configuration must compile");
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(150)).await;
    (addr, shutdown)
}

#[allow(dead_code)]
pub fn echo_directive(tokens: &[&str]) -> DirectiveConfig {
    DirectiveConfig::RequestEcho {
        args: tokens.iter().map(|t| t.to_string()).collect(),
    }
}

#[allow(dead_code)]
pub fn request_directive(tokens: &[&str]) -> DirectiveConfig {
    DirectiveConfig::Request {
        args: tokens.iter().map(|t| t.to_string()).collect(),
    }
}

#[allow(dead_code)]
pub fn location(path: &str, directives: Vec<DirectiveConfig>) -> LocationConfig {
    LocationConfig {
        path: path.to_string(),
        defaults: ScopeDefaults::default(),
        directives,
    }
}
