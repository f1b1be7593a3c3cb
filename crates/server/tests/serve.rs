use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use toybot_server::{serve_listener, ServerConfig};

async fn request(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let req = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(req.as_bytes()).await.unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    let status = raw
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

#[tokio::test]
async fn serves_over_tcp_and_shuts_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let config = ServerConfig {
        board_size: 6,
        ..ServerConfig::default()
    };
    let server = tokio::spawn(serve_listener(listener, config, async {
        let _ = stop_rx.await;
    }));

    let (status, body) = request(addr, "POST", "/place", r#"{"x":5,"y":5}"#).await;
    assert_eq!(status, 200);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["board"]["n"], 6);

    let (status, _) = request(addr, "POST", "/right", "").await;
    assert_eq!(status, 200);

    let (status, body) = request(addr, "GET", "/report", "").await;
    assert_eq!(status, 200);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["history"][1]["ok"], false);

    stop_tx.send(()).unwrap();
    let bound = server.await.unwrap().unwrap();
    assert_eq!(bound, addr);
}

#[tokio::test]
async fn rejects_invalid_board_size_at_startup() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = ServerConfig {
        board_size: 2,
        ..ServerConfig::default()
    };
    let result = serve_listener(listener, config, async {}).await;
    assert!(result.is_err());
}
