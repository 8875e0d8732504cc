//! Canned HTTP backend for tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned HTTP response per accepted connection, returning the raw requests.
pub(crate) async fn serve(responses: Vec<(u16, &'static str)>) -> (String, tokio::task::JoinHandle<Vec<String>>) {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();

  let handle = tokio::spawn(async move {
    let mut seen = Vec::new();
    for (status, body) in responses {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = vec![0u8; 8192];
      let n = socket.read(&mut buf).await.unwrap();
      seen.push(String::from_utf8_lossy(&buf[..n]).to_string());

      let response = format!(
        "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
      );
      socket.write_all(response.as_bytes()).await.unwrap();
      socket.shutdown().await.ok();
    }
    seen
  });

  (format!("http://{}/api/v1", addr), handle)
}
