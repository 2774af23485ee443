//! Raw HTTP/1.1 gateway whose requests can be held open, to observe when the
//! client drops a connection.
//!
//! * `/win-after-N` answers 200 once `N` held requests have arrived.
//! * Every other path is held until the client closes the connection; the
//!   path is then reported on the closed channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};

use super::socket_guard::should_skip_socket_bound_test;

pub struct HoldingGateway {
    base: String,
    held: Arc<watch::Sender<usize>>,
    closed: mpsc::UnboundedReceiver<String>,
}

impl HoldingGateway {
    /// Starts the gateway, or returns `None` when sockets are unavailable.
    pub async fn start_or_skip() -> Option<Self> {
        if should_skip_socket_bound_test() {
            return None;
        }
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (held, _) = watch::channel(0_usize);
        let held = Arc::new(held);
        let (closed_tx, closed) = mpsc::unbounded_channel();

        let accept_held = Arc::clone(&held);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&accept_held), closed_tx.clone()));
            }
        });

        Some(Self { base, held, closed })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Resolves once `count` requests are being held.
    pub fn held_at_least(&self, count: usize) -> impl Future<Output = ()> + Send + 'static {
        let mut held = self.held.subscribe();
        async move {
            let _ = held.wait_for(|n| *n >= count).await;
        }
    }

    /// Paths of the next `count` held connections the client closed, sorted.
    /// Panics if they are not closed within two seconds.
    pub async fn closed_paths(&mut self, count: usize) -> Vec<String> {
        let mut paths = Vec::with_capacity(count);
        while paths.len() < count {
            let path = tokio::time::timeout(Duration::from_secs(2), self.closed.recv())
                .await
                .unwrap_or_else(|_| panic!("only {} held connection(s) closed", paths.len()))
                .unwrap();
            paths.push(path);
        }
        paths.sort();
        paths
    }
}

async fn serve(
    mut stream: TcpStream,
    held: Arc<watch::Sender<usize>>,
    closed: mpsc::UnboundedSender<String>,
) {
    let mut head = Vec::new();
    let mut buf = [0_u8; 1024];
    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    let request = String::from_utf8_lossy(&head);
    let path = request.split_whitespace().nth(1).unwrap_or_default().to_string();

    if let Some(threshold) = path
        .strip_prefix("/win-after-")
        .and_then(|n| n.parse::<usize>().ok())
    {
        let mut count = held.subscribe();
        let _ = count.wait_for(|n| *n >= threshold).await;
        let _ = stream
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
            .await;
        return;
    }

    held.send_modify(|n| *n += 1);
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
    }
    let _ = closed.send(path);
}
