// Server loop module
// Accepts connections until the shutdown future completes

use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept connections on `listener` until `shutdown` resolves.
///
/// Connections already being served keep running in their own tasks;
/// the caller decides whether to wait for them (the binary just exits).
pub async fn start_server_loop<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => {
                logger::log_debug(&format!(
                    "Accept loop stopped on {}",
                    listener.local_addr()?
                ));
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use std::fs;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    async fn fetch(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8(response).unwrap()
    }

    #[tokio::test]
    async fn test_serves_clean_urls_over_tcp() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("about.html"), "<h1>About</h1>").unwrap();

        let mut config = Config::load_from("this-config-file-does-not-exist").unwrap();
        config.logging.access_log = false;
        let state = Arc::new(AppState::with_root(config, root));

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(start_server_loop(listener, state, async move {
            let _ = stop_rx.await;
        }));

        let response = fetch(
            addr,
            "GET /about?from=test HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.ends_with("<h1>About</h1>"));
        assert!(!response.to_ascii_lowercase().contains("location:"));

        let response = fetch(
            addr,
            "GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found"), "{response}");

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_idle_keep_alive_connection_closed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("about.html"), "<h1>About</h1>").unwrap();

        let mut config = Config::load_from("this-config-file-does-not-exist").unwrap();
        config.logging.access_log = false;
        config.performance.keep_alive_timeout = 1;
        let state = Arc::new(AppState::with_root(config, root));

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(start_server_loop(listener, state, async move {
            let _ = stop_rx.await;
        }));

        // No `Connection: close`: the server keeps the connection open until idle
        let request = "GET /about HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let response = tokio::time::timeout(Duration::from_secs(10), fetch(addr, request))
            .await
            .expect("idle connection was not closed");
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.ends_with("<h1>About</h1>"));

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
