//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use live_forum::broadcast::Fanout;
use live_forum::config::AppConfig;
use live_forum::lifecycle::{self, Application, Shutdown};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A forum server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub fanout: Arc<Fanout>,
    pub app: Application,
    shutdown: Shutdown,
    _static_dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, self.app.config.forum.websocket_path)
    }

    /// Poll until the fan-out holds `count` listeners.
    pub async fn wait_for_listeners(&self, count: usize) {
        for _ in 0..100 {
            if self.fanout.len() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} listeners, found {}", self.fanout.len());
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server with the reference dataset and a temporary static directory
/// containing `hello.txt`.
pub async fn start_server() -> TestServer {
    start_server_with(|_| {}).await
}

pub async fn start_server_with(customize: impl FnOnce(&mut AppConfig)) -> TestServer {
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("hello.txt"), "Hello\n").unwrap();

    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.forum.static_dir = static_dir.path().to_string_lossy().into_owned();
    customize(&mut config);

    let app = lifecycle::bootstrap(config).unwrap();
    let listener = TcpListener::bind(&app.config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = app.server();
    let stop = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });

    TestServer {
        addr,
        fanout: app.fanout.clone(),
        app,
        shutdown,
        _static_dir: static_dir,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
