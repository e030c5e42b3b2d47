//! End-to-end fanout tests
//!
//! Drive a real server: lines written into a FIFO come out of WebSocket
//! subscribers.

#![cfg(unix)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use pipecast::{PipecastServer, ServerConfig};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn test_config(port: u16, pipe: &Path) -> ServerConfig {
    ServerConfig::default()
        .bind(([127, 0, 0, 1], port).into())
        .pipe_path(pipe)
}

fn start_server(config: ServerConfig) -> Arc<PipecastServer> {
    let server = Arc::new(PipecastServer::new(config));
    let runner = Arc::clone(&server);
    tokio::spawn(async move {
        let _ = runner.run().await;
    });
    server
}

async fn connect(port: u16) -> WsClient {
    let url = format!("ws://127.0.0.1:{}", port);
    for _ in 0..100 {
        if let Ok((ws, _)) = connect_async(url.as_str()).await {
            return ws;
        }
        sleep(Duration::from_millis(25)).await;
    }
    panic!("server at {} did not come up", url);
}

/// Opens the FIFO for writing on a plain thread (the open blocks until the
/// server has the read end) and closes it after writing.
fn write_to_pipe(path: &Path, data: &str) -> std::thread::JoinHandle<()> {
    let path = path.to_path_buf();
    let data = data.to_owned();
    std::thread::spawn(move || {
        let mut pipe = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        pipe.write_all(data.as_bytes()).unwrap();
    })
}

async fn recv_text(ws: &mut WsClient) -> String {
    loop {
        let msg = timeout(Duration::from_secs(3), ws.next())
            .await
            .expect("timed out waiting for message")
            .expect("connection closed")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return text;
        }
    }
}

async fn assert_silent(ws: &mut WsClient) {
    let extra = timeout(Duration::from_millis(200), ws.next()).await;
    assert!(extra.is_err(), "unexpected message: {:?}", extra);
}

#[tokio::test]
async fn fanout_preserves_order_across_subscribers() {
    let dir = TempDir::new().unwrap();
    let pipe = dir.path().join("cast.pipe");
    start_server(test_config(18431, &pipe));

    let mut first = connect(18431).await;
    let mut second = connect(18431).await;

    let writer = write_to_pipe(&pipe, "alpha\nbeta\ngamma\n");

    for ws in [&mut first, &mut second] {
        assert_eq!(recv_text(ws).await, "alpha");
        assert_eq!(recv_text(ws).await, "beta");
        assert_eq!(recv_text(ws).await, "gamma");
    }

    writer.join().unwrap();
}

#[tokio::test]
async fn disconnected_subscriber_does_not_affect_others() {
    let dir = TempDir::new().unwrap();
    let pipe = dir.path().join("cast.pipe");
    let server = start_server(test_config(18432, &pipe));

    let mut staying = connect(18432).await;
    let mut leaving = connect(18432).await;

    write_to_pipe(&pipe, "one\n").join().unwrap();
    assert_eq!(recv_text(&mut staying).await, "one");
    assert_eq!(recv_text(&mut leaving).await, "one");

    leaving.close(None).await.unwrap();

    // The close-detection path removes the subscriber without a failed send
    for _ in 0..100 {
        if server.registry().len().await == 1 {
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(server.registry().len().await, 1);

    write_to_pipe(&pipe, "two\nthree\n").join().unwrap();
    assert_eq!(recv_text(&mut staying).await, "two");
    assert_eq!(recv_text(&mut staying).await, "three");
}

#[tokio::test]
async fn writer_reopen_resumes_without_duplicates() {
    let dir = TempDir::new().unwrap();
    let pipe = dir.path().join("cast.pipe");
    start_server(test_config(18433, &pipe));

    let mut subscriber = connect(18433).await;

    // Writer writes "a", closes its end, reopens, writes "b"
    write_to_pipe(&pipe, "a\n").join().unwrap();
    assert_eq!(recv_text(&mut subscriber).await, "a");

    write_to_pipe(&pipe, "b\n").join().unwrap();
    assert_eq!(recv_text(&mut subscriber).await, "b");

    assert_silent(&mut subscriber).await;
}

#[tokio::test]
async fn late_pipe_creation_delivers_exactly_once() {
    let dir = TempDir::new().unwrap();
    let pipe: PathBuf = dir.path().join("late.pipe");

    // The server does not create the pipe; it polls for the writer's
    let config = test_config(18434, &pipe).skip_pipe_creation();
    start_server(config);

    let mut subscriber = connect(18434).await;

    // Nothing exists yet, so nothing may arrive
    let premature = timeout(Duration::from_millis(300), subscriber.next()).await;
    assert!(premature.is_err());

    nix::unistd::mkfifo(&pipe, nix::sys::stat::Mode::S_IRUSR | nix::sys::stat::Mode::S_IWUSR)
        .unwrap();
    write_to_pipe(&pipe, "hello\n").join().unwrap();

    assert_eq!(recv_text(&mut subscriber).await, "hello");
    assert_silent(&mut subscriber).await;
}

#[tokio::test]
async fn late_subscriber_receives_only_later_lines() {
    let dir = TempDir::new().unwrap();
    let pipe = dir.path().join("cast.pipe");
    start_server(test_config(18435, &pipe));

    let mut early = connect(18435).await;

    write_to_pipe(&pipe, "missed\n").join().unwrap();
    assert_eq!(recv_text(&mut early).await, "missed");

    let mut late = connect(18435).await;

    write_to_pipe(&pipe, "shared\n").join().unwrap();
    assert_eq!(recv_text(&mut early).await, "shared");
    assert_eq!(recv_text(&mut late).await, "shared");
}
