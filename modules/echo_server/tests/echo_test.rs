use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use berth::{AcceptAll, Initable, Registry, Runnable, Stoppable};
use echo_server::{EchoServer, MODULE_NAME};

async fn bound_addr(echo: &EchoServer) -> std::net::SocketAddr {
    for _ in 0..100 {
        if let Some(addr) = echo.bound_addr() {
            return addr;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("echo server never published its address");
}

#[tokio::test]
async fn echoes_lines_until_stopped() {
    let registry = Registry::new(Arc::new(AcceptAll));
    registry
        .set_configs([(MODULE_NAME.to_string(), json!({"listen": "127.0.0.1:0"}))])
        .unwrap();

    let echo = Arc::new(EchoServer::new());
    echo.init(&registry).await.unwrap();

    let run_task = tokio::spawn({
        let echo = echo.clone();
        async move { echo.run().await }
    });

    let addr = bound_addr(&echo).await;
    let stream = TcpStream::connect(addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    writer.write_all(b"hello berth\n").await.unwrap();
    assert_eq!(lines.next_line().await.unwrap().unwrap(), "hello berth");

    writer.write_all(b"second line\n").await.unwrap();
    assert_eq!(lines.next_line().await.unwrap().unwrap(), "second line");

    echo.stop().await.unwrap();
    run_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn greeting_is_sent_first() {
    let registry = Registry::new(Arc::new(AcceptAll));
    registry
        .set_configs([(
            MODULE_NAME.to_string(),
            json!({"listen": "127.0.0.1:0", "greeting": "welcome"}),
        )])
        .unwrap();

    let echo = Arc::new(EchoServer::new());
    echo.init(&registry).await.unwrap();

    let run_task = tokio::spawn({
        let echo = echo.clone();
        async move { echo.run().await }
    });

    let addr = bound_addr(&echo).await;
    let stream = TcpStream::connect(addr).await.unwrap();
    let (reader, _writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    assert_eq!(lines.next_line().await.unwrap().unwrap(), "welcome");

    echo.stop().await.unwrap();
    run_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn run_without_init_fails() {
    let echo = EchoServer::new();
    assert!(echo.run().await.is_err());
}
