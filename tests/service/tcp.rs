use std::time::Duration;

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{TcpListener, TcpStream, tcp::OwnedReadHalf},
    sync::oneshot,
    task::JoinHandle,
    time::timeout,
};

use resc::server::serve;

use super::{request_line, service_with_cap};

struct RunningServer {
    addr: std::net::SocketAddr,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<anyhow::Result<()>>,
}

async fn start_server() -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("listener should have an address");
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(serve(listener, service_with_cap(20), async move {
        let _ = stop_rx.await;
        "TEST_STOP"
    }));

    RunningServer {
        addr,
        stop_tx,
        task,
    }
}

async fn exchange(
    lines: &mut Lines<BufReader<OwnedReadHalf>>,
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    request: &str,
) -> serde_json::Value {
    writer
        .write_all(format!("{request}\n").as_bytes())
        .await
        .expect("request should be written");
    let line = timeout(Duration::from_secs(5), lines.next_line())
        .await
        .expect("response should arrive in time")
        .expect("read should succeed")
        .expect("server should answer before closing");
    serde_json::from_str(&line).expect("response should be json")
}

#[tokio::test]
async fn given_sequential_requests_on_one_connection_then_each_gets_one_reply() {
    let server = start_server().await;
    let stream = TcpStream::connect(server.addr)
        .await
        .expect("client should connect");
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let high = exchange(&mut lines, &mut write_half, &request_line(&[20.0, 30.0], 10.0, 3)).await;
    let entries = high.as_array().expect("success is an array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].as_array().expect("combination is an array").len(), 2);
    assert_eq!(
        entries[1],
        serde_json::json!({"ErrorCode": 200, "ErrorMessage": "Success"})
    );

    let malformed = exchange(&mut lines, &mut write_half, "not json").await;
    assert_eq!(malformed["ErrorCode"], 400);

    let empty = exchange(&mut lines, &mut write_half, &request_line(&[], 10.0, 3)).await;
    assert_eq!(empty["ErrorCode"], 301);

    let after_errors =
        exchange(&mut lines, &mut write_half, &request_line(&[15.0, 5.0, 5.0], 10.0, 1)).await;
    assert_eq!(after_errors.as_array().expect("success is an array").len(), 6);

    let _ = server.stop_tx.send(());
    server
        .task
        .await
        .expect("server task should join")
        .expect("server should stop cleanly");
}

#[tokio::test]
async fn given_concurrent_connections_then_both_are_served() {
    let server = start_server().await;

    let mut clients = Vec::new();
    for level in [1, 3] {
        let addr = server.addr;
        clients.push(tokio::spawn(async move {
            let stream = TcpStream::connect(addr).await.expect("client should connect");
            let (read_half, mut write_half) = stream.into_split();
            let mut lines = BufReader::new(read_half).lines();
            exchange(&mut lines, &mut write_half, &request_line(&[20.0, 30.0, 4.0], 10.0, level)).await
        }));
    }

    for client in clients {
        let response = client.await.expect("client task should join");
        let entries = response.as_array().expect("success is an array");
        assert_eq!(
            entries.last().expect("trailing control record")["ErrorCode"],
            200
        );
    }

    let _ = server.stop_tx.send(());
    server
        .task
        .await
        .expect("server task should join")
        .expect("server should stop cleanly");
}

#[tokio::test]
async fn given_shutdown_then_listener_is_released() {
    let server = start_server().await;
    let addr = server.addr;

    let _ = server.stop_tx.send(());
    server
        .task
        .await
        .expect("server task should join")
        .expect("server should stop cleanly");

    TcpListener::bind(addr)
        .await
        .expect("address should be free again after shutdown");
}

#[tokio::test]
async fn given_non_utf8_line_then_protocol_error_and_connection_stays_open() {
    let server = start_server().await;
    let stream = TcpStream::connect(server.addr)
        .await
        .expect("client should connect");
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    write_half
        .write_all(b"\xff\xfe garbage\n")
        .await
        .expect("raw bytes should be written");
    let line = timeout(Duration::from_secs(5), lines.next_line())
        .await
        .expect("response should arrive in time")
        .expect("read should succeed")
        .expect("server should answer the undecodable line");
    let rejected: serde_json::Value = serde_json::from_str(&line).expect("response should be json");
    assert_eq!(rejected["ErrorCode"], 400);

    let medium =
        exchange(&mut lines, &mut write_half, &request_line(&[15.0, 5.0, 5.0], 10.0, 2)).await;
    let entries = medium.as_array().expect("success is an array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["ErrorCode"], 200);

    let _ = server.stop_tx.send(());
    server
        .task
        .await
        .expect("server task should join")
        .expect("server should stop cleanly");
}

#[tokio::test]
async fn given_shutdown_during_a_request_then_reply_is_still_delivered() {
    let server = start_server().await;
    let stream = TcpStream::connect(server.addr)
        .await
        .expect("client should connect");
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let slow = request_line(&[1.0; 18], 1000.0, 1);
    write_half
        .write_all(format!("{slow}\n").as_bytes())
        .await
        .expect("request should be written");
    tokio::time::sleep(Duration::from_millis(50)).await;
    let _ = server.stop_tx.send(());

    let line = timeout(Duration::from_secs(30), lines.next_line())
        .await
        .expect("response should arrive in time")
        .expect("read should succeed")
        .expect("server should answer before closing");
    let response: serde_json::Value = serde_json::from_str(&line).expect("response should be json");
    assert_eq!(
        response,
        serde_json::json!([{"ErrorCode": 200, "ErrorMessage": "Success"}])
    );

    server
        .task
        .await
        .expect("server task should join")
        .expect("server should stop cleanly");
}
