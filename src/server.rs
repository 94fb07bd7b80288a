use std::future::Future;

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    signal::unix::{SignalKind, signal},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use uuid::Uuid;

use crate::{
    config::Config,
    protocol::{CombinationResponse, ControlRecord, encode_response},
    resilience::TierAggregator,
    service::ResilienceService,
};

/// Binds the configured address, serves until SIGINT or SIGTERM, then
/// releases the listener.
pub async fn run(config: Config) -> Result<()> {
    let addr = config.listen.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("unable to bind {addr}"))?;

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
    let shutdown = async move {
        tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        }
    };

    let service = ResilienceService::new(TierAggregator::new(config.engine.clone()), &config.worker);
    serve(listener, service, shutdown).await
}

/// Accept loop. Each connection is a sequential request/reply stream;
/// connections are served concurrently.
pub async fn serve<F>(listener: TcpListener, service: ResilienceService, shutdown: F) -> Result<()>
where
    F: Future<Output = &'static str>,
{
    let local_addr = listener
        .local_addr()
        .context("unable to read listener address")?;
    tracing::info!(
        target: "server",
        addr = %local_addr,
        framing = "ndjson",
        "server_listening"
    );

    let connections = CancellationToken::new();
    let tracker = TaskTracker::new();
    tokio::pin!(shutdown);

    let reason = loop {
        tokio::select! {
            reason = &mut shutdown => break reason,
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer)) => {
                        let service = service.clone();
                        let token = connections.child_token();
                        tracker.spawn(async move {
                            let connection_id = Uuid::now_v7();
                            tracing::debug!(target: "server", %connection_id, %peer, "connection_opened");
                            match handle_connection(stream, service, token).await {
                                Ok(served) => tracing::debug!(
                                    target: "server",
                                    %connection_id,
                                    %peer,
                                    served,
                                    "connection_closed"
                                ),
                                Err(err) => tracing::warn!(
                                    target: "server",
                                    %connection_id,
                                    %peer,
                                    error = %format!("{err:#}"),
                                    "connection_failed"
                                ),
                            }
                        });
                    }
                    Err(err) => tracing::warn!(target: "server", error = %err, "accept_failed"),
                }
            }
        }
    };

    drop(listener);
    connections.cancel();
    tracker.close();
    tracker.wait().await;
    tracing::info!(target: "server", addr = %local_addr, reason, "resc_stopped");
    Ok(())
}

/// Returns the number of requests answered on this connection. Cancellation
/// is only observed between requests, so a reply in progress is finished.
async fn handle_connection(
    stream: TcpStream,
    service: ResilienceService,
    token: CancellationToken,
) -> Result<u64> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::new();
    let mut served = 0u64;

    loop {
        buf.clear();
        let read = tokio::select! {
            _ = token.cancelled() => break,
            read = reader.read_until(b'\n', &mut buf) => read.context("failed to read request line")?,
        };
        if read == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                service.handle_line(line).await
            }
            Err(err) => {
                tracing::warn!(target: "server", error = %err, "request_not_utf8");
                CombinationResponse::Failure(ControlRecord::malformed(format!(
                    "request line is not valid UTF-8: {err}"
                )))
            }
        };
        let encoded = encode_response(&response).context("failed to encode response")?;
        write_half
            .write_all(encoded.as_bytes())
            .await
            .context("failed to write response")?;
        write_half.flush().await.context("failed to flush response")?;
        served += 1;
    }

    Ok(served)
}
