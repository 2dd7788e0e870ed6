//! Loopback HTTP listener for ffmpeg `-progress` reports.
//!
//! ffmpeg POSTs its progress blocks to `/` as one long streaming body. Only
//! clients whose `User-Agent` starts with the configured prefix (libavformat
//! identifies itself as `Lavf/<version>`) are decoded; everyone else gets
//! `403`. A fully read report is answered with `204`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use futures::TryStreamExt;
use gf_core::config::TelemetryConfig;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use crate::status::{ProgressStatus, StatusDecoder};

/// Size of each read from the request body.
const CHUNK_SIZE: usize = 256;

/// Body of the `403` answer to unexpected clients.
pub const FORBIDDEN_BODY: &str = "for internal use only";

#[derive(Clone)]
struct TelemetryState {
    agent_prefix: Arc<str>,
    tx: mpsc::Sender<ProgressStatus>,
}

/// Build the progress router publishing decoded snapshots on `tx`.
pub fn router(agent_prefix: &str, tx: mpsc::Sender<ProgressStatus>) -> Router {
    let state = TelemetryState {
        agent_prefix: Arc::from(agent_prefix),
        tx,
    };
    Router::new()
        .route("/", post(handle_progress))
        .with_state(state)
}

/// POST /
async fn handle_progress(
    State(state): State<TelemetryState>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !agent.starts_with(&*state.agent_prefix) {
        tracing::warn!(user_agent = %agent, "Rejected progress report from unexpected client");
        return (StatusCode::FORBIDDEN, FORBIDDEN_BODY).into_response();
    }

    let stream = body.into_data_stream().map_err(std::io::Error::other);
    let mut reader = StreamReader::new(stream);
    let mut decoder = StatusDecoder::new();
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("Progress report ended abruptly: {e}");
                break;
            }
        };
        for status in decoder.feed(&chunk[..n]) {
            publish(&state.tx, status).await;
        }
    }

    if let Some(status) = decoder.finish() {
        publish(&state.tx, status).await;
    }

    StatusCode::NO_CONTENT.into_response()
}

async fn publish(tx: &mpsc::Sender<ProgressStatus>, status: ProgressStatus) {
    tracing::trace!(frame = status.frame, state = ?status.state, "Progress");
    if tx.send(status).await.is_err() {
        tracing::debug!("Progress sink is gone; dropping snapshot");
    }
}

/// A bound but not yet serving progress listener.
pub struct TelemetryServer {
    listener: TcpListener,
    addr: SocketAddr,
    agent_prefix: String,
}

impl TelemetryServer {
    /// Bind `config.host` on `port` (`0` picks an ephemeral port).
    pub async fn bind(config: &TelemetryConfig, port: u16) -> gf_core::Result<Self> {
        let listener = TcpListener::bind((config.host.as_str(), port)).await?;
        let addr = listener.local_addr()?;
        tracing::debug!("Progress listener bound on {addr}");
        Ok(Self {
            listener,
            addr,
            agent_prefix: config.agent_prefix.clone(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// The value to hand ffmpeg as `-progress`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Serve until `shutdown` is cancelled, then finish in-flight reports.
    pub async fn serve(
        self,
        tx: mpsc::Sender<ProgressStatus>,
        shutdown: CancellationToken,
    ) -> gf_core::Result<()> {
        let app = router(&self.agent_prefix, tx);

        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::debug!("Progress listener on {} shut down", self.addr);
        Ok(())
    }
}
