//! Socket.IO event server.
//!
//! Clients connect with a Socket.IO client on the default namespace, emit
//! `video_frame` events and receive `face_data` results. Every result is
//! sent to every connected client.
//!
//! ```text
//! browser ──video_frame──→ /socket.io/ ──→ ProcessFrameUseCase (blocking pool)
//!    ↑                                              │
//!    └────────────── face_data (all clients) ←──────┘
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use eyecontact_core::pipeline::frame_result::FrameResponse;
use eyecontact_core::pipeline::process_frame_use_case::ProcessFrameUseCase;
use socketioxide::extract::{SocketRef, TryData};
use socketioxide::SocketIo;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::events::{VideoFrame, FACE_DATA_EVENT, VIDEO_FRAME_EVENT};

/// Engine.IO endpoint served by the Socket.IO layer.
pub const SOCKET_IO_PATH: &str = "/socket.io/";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// Port to bind to (0 for random)
    pub port: u16,
}

/// State shared by every connection.
///
/// The frame processor is built once at startup; its inference sessions
/// need exclusive access to run, so frames are processed one at a time.
pub struct AppState {
    processor: Arc<Mutex<ProcessFrameUseCase>>,
}

impl AppState {
    pub fn new(processor: ProcessFrameUseCase) -> Self {
        Self {
            processor: Arc::new(Mutex::new(processor)),
        }
    }

    /// Turns one `video_frame` payload into the `face_data` response.
    pub async fn handle_video_frame(
        &self,
        payload: Result<VideoFrame, serde_json::Error>,
    ) -> FrameResponse {
        match payload {
            Ok(frame) => self.process(frame.image).await,
            Err(e) => {
                log::warn!("Invalid {VIDEO_FRAME_EVENT} payload: {e}");
                FrameResponse::error(format!("Invalid {VIDEO_FRAME_EVENT} payload: {e}"))
            }
        }
    }

    /// Runs the frame pipeline on the blocking pool. Errors and panics
    /// become `{ "error": ... }` responses.
    async fn process(&self, image: String) -> FrameResponse {
        let processor = Arc::clone(&self.processor);
        let outcome = tokio::task::spawn_blocking(move || {
            // A panic mid-frame leaves no state behind worth discarding.
            let mut use_case = processor.lock().unwrap_or_else(PoisonError::into_inner);
            use_case.execute(&image)
        })
        .await;

        match outcome {
            Ok(result) => {
                if let Err(e) = &result {
                    log::warn!("Frame failed: {e}");
                }
                FrameResponse::from(result)
            }
            Err(e) => {
                log::error!("Frame processing aborted: {e}");
                FrameResponse::error(format!("Frame processing aborted: {e}"))
            }
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let (socket_layer, io) = SocketIo::new_layer();
    io.ns("/", move |socket: SocketRef| on_connect(socket, Arc::clone(&state)));

    Router::new().layer(socket_layer).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

fn on_connect(socket: SocketRef, state: Arc<AppState>) {
    log::info!("Client {} connected", socket.id);

    socket.on(
        VIDEO_FRAME_EVENT,
        move |socket: SocketRef, TryData(payload): TryData<VideoFrame>| async move {
            let response = state.handle_video_frame(payload).await;
            emit_to_all(&socket, &response);
        },
    );

    socket.on_disconnect(|socket: SocketRef| {
        log::info!("Client {} disconnected", socket.id);
    });
}

/// Sends `face_data` to the sender and to every other client on its namespace.
fn emit_to_all(socket: &SocketRef, response: &FrameResponse) {
    if let Err(e) = socket.emit(FACE_DATA_EVENT, response) {
        log::warn!("Failed to send {FACE_DATA_EVENT} to {}: {e}", socket.id);
    }
    if let Err(e) = socket.broadcast().emit(FACE_DATA_EVENT, response) {
        log::warn!("Failed to broadcast {FACE_DATA_EVENT}: {e}");
    }
}

/// Handle to a server started with [`run`].
pub struct RunningServer {
    pub addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl RunningServer {
    /// Stops accepting connections and waits for the server task to end.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            log::error!("Server task failed: {e}");
        }
    }
}

/// Binds the listener and serves in a background task.
pub async fn run(
    config: &ServerConfig,
    processor: ProcessFrameUseCase,
) -> std::io::Result<RunningServer> {
    let state = Arc::new(AppState::new(processor));
    let app = router(state);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    log::info!("Listening on http://{addr}{SOCKET_IO_PATH}");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                log::info!("Shutdown signal received");
            })
            .await
        {
            log::error!("Server error: {e}");
        }
    });

    Ok(RunningServer {
        addr,
        shutdown_tx,
        handle,
    })
}
