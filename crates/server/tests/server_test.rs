//! Integration tests for the Socket.IO server

use std::net::SocketAddr;
use std::time::Duration;

use base64::Engine;
use eyecontact_core::detection::domain::detection::Detection;
use eyecontact_core::detection::domain::face_detector::{BackendError, FaceDetector};
use eyecontact_core::detection::domain::face_landmarks::LandmarkSet;
use eyecontact_core::detection::domain::landmark_detector::LandmarkDetector;
use eyecontact_core::ingest::infrastructure::data_uri_decoder::DataUriDecoder;
use eyecontact_core::pipeline::pipeline_logger::NullPipelineLogger;
use eyecontact_core::pipeline::process_frame_use_case::ProcessFrameUseCase;
use eyecontact_core::scoring::eye_contact_scorer::{EyeContactParams, EyeContactScorer};
use eyecontact_core::shared::frame::Frame;
use eyecontact_server::server::{run, ServerConfig, SOCKET_IO_PATH};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct NoFaces;

impl FaceDetector for NoFaces {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, BackendError> {
        Ok(Vec::new())
    }
}

impl LandmarkDetector for NoFaces {
    fn landmarks(&mut self, _frame: &Frame) -> Result<Vec<LandmarkSet>, BackendError> {
        Ok(Vec::new())
    }
}

fn processor() -> ProcessFrameUseCase {
    ProcessFrameUseCase::new(
        Box::new(DataUriDecoder::new()),
        Box::new(NoFaces),
        Box::new(NoFaces),
        EyeContactScorer::new(EyeContactParams::default()).unwrap(),
        Box::new(NullPipelineLogger),
    )
}

fn config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    }
}

fn png_data_uri() -> String {
    let img = image::RgbImage::new(4, 4);
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&buf)
    )
}

async fn next_text(client: &mut Client) -> String {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timed out waiting for the server")
            .expect("Connection closed")
            .expect("WebSocket error");
        if let Message::Text(text) = message {
            return text;
        }
    }
}

/// Opens an Engine.IO v4 WebSocket and joins the default namespace, the
/// same handshake a browser `io(url, { transports: ["websocket"] })` does.
async fn connect(addr: SocketAddr) -> Client {
    let url = format!("ws://{addr}{SOCKET_IO_PATH}?EIO=4&transport=websocket");
    let (mut client, response) = connect_async(url).await.expect("Failed to connect");
    assert_eq!(response.status().as_u16(), 101);

    let open = next_text(&mut client).await;
    assert!(open.starts_with('0'), "expected open packet, got {open}");
    assert!(open.contains("\"sid\""));

    client.send(Message::Text("40".into())).await.unwrap();
    let joined = next_text(&mut client).await;
    assert!(joined.starts_with("40"), "expected namespace connect, got {joined}");
    client
}

async fn emit(client: &mut Client, event: &str, data: Value) {
    let packet = format!("42{}", serde_json::json!([event, data]));
    client.send(Message::Text(packet)).await.unwrap();
}

/// Next event packet, skipping Engine.IO pings.
async fn next_event(client: &mut Client) -> (String, Value) {
    loop {
        let text = next_text(client).await;
        if let Some(body) = text.strip_prefix("42") {
            let packet: Value = serde_json::from_str(body).unwrap();
            return (packet[0].as_str().unwrap().to_string(), packet[1].clone());
        }
    }
}

#[tokio::test]
async fn test_socket_io_client_can_connect() {
    let server = run(&config(), processor()).await.expect("Failed to start server");

    drop(connect(server.addr).await);

    server.shutdown().await;
}

#[tokio::test]
async fn test_face_data_reaches_every_client() {
    let server = run(&config(), processor()).await.expect("Failed to start server");
    let mut sender = connect(server.addr).await;
    let mut watcher = connect(server.addr).await;

    emit(
        &mut sender,
        "video_frame",
        serde_json::json!({ "image": png_data_uri() }),
    )
    .await;

    for client in [&mut sender, &mut watcher] {
        let (event, data) = next_event(client).await;
        assert_eq!(event, "face_data");
        assert_eq!(data["total_faces"], 0);
        assert_eq!(data["faces"], serde_json::json!([]));
        assert_eq!(data["warnings"], serde_json::json!(["No face detected"]));
        assert!(data["timestamp"].is_string());
    }

    drop((sender, watcher));
    server.shutdown().await;
}

#[tokio::test]
async fn test_bad_frame_replies_with_error_only() {
    let server = run(&config(), processor()).await.expect("Failed to start server");
    let mut client = connect(server.addr).await;

    emit(
        &mut client,
        "video_frame",
        serde_json::json!({ "image": "data:image/png;base64,aGVsbG8=" }),
    )
    .await;

    let (event, data) = next_event(&mut client).await;
    assert_eq!(event, "face_data");
    assert_eq!(data, serde_json::json!({ "error": "Failed to decode image" }));

    drop(client);
    server.shutdown().await;
}

#[tokio::test]
async fn test_unknown_events_are_ignored() {
    let server = run(&config(), processor()).await.expect("Failed to start server");
    let mut client = connect(server.addr).await;

    emit(&mut client, "chat", serde_json::json!({ "text": "hi" })).await;
    emit(
        &mut client,
        "video_frame",
        serde_json::json!({ "image": png_data_uri() }),
    )
    .await;

    // The first reply belongs to the frame; the unknown event produced none.
    let (event, data) = next_event(&mut client).await;
    assert_eq!(event, "face_data");
    assert_eq!(data["total_faces"], 0);

    drop(client);
    server.shutdown().await;
}

#[tokio::test]
async fn test_no_other_endpoints() {
    let server = run(&config(), processor()).await.expect("Failed to start server");

    for path in ["/", "/health", "/socket"] {
        let response = reqwest::get(format!("http://{}{}", server.addr, path))
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND, "{path}");
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = run(&config(), processor()).await.expect("Failed to start server");

    let response = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{}{}", server.addr, SOCKET_IO_PATH),
        )
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    server.shutdown().await;
}
