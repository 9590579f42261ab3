use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use eyecontact_core::detection::infrastructure::model_resolver::{self, ModelSource};
use eyecontact_core::detection::infrastructure::onnx_blazeface_detector::OnnxBlazefaceDetector;
use eyecontact_core::detection::infrastructure::onnx_face_mesh::OnnxFaceMesh;
use eyecontact_core::ingest::infrastructure::data_uri_decoder::DataUriDecoder;
use eyecontact_core::pipeline::pipeline_logger::LogPipelineLogger;
use eyecontact_core::pipeline::process_frame_use_case::ProcessFrameUseCase;
use eyecontact_core::scoring::eye_contact_scorer::{EyeContactParams, EyeContactScorer};
use eyecontact_core::shared::constants::{FACE_DETECTION_MODEL_NAME, FACE_MESH_MODEL_NAME};
use eyecontact_server::server::{self, ServerConfig};
use eyecontact_server::settings::Settings;

/// Real-time eye-contact scoring for webcam frames sent over Socket.IO.
#[derive(Parser)]
#[command(name = "eyecontact-server", version)]
struct Cli {
    /// Settings file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on.
    #[arg(long)]
    port: Option<u16>,

    /// Directory searched first for the ONNX model files.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    detection_confidence: Option<f64>,

    /// Confidence threshold for locating faces to mesh (0.0-1.0).
    #[arg(long)]
    mesh_confidence: Option<f64>,

    /// Faces to extract landmarks for.
    #[arg(long)]
    max_mesh_faces: Option<usize>,

    /// Horizontal eye spacing, in pixels, that scores 100.
    #[arg(long)]
    ideal_dx: Option<f64>,

    /// Vertical eye offset, in pixels, that scores 100.
    #[arg(long)]
    ideal_dy: Option<f64>,

    /// Log a timing summary every N frames.
    #[arg(long)]
    summary_every: Option<usize>,
}

impl Cli {
    fn apply(self, mut settings: Settings) -> Settings {
        if let Some(v) = self.host {
            settings.host = v;
        }
        if let Some(v) = self.port {
            settings.port = v;
        }
        if let Some(v) = self.models_dir {
            settings.models_dir = Some(v);
        }
        if let Some(v) = self.detection_confidence {
            settings.detection_confidence = v;
        }
        if let Some(v) = self.mesh_confidence {
            settings.mesh_confidence = v;
        }
        if let Some(v) = self.max_mesh_faces {
            settings.max_mesh_faces = v;
        }
        if let Some(v) = self.ideal_dx {
            settings.ideal_dx = v;
        }
        if let Some(v) = self.ideal_dy {
            settings.ideal_dy = v;
        }
        if let Some(v) = self.summary_every {
            settings.summary_every = v;
        }
        settings
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let settings = cli.apply(settings);
    settings.validate()?;

    // Models load (and may download) before the async runtime starts.
    let processor = build_processor(&settings)?;
    log::info!("Face analysis models loaded");

    let config = ServerConfig {
        host: settings.host.clone(),
        port: settings.port,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let running = server::run(&config, processor).await?;
        shutdown_signal().await;
        running.shutdown().await;
        Ok::<(), std::io::Error>(())
    })?;

    Ok(())
}

fn build_processor(settings: &Settings) -> Result<ProcessFrameUseCase, Box<dyn std::error::Error>> {
    let models_dir = settings.models_dir.as_deref();
    let detector_path = resolve_model(
        FACE_DETECTION_MODEL_NAME,
        models_dir,
        settings.detection_model_url.as_deref(),
    )?;
    let mesh_path = resolve_model(
        FACE_MESH_MODEL_NAME,
        models_dir,
        settings.mesh_model_url.as_deref(),
    )?;

    let detector = OnnxBlazefaceDetector::new(&detector_path, settings.detection_confidence)?;
    let landmarker = OnnxFaceMesh::new(
        &mesh_path,
        &detector_path,
        settings.mesh_confidence,
        settings.max_mesh_faces,
    )?;
    let scorer = EyeContactScorer::new(EyeContactParams {
        ideal_dx: settings.ideal_dx,
        ideal_dy: settings.ideal_dy,
        left_eye: settings.left_eye_landmark,
        right_eye: settings.right_eye_landmark,
    })?;

    Ok(ProcessFrameUseCase::new(
        Box::new(DataUriDecoder::new()),
        Box::new(detector),
        Box::new(landmarker),
        scorer,
        Box::new(LogPipelineLogger::new(settings.summary_every)),
    ))
}

fn resolve_model(
    name: &str,
    models_dir: Option<&Path>,
    url: Option<&str>,
) -> Result<PathBuf, model_resolver::ModelResolveError> {
    let path = model_resolver::resolve(&ModelSource {
        name,
        models_dir,
        url,
    })?;
    log::debug!("Using {name} from {}", path.display());
    Ok(path)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
