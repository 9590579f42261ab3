use std::time::Instant;

use chrono::{Local, SecondsFormat};

use crate::detection::domain::analyzer_error::AnalyzerError;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::ingest::domain::frame_decoder::FrameDecoder;
use crate::pipeline::frame_result::{FaceRecord, FrameError, FrameResult};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::scoring::eye_contact_scorer::{round2, EyeContactScorer};

/// Per-frame pipeline: decode → detect + landmarks → score → assemble.
///
/// Holds the analysis capabilities for the life of the process; nothing
/// about a frame survives the call that processes it.
pub struct ProcessFrameUseCase {
    decoder: Box<dyn FrameDecoder>,
    detector: Box<dyn FaceDetector>,
    landmarker: Box<dyn LandmarkDetector>,
    scorer: EyeContactScorer,
    logger: Box<dyn PipelineLogger>,
}

impl ProcessFrameUseCase {
    pub fn new(
        decoder: Box<dyn FrameDecoder>,
        detector: Box<dyn FaceDetector>,
        landmarker: Box<dyn LandmarkDetector>,
        scorer: EyeContactScorer,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            decoder,
            detector,
            landmarker,
            scorer,
            logger,
        }
    }

    /// Analyzes one data-URI encoded image.
    pub fn execute(&mut self, encoded_image: &str) -> Result<FrameResult, FrameError> {
        let t0 = Instant::now();
        let frame = self.decoder.decode(encoded_image)?;
        self.logger.timing("decode", elapsed_ms(t0));

        let (width, height) = (frame.width(), frame.height());

        let t0 = Instant::now();
        let detections = self
            .detector
            .detect(&frame)
            .map_err(AnalyzerError::Detection)?;
        self.logger.timing("detect", elapsed_ms(t0));

        let t0 = Instant::now();
        let landmarks = self
            .landmarker
            .landmarks(&frame)
            .map_err(AnalyzerError::Landmarks)?;
        self.logger.timing("landmarks", elapsed_ms(t0));
        drop(frame);

        let t0 = Instant::now();
        let faces: Vec<FaceRecord> = detections
            .iter()
            .enumerate()
            .map(|(idx, det)| {
                let px = det.to_pixels(width, height);
                FaceRecord {
                    x: px.x,
                    y: px.y,
                    width: px.width,
                    height: px.height,
                    confidence: round2(det.confidence),
                    eye_contact_percentage: self.scorer.score(landmarks.get(idx), width, height),
                }
            })
            .collect();
        self.logger.timing("score", elapsed_ms(t0));

        self.logger.metric("faces", faces.len() as f64);
        self.logger.frame_done();

        Ok(FrameResult::new(faces, now_iso8601()))
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

fn now_iso8601() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
