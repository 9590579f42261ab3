/// Face mesh landmark extractor using ONNX Runtime via `ort`.
///
/// The mesh model works on a face crop, so this extractor runs its own
/// BlazeFace pass to find faces, crops a square region around each one and
/// maps the 468 predicted points back to normalized image coordinates.
use std::path::Path;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::face_detector::{BackendError, FaceDetector};
use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::shared::frame::Frame;

use super::onnx_session::load_session;
use super::onnx_blazeface_detector::{sigmoid, OnnxBlazefaceDetector};

/// Mesh model input resolution.
const INPUT_SIZE: u32 = 192;

/// Landmarks predicted per face.
pub const NUM_LANDMARKS: usize = 468;

/// Values per landmark in the model output (x, y, z).
const LANDMARK_STRIDE: usize = 3;

/// The crop is the detection box's longer side scaled by this factor.
const ROI_SCALE: f64 = 1.5;

/// Faces whose presence score falls below this are dropped.
const PRESENCE_THRESH: f32 = 0.5;

pub struct OnnxFaceMesh {
    session: ort::session::Session,
    locator: Box<dyn FaceDetector>,
    max_faces: usize,
}

impl OnnxFaceMesh {
    /// Load the mesh model along with its own BlazeFace locator.
    pub fn new(
        mesh_model_path: &Path,
        detector_model_path: &Path,
        confidence: f64,
        max_faces: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let locator = OnnxBlazefaceDetector::new(detector_model_path, confidence)?;
        Self::with_locator(mesh_model_path, Box::new(locator), max_faces)
    }

    pub fn with_locator(
        mesh_model_path: &Path,
        locator: Box<dyn FaceDetector>,
        max_faces: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(mesh_model_path)?;
        log::debug!(
            "Loaded face mesh from {} (max {max_faces} faces)",
            mesh_model_path.display()
        );
        Ok(Self {
            session,
            locator,
            max_faces: max_faces.max(1),
        })
    }

    fn run_mesh(&mut self, frame: &Frame, roi: &Roi) -> Result<Option<LandmarkSet>, BackendError> {
        let input_tensor = crop_and_resize(frame, roi, INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Face mesh model produced no outputs".into());
        }

        // Output 0: [1, 1, 1, 1404] landmarks in crop pixels.
        // Output 1 (optional): [1, 1, 1, 1] face presence logit.
        if outputs.len() >= 2 {
            let presence = outputs[1].try_extract_array::<f32>()?;
            if let Some(&logit) = presence.iter().next() {
                if sigmoid(logit) < PRESENCE_THRESH {
                    return Ok(None);
                }
            }
        }

        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get landmark slice")?;
        if data.len() < NUM_LANDMARKS * LANDMARK_STRIDE {
            return Err(format!(
                "Face mesh expected {} values, got {}",
                NUM_LANDMARKS * LANDMARK_STRIDE,
                data.len()
            )
            .into());
        }

        Ok(Some(map_landmarks(
            data,
            roi,
            frame.width(),
            frame.height(),
        )))
    }
}

impl LandmarkDetector for OnnxFaceMesh {
    fn landmarks(&mut self, frame: &Frame) -> Result<Vec<LandmarkSet>, BackendError> {
        let mut faces = self.locator.detect(frame)?;
        faces.truncate(self.max_faces);

        let mut sets = Vec::with_capacity(faces.len());
        for det in &faces {
            let roi = Roi::around(det, frame.width(), frame.height());
            if let Some(set) = self.run_mesh(frame, &roi)? {
                sets.push(set);
            }
        }
        Ok(sets)
    }
}

/// Square crop in frame pixels; may extend past the frame edges.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Roi {
    x: f64,
    y: f64,
    side: f64,
}

impl Roi {
    fn around(det: &Detection, frame_w: u32, frame_h: u32) -> Self {
        let fw = frame_w as f64;
        let fh = frame_h as f64;
        let cx = (det.xmin + det.width / 2.0) * fw;
        let cy = (det.ymin + det.height / 2.0) * fh;
        let side = (det.width * fw).max(det.height * fh) * ROI_SCALE;
        Self {
            x: cx - side / 2.0,
            y: cy - side / 2.0,
            side,
        }
    }
}

/// Sample the ROI into a `size × size` [0,1] NCHW tensor; pixels outside
/// the frame are black.
fn crop_and_resize(frame: &Frame, roi: &Roi, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_w = frame.width() as f64;
    let src_h = frame.height() as f64;
    let s = size as usize;
    let step = roi.side / s as f64;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let sy = roi.y + (y as f64 + 0.5) * step;
        if sy < 0.0 || sy >= src_h {
            continue;
        }
        for x in 0..s {
            let sx = roi.x + (x as f64 + 0.5) * step;
            if sx < 0.0 || sx >= src_w {
                continue;
            }
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[sy as usize, sx as usize, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

fn map_landmarks(data: &[f32], roi: &Roi, frame_w: u32, frame_h: u32) -> LandmarkSet {
    let scale = roi.side / INPUT_SIZE as f64;
    let points = data
        .chunks_exact(LANDMARK_STRIDE)
        .take(NUM_LANDMARKS)
        .map(|p| {
            let x = (roi.x + p[0] as f64 * scale) / frame_w as f64;
            let y = (roi.y + p[1] as f64 * scale) / frame_h as f64;
            (x, y)
        })
        .collect();
    LandmarkSet::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn detection(xmin: f64, ymin: f64, width: f64, height: f64) -> Detection {
        Detection {
            xmin,
            ymin,
            width,
            height,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_roi_is_square_and_centered() {
        // 100x50 px box centered at (200, 150) in a 400x300 frame
        let det = detection(0.375, 125.0 / 300.0, 0.25, 50.0 / 300.0);
        let roi = Roi::around(&det, 400, 300);
        assert_relative_eq!(roi.side, 150.0, epsilon = 1e-9);
        assert_relative_eq!(roi.x + roi.side / 2.0, 200.0, epsilon = 1e-9);
        assert_relative_eq!(roi.y + roi.side / 2.0, 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_crop_outside_frame_is_black() {
        let frame = Frame::new(vec![255u8; 10 * 10 * 3], 10, 10, 3);
        let roi = Roi {
            x: -10.0,
            y: -10.0,
            side: 20.0,
        };
        let tensor = crop_and_resize(&frame, &roi, 4);
        assert_eq!(tensor.shape(), &[1, 3, 4, 4]);
        // Top-left quadrant samples negative coordinates.
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 0.0);
        // Bottom-right quadrant lands inside the frame.
        assert_relative_eq!(tensor[[0, 0, 3, 3]], 1.0);
    }

    #[test]
    fn test_map_landmarks_to_normalized_frame_coords() {
        let roi = Roi {
            x: 100.0,
            y: 50.0,
            side: 192.0,
        };
        let mut data = vec![0.0f32; NUM_LANDMARKS * LANDMARK_STRIDE];
        // Landmark 1 at crop center.
        data[3] = 96.0;
        data[4] = 96.0;

        let set = map_landmarks(&data, &roi, 400, 300);

        assert_eq!(set.len(), NUM_LANDMARKS);
        let (x0, y0) = set.point(0).unwrap();
        assert_relative_eq!(x0, 100.0 / 400.0);
        assert_relative_eq!(y0, 50.0 / 300.0);
        let (x1, y1) = set.point(1).unwrap();
        assert_relative_eq!(x1, 196.0 / 400.0);
        assert_relative_eq!(y1, 146.0 / 300.0);
    }
}
