pub const FACE_DETECTION_MODEL_NAME: &str = "blazeface_short_range.onnx";
pub const FACE_MESH_MODEL_NAME: &str = "face_mesh_468.onnx";

/// Minimum confidence for a face to be reported.
pub const DEFAULT_DETECTION_CONFIDENCE: f64 = 0.6;

/// Minimum confidence for the mesh model's own face locator.
pub const DEFAULT_MESH_CONFIDENCE: f64 = 0.5;

/// Faces the mesh model extracts landmarks for.
pub const DEFAULT_MAX_MESH_FACES: usize = 1;

/// Face mesh points approximating the left and right eye centers.
pub const LEFT_EYE_LANDMARK: usize = 159;
pub const RIGHT_EYE_LANDMARK: usize = 386;

/// Calibration for a frontal face at webcam distance, in pixels.
pub const DEFAULT_IDEAL_DX: f64 = 60.0;
pub const DEFAULT_IDEAL_DY: f64 = 10.0;

pub const NO_FACE_WARNING: &str = "No face detected";
pub const MULTIPLE_FACES_WARNING: &str = "Multiple faces detected";

pub const DEFAULT_PORT: u16 = 5000;
