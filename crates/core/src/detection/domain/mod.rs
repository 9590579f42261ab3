pub mod analyzer_error;
pub mod detection;
pub mod face_detector;
pub mod face_landmarks;
pub mod landmark_detector;
