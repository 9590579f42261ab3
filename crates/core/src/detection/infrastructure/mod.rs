pub mod model_resolver;
pub mod onnx_blazeface_detector;
pub mod onnx_face_mesh;
pub mod onnx_session;
