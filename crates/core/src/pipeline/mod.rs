pub mod frame_result;
pub mod pipeline_logger;
pub mod process_frame_use_case;
