//! Face analysis core for the eye-contact service.
//!
//! Bounded contexts follow a domain/infrastructure split: domain traits
//! describe capabilities, infrastructure modules implement them with ONNX
//! Runtime and the `image` crate.

pub mod detection;
pub mod ingest;
pub mod pipeline;
pub mod scoring;
pub mod shared;
