//! Deterministic inputs for tests, demos and the CLI synth commands.
//!
//! Nothing here is used on the prediction path; it exists so the pipeline can
//! be exercised end to end without recorded speech or trained artifacts.

pub mod artifacts;
pub mod onnx;
pub mod signals;
