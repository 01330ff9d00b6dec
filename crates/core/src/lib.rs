//! Face-yoga coaching core.
//!
//! Pure frame-evaluation pipeline (quality scoring, landmark feature
//! normalization, personal-baseline calibration, movement phase machine,
//! frame evaluator) plus the in-memory run stores that the request layer
//! drives. Nothing in this crate performs I/O or awaits.

pub mod calibration;
pub mod error;
pub mod evaluator;
pub mod measurement;
pub mod movements;
pub mod normalization;
pub mod phase;
pub mod quality;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod types;
