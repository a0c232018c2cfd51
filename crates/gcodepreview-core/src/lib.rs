//! # gcodepreview Core
//!
//! Shared domain types for the toolpath preview pipeline: printer bed
//! envelopes, render-job messages, and per-job output naming.

pub mod bed;
pub mod job;

pub use bed::PrinterBed;
pub use job::{view_image_filename, JobError, RenderJobRequest};
