//! # gcodepreview-service
//!
//! Queue-driven preview generation: a consumer pulls validated render jobs
//! from a message source, the pipeline fetches the job's G-code, renders
//! the eight compass views, and stores the encoded frames.

pub mod config;
pub mod consumer;
pub mod pipeline;

pub use config::ServiceConfig;
pub use consumer::{
    parse_job, ConsumerEvent, ConsumerState, JobConsumer, JobSource, SourceError, StateError,
};
pub use pipeline::{
    encode_png, BedProvider, FileStore, JobHandler, JobOutcome, RenderPipeline, ServiceError,
};
