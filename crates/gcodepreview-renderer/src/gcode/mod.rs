//! G-code command model and toolpath interpretation.
//!
//! This module provides:
//! - Per-line command parsing with present-or-absent parameters
//! - Sequential motion-state tracking (absolute/relative, nozzle position)
//! - Arc expansion into straight sub-segments
//! - Bounds computation over the emitted geometry

pub mod command;
pub mod interpreter;

pub use command::{Command, CommandKind};
pub use interpreter::{bounds_of, Bounds, Segment, Toolpath, ToolpathInterpreter};
