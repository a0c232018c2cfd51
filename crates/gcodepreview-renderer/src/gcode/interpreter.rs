//! Toolpath interpretation: motion-mode state machine and arc expansion.

use glam::DVec3;
use tracing::debug;

use super::{Command, CommandKind};

/// Arcs with a smaller planar radius degrade to a straight segment.
const MIN_ARC_RADIUS: f64 = 1e-3;
/// Target sub-segment length when subdividing arcs, bed units.
const ARC_SEGMENT_LENGTH: f64 = 1.0;
/// Minimum sub-segments per arc.
const MIN_ARC_SEGMENTS: usize = 4;

/// One straight extrusion move in bed space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: DVec3,
    pub end: DVec3,
}

/// Axis-aligned bounds over all segment endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec3,
    pub max: DVec3,
}

impl Bounds {
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Euclidean length of the (width, height, depth) vector.
    pub fn diagonal(&self) -> f64 {
        self.size().length()
    }
}

/// Result of one interpretation pass over a G-code program.
#[derive(Debug, Clone, Default)]
pub struct Toolpath {
    /// Extrusion segments in draw order.
    pub segments: Vec<Segment>,
    /// `None` when the program produced no renderable geometry.
    pub bounds: Option<Bounds>,
}

/// Sequential G-code interpreter.
///
/// Tracks the nozzle position and positioning mode while discarding motion
/// that does not extrude. Each line's effect depends on the state left by
/// all prior lines, so interpretation must not be parallelized.
///
/// Moves that leave any coordinate negative are treated as purge or priming
/// moves: the state advances but nothing is emitted.
#[derive(Debug)]
pub struct ToolpathInterpreter {
    position: DVec3,
    absolute: bool,
}

impl Default for ToolpathInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolpathInterpreter {
    pub fn new() -> Self {
        Self {
            position: DVec3::ZERO,
            absolute: true,
        }
    }

    /// Parse a full program into extrusion segments and their bounds.
    pub fn parse(mut self, gcode: &str) -> Toolpath {
        let mut segments = Vec::new();
        for line in gcode.lines() {
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let command = Command::parse(line);
            match command.kind {
                CommandKind::Comment | CommandKind::SetPosition | CommandKind::Other => {}
                CommandKind::Absolute => self.absolute = true,
                CommandKind::Relative => self.absolute = false,
                CommandKind::Rapid | CommandKind::Linear => {
                    if let Some(segment) = self.linear_move(&command) {
                        segments.push(segment);
                    }
                }
                CommandKind::ArcCw => self.arc_move(&command, true, &mut segments),
                CommandKind::ArcCcw => self.arc_move(&command, false, &mut segments),
            }
        }
        let bounds = bounds_of(&segments);
        debug!(segments = segments.len(), "interpreted toolpath");
        Toolpath { segments, bounds }
    }

    /// Target of a move: absolute mode replaces commanded axes, relative
    /// mode adds them; unspecified axes hold their current value.
    fn target_of(&self, command: &Command) -> DVec3 {
        if self.absolute {
            DVec3::new(
                command.x.unwrap_or(self.position.x),
                command.y.unwrap_or(self.position.y),
                command.z.unwrap_or(self.position.z),
            )
        } else {
            self.position
                + DVec3::new(
                    command.x.unwrap_or(0.0),
                    command.y.unwrap_or(0.0),
                    command.z.unwrap_or(0.0),
                )
        }
    }

    /// Apply a G0/G1 move. Emits a segment only for extrusion moves that
    /// land in the printable (non-negative) region.
    fn linear_move(&mut self, command: &Command) -> Option<Segment> {
        let start = self.position;
        self.position = self.target_of(command);

        if self.position.min_element() < 0.0 {
            return None;
        }
        let extruding = command.e.is_some_and(|e| e > 0.0);
        if extruding && command.has_axis_word() {
            Some(Segment {
                start,
                end: self.position,
            })
        } else {
            None
        }
    }

    /// Expand a G2/G3 arc into straight sub-segments.
    ///
    /// The center comes from the I/J/K offsets, the radius from the planar
    /// distance to the start point. The final sub-segment lands exactly on
    /// the commanded end position.
    fn arc_move(&mut self, command: &Command, clockwise: bool, segments: &mut Vec<Segment>) {
        let start = self.position;
        let end = self.target_of(command);

        // Purge exclusion is checked against the arc's start point; the
        // nozzle still advances to the end position.
        if start.min_element() < 0.0 {
            self.position = end;
            return;
        }

        let extruding = command.e.is_some_and(|e| e > 0.0);
        let center = start
            + DVec3::new(
                command.i.unwrap_or(0.0),
                command.j.unwrap_or(0.0),
                command.k.unwrap_or(0.0),
            );
        let start_vec = start - center;
        let radius = start_vec.truncate().length();

        if radius < MIN_ARC_RADIUS {
            // Degenerate center: draw the chord instead.
            if extruding {
                segments.push(Segment { start, end });
            }
            self.position = end;
            return;
        }

        let start_angle = start_vec.y.atan2(start_vec.x);
        let end_vec = end - center;
        let end_angle = end_vec.y.atan2(end_vec.x);

        // Sign-correct the span: clockwise arcs sweep a non-positive angle,
        // counter-clockwise arcs a non-negative one.
        let mut span = end_angle - start_angle;
        if clockwise && span > 0.0 {
            span -= std::f64::consts::TAU;
        } else if !clockwise && span < 0.0 {
            span += std::f64::consts::TAU;
        }

        let arc_length = span.abs() * radius;
        let count = ((arc_length / ARC_SEGMENT_LENGTH) as usize).max(MIN_ARC_SEGMENTS);
        let z_step = (end.z - start.z) / count as f64;

        if extruding {
            let mut prev = start;
            for index in 1..=count {
                let next = if index == count {
                    end
                } else {
                    let angle = start_angle + span * (index as f64 / count as f64);
                    DVec3::new(
                        center.x + radius * angle.cos(),
                        center.y + radius * angle.sin(),
                        start.z + z_step * index as f64,
                    )
                };
                segments.push(Segment {
                    start: prev,
                    end: next,
                });
                prev = next;
            }
        }
        self.position = end;
    }
}

/// Componentwise min/max over all segment endpoints, or `None` for an empty
/// toolpath.
pub fn bounds_of(segments: &[Segment]) -> Option<Bounds> {
    let first = segments.first()?;
    let mut min = first.start.min(first.end);
    let mut max = first.start.max(first.end);
    for segment in &segments[1..] {
        min = min.min(segment.start.min(segment.end));
        max = max.max(segment.start.max(segment.end));
    }
    Some(Bounds { min, max })
}
