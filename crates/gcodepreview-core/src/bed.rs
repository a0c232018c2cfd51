//! Printer bed (work envelope) description.

use serde::{Deserialize, Serialize};

/// Physical work envelope of the target machine, in bed-space units.
///
/// Supplied by a device-lookup collaborator and never mutated by the
/// rendering core. The reference grid drawn under a toolpath spans the X/Y
/// extents at Z = 0; the envelope itself is not part of the toolpath
/// geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrinterBed {
    pub min_x: f32,
    pub min_y: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub max_z: f32,
}

impl Default for PrinterBed {
    /// Fallback envelope used when no device record is available.
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            min_z: 0.0,
            max_x: 250.0,
            max_y: 210.0,
            max_z: 220.0,
        }
    }
}

impl PrinterBed {
    pub fn new(min_x: f32, min_y: f32, min_z: f32, max_x: f32, max_y: f32, max_z: f32) -> Self {
        Self {
            min_x,
            min_y,
            min_z,
            max_x,
            max_y,
            max_z,
        }
    }

    /// Extent along X.
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Extent along Y.
    pub fn depth(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Extent along Z.
    pub fn height(&self) -> f32 {
        self.max_z - self.min_z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_envelope_matches_fallback_machine() {
        let bed = PrinterBed::default();
        assert_eq!(bed.min_x, 0.0);
        assert_eq!(bed.min_y, 0.0);
        assert_eq!(bed.min_z, 0.0);
        assert_eq!(bed.max_x, 250.0);
        assert_eq!(bed.max_y, 210.0);
        assert_eq!(bed.max_z, 220.0);
    }

    #[test]
    fn extents_are_signed_differences() {
        let bed = PrinterBed::new(-10.0, 0.0, 0.0, 10.0, 5.0, 2.5);
        assert_eq!(bed.width(), 20.0);
        assert_eq!(bed.depth(), 5.0);
        assert_eq!(bed.height(), 2.5);
    }
}
