//! Tube mesh generation for extrusion segments.
//!
//! Each segment becomes a solid tube of 12 flat-shaded triangles so a 1-D
//! move gets visible thickness. Generation is independent per segment and
//! runs on a bounded worker pool, scattering results into index-stable
//! slots of a preallocated buffer.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::gcode::Segment;

/// Triangles emitted per segment tube.
pub const TRIANGLES_PER_SEGMENT: usize = 12;
/// Vertices emitted per segment tube.
pub const VERTICES_PER_SEGMENT: usize = TRIANGLES_PER_SEGMENT * 3;

/// Default cross-section extents of an extruded track, bed units.
pub const DEFAULT_TRACK_WIDTH: f32 = 0.3;
pub const DEFAULT_TRACK_HEIGHT: f32 = 0.3;

/// Interleaved position + normal vertex, laid out for direct GPU upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Flat-shaded normal from the three vertices of a triangle.
fn triangle_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    let normal = (v1 - v0).cross(v2 - v0);
    if normal.length_squared() > 0.0 {
        normal.normalize()
    } else {
        Vec3::Z
    }
}

/// Generate the 36 vertices of one segment tube.
///
/// The cross-section is a diamond: corners sit at `±half_height·up` and
/// `±half_width·right`, not at the four box corners. Degenerate directions
/// (zero-length segment, or a segment parallel to +Z) fall back to +X.
pub fn segment_vertices(
    segment: &Segment,
    width: f32,
    height: f32,
) -> [MeshVertex; VERTICES_PER_SEGMENT] {
    let start = segment.start.as_vec3();
    let end = segment.end.as_vec3();

    let direction = end - start;
    let direction = if direction.length_squared() > 0.0 {
        direction.normalize()
    } else {
        Vec3::X
    };

    let up = Vec3::Z;
    let right = direction.cross(up);
    let right = if right.length_squared() > 0.0 {
        right.normalize()
    } else {
        Vec3::X
    };

    let half_width = width / 2.0;
    let half_height = height / 2.0;

    let corners = |point: Vec3| {
        [
            point + half_height * up,
            point + half_width * right,
            point - half_height * up,
            point - half_width * right,
        ]
    };
    let s = corners(start);
    let e = corners(end);

    const TOP: usize = 0;
    const RIGHT: usize = 1;
    const BOTTOM: usize = 2;
    const LEFT: usize = 3;

    let mut vertices = [MeshVertex::zeroed(); VERTICES_PER_SEGMENT];
    let mut cursor = 0;
    let mut triangle = |v0: Vec3, v1: Vec3, v2: Vec3| {
        let normal = triangle_normal(v0, v1, v2).to_array();
        for vertex in [v0, v1, v2] {
            vertices[cursor] = MeshVertex {
                position: vertex.to_array(),
                normal,
            };
            cursor += 1;
        }
    };

    // Start cap.
    triangle(s[BOTTOM], s[RIGHT], s[TOP]);
    triangle(s[LEFT], s[BOTTOM], s[TOP]);
    // End cap.
    triangle(e[TOP], e[RIGHT], e[BOTTOM]);
    triangle(e[TOP], e[BOTTOM], e[LEFT]);
    // Top-right face.
    triangle(s[RIGHT], e[TOP], s[TOP]);
    triangle(e[RIGHT], e[TOP], s[RIGHT]);
    // Top-left face.
    triangle(s[LEFT], e[TOP], s[TOP]);
    triangle(e[LEFT], e[TOP], s[LEFT]);
    // Bottom-right face.
    triangle(s[RIGHT], e[RIGHT], s[BOTTOM]);
    triangle(e[BOTTOM], s[BOTTOM], e[RIGHT]);
    // Bottom-left face.
    triangle(s[LEFT], e[BOTTOM], s[BOTTOM]);
    triangle(e[LEFT], e[BOTTOM], s[LEFT]);

    vertices
}

/// Worker pool size: all hardware threads but one.
fn mesh_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(2)
        .saturating_sub(1)
        .max(1)
}

/// Build the interleaved vertex buffer for a whole toolpath.
///
/// Embarrassingly parallel: segment `i` writes only the slot
/// `[i*36, (i+1)*36)`, so completion order never affects the output. The
/// caller keeps the result and reuses it across all eight view renders.
pub fn build_toolpath_mesh(segments: &[Segment], width: f32, height: f32) -> Vec<MeshVertex> {
    let mut vertices = vec![MeshVertex::zeroed(); segments.len() * VERTICES_PER_SEGMENT];
    if segments.is_empty() {
        return vertices;
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(mesh_worker_count())
        .build()
    {
        Ok(pool) => pool.install(|| {
            vertices
                .par_chunks_mut(VERTICES_PER_SEGMENT)
                .zip(segments.par_iter())
                .for_each(|(slot, segment)| {
                    slot.copy_from_slice(&segment_vertices(segment, width, height));
                });
        }),
        Err(err) => {
            warn!("mesh worker pool unavailable ({err}), building sequentially");
            for (slot, segment) in vertices.chunks_mut(VERTICES_PER_SEGMENT).zip(segments) {
                slot.copy_from_slice(&segment_vertices(segment, width, height));
            }
        }
    }

    debug!(
        segments = segments.len(),
        vertices = vertices.len(),
        "built toolpath mesh"
    );
    vertices
}
