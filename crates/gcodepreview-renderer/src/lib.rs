//! # gcodepreview Renderer
//!
//! Reconstructs the physical toolpath from a G-code command stream and
//! rasterizes eight fixed compass views of it into RGBA images.
//!
//! Pipeline: raw text → [`interpret`] → ([`Segment`]s, [`Bounds`]) → tube
//! mesh (parallel, index-stable) → [`SceneRenderer`], once per [`View`].

pub mod gcode;
pub mod render;

pub use gcode::{bounds_of, Bounds, Command, CommandKind, Segment, Toolpath, ToolpathInterpreter};
pub use render::{
    build_toolpath_mesh, camera, grid, mesh, render_views, segment_vertices, MeshVertex,
    RenderError, RgbaFrame, SceneRenderer, View, VERTICES_PER_SEGMENT,
};

/// Default output width for preview images, pixels.
pub const DEFAULT_WIDTH: u32 = 3840;
/// Default output height for preview images, pixels.
pub const DEFAULT_HEIGHT: u32 = 2160;

/// Interpret a G-code program into renderable extrusion segments.
///
/// Pure function of the input text; see [`ToolpathInterpreter`] for the
/// motion-state rules.
pub fn interpret(gcode: &str) -> Toolpath {
    ToolpathInterpreter::new().parse(gcode)
}
