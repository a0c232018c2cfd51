//! Mesh generation, camera planning, and the offline scene renderer.

pub mod camera;
pub mod context;
pub mod grid;
pub mod mesh;
pub mod scene;
pub mod shaders;

pub use camera::View;
pub use mesh::{build_toolpath_mesh, segment_vertices, MeshVertex, VERTICES_PER_SEGMENT};
pub use scene::{render_views, RenderError, RgbaFrame, SceneRenderer};
