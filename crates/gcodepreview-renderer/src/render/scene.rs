//! Offline scene renderer: FBO setup, uniform plumbing, and readback.

use glam::{Mat3, Mat4, Vec3};
use glow::HasContext;
use thiserror::Error;
use tracing::{debug, info};

use gcodepreview_core::PrinterBed;

use super::camera::{self, View};
use super::context::HeadlessContext;
use super::grid;
use super::mesh::{self, MeshVertex};
use super::shaders::{SCENE_FRAGMENT_SHADER, SCENE_VERTEX_SHADER};
use crate::gcode::{Bounds, Segment};

/// Multisample count for the offscreen color and depth buffers.
const MSAA_SAMPLES: i32 = 4;

const LIGHT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
const AMBIENT_COLOR: [f32; 3] = [0.3, 0.3, 0.3];
const DIFFUSE_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
const SPECULAR_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
const SHININESS: f32 = 64.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("GL context error: {0}")]
    Context(String),
    #[error("shader error: {0}")]
    Shader(String),
    #[error("buffer error: {0}")]
    Buffer(String),
    #[error("framebuffer incomplete: status {0:#06x}")]
    Framebuffer(u32),
    #[error("toolpath has no renderable geometry")]
    NoGeometry,
}

/// One rendered frame. Pixels are tightly packed RGBA8 with row 0 at the
/// top of the image.
#[derive(Debug, Clone)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

struct SceneBuffers {
    grid_vao: glow::VertexArray,
    grid_vbo: glow::Buffer,
    grid_vertex_count: i32,
    mesh_vao: glow::VertexArray,
    mesh_vbo: glow::Buffer,
    mesh_vertex_count: i32,
}

/// Owns the headless GL context plus the program, framebuffers, and vertex
/// buffers of one preview scene. Geometry is uploaded once and rendered
/// from every viewpoint.
pub struct SceneRenderer {
    // Keeps the EGL context current for as long as `gl` is alive.
    _context: HeadlessContext,
    gl: glow::Context,
    program: glow::Program,
    width: u32,
    height: u32,
    msaa_color: glow::Renderbuffer,
    msaa_depth: glow::Renderbuffer,
    msaa_fbo: glow::Framebuffer,
    resolve_color: glow::Renderbuffer,
    resolve_fbo: glow::Framebuffer,
    buffers: Option<SceneBuffers>,
}

impl SceneRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let context = HeadlessContext::new()?;
        let gl = context.load_gl();

        let program = compile_program(&gl, SCENE_VERTEX_SHADER, SCENE_FRAGMENT_SHADER)?;

        let (w, h) = (width as i32, height as i32);
        unsafe {
            let msaa_color = gl.create_renderbuffer().map_err(RenderError::Buffer)?;
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(msaa_color));
            gl.renderbuffer_storage_multisample(
                glow::RENDERBUFFER,
                MSAA_SAMPLES,
                glow::RGBA8,
                w,
                h,
            );

            let msaa_depth = gl.create_renderbuffer().map_err(RenderError::Buffer)?;
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(msaa_depth));
            gl.renderbuffer_storage_multisample(
                glow::RENDERBUFFER,
                MSAA_SAMPLES,
                glow::DEPTH_COMPONENT24,
                w,
                h,
            );

            let msaa_fbo = gl.create_framebuffer().map_err(RenderError::Buffer)?;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(msaa_fbo));
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::RENDERBUFFER,
                Some(msaa_color),
            );
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(msaa_depth),
            );
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            if status != glow::FRAMEBUFFER_COMPLETE {
                return Err(RenderError::Framebuffer(status));
            }

            // Single-sample target the MSAA buffer resolves into before
            // readback; glReadPixels cannot read multisampled storage.
            let resolve_color = gl.create_renderbuffer().map_err(RenderError::Buffer)?;
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(resolve_color));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::RGBA8, w, h);

            let resolve_fbo = gl.create_framebuffer().map_err(RenderError::Buffer)?;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(resolve_fbo));
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::RENDERBUFFER,
                Some(resolve_color),
            );
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            if status != glow::FRAMEBUFFER_COMPLETE {
                return Err(RenderError::Framebuffer(status));
            }

            gl.enable(glow::DEPTH_TEST);
            gl.enable(glow::MULTISAMPLE);

            info!(width, height, samples = MSAA_SAMPLES, "scene renderer ready");

            Ok(Self {
                _context: context,
                gl,
                program,
                width,
                height,
                msaa_color,
                msaa_depth,
                msaa_fbo,
                resolve_color,
                resolve_fbo,
                buffers: None,
            })
        }
    }

    /// Upload the bed grid and toolpath mesh, replacing any prior geometry.
    pub fn upload_toolpath(
        &mut self,
        grid_vertices: &[f32],
        mesh_vertices: &[MeshVertex],
    ) -> Result<(), RenderError> {
        self.release_buffers();

        let gl = &self.gl;
        unsafe {
            let grid_vao = gl.create_vertex_array().map_err(RenderError::Buffer)?;
            let grid_vbo = gl.create_buffer().map_err(RenderError::Buffer)?;
            gl.bind_vertex_array(Some(grid_vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(grid_vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(grid_vertices),
                glow::STATIC_DRAW,
            );
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 12, 0);

            let mesh_vao = gl.create_vertex_array().map_err(RenderError::Buffer)?;
            let mesh_vbo = gl.create_buffer().map_err(RenderError::Buffer)?;
            gl.bind_vertex_array(Some(mesh_vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(mesh_vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(mesh_vertices),
                glow::STATIC_DRAW,
            );
            let stride = std::mem::size_of::<MeshVertex>() as i32;
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 12);

            gl.bind_vertex_array(None);

            self.buffers = Some(SceneBuffers {
                grid_vao,
                grid_vbo,
                grid_vertex_count: (grid_vertices.len() / 3) as i32,
                mesh_vao,
                mesh_vbo,
                mesh_vertex_count: mesh_vertices.len() as i32,
            });
        }

        debug!(
            grid_vertices = grid_vertices.len() / 3,
            mesh_vertices = mesh_vertices.len(),
            "uploaded scene geometry"
        );
        Ok(())
    }

    /// Render one view and read the resolved frame back to the CPU.
    pub fn render_view(&self, bounds: &Bounds, view: View) -> Result<RgbaFrame, RenderError> {
        let buffers = self.buffers.as_ref().ok_or(RenderError::NoGeometry)?;

        let camera_pos = camera::camera_position(bounds, view);
        let mvp = camera::mvp_matrix(bounds, camera_pos, self.width, self.height);
        let light_pos = camera::light_position(bounds);

        let gl = &self.gl;
        let (w, h) = (self.width as i32, self.height as i32);
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.msaa_fbo));
            gl.viewport(0, 0, w, h);
            gl.clear_color(0.0, 0.0, 0.0, 0.0);
            gl.clear_depth_f64(1.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

            gl.use_program(Some(self.program));
            self.set_uniform_mat4("mvp_matrix", &mvp);
            self.set_uniform_mat4("model_matrix", &Mat4::IDENTITY);
            self.set_uniform_mat3("normal_matrix", &Mat3::IDENTITY.to_cols_array());
            self.set_uniform_vec3("light_position", light_pos);
            self.set_uniform_vec3("view_position", camera_pos);
            self.set_uniform_vec3("light_color", Vec3::from_array(LIGHT_COLOR));
            self.set_uniform_vec3("ambient_color", Vec3::from_array(AMBIENT_COLOR));
            self.set_uniform_vec3("diffuse_color", Vec3::from_array(DIFFUSE_COLOR));
            self.set_uniform_vec3("specular_color", Vec3::from_array(SPECULAR_COLOR));
            self.set_uniform_f32("shininess", SHININESS);

            // The grid has no per-vertex normals; the constant attribute
            // gives every line an upward-facing one.
            gl.bind_vertex_array(Some(buffers.grid_vao));
            gl.vertex_attrib_3_f32(1, 0.0, 0.0, 1.0);
            gl.draw_arrays(glow::LINES, 0, buffers.grid_vertex_count);

            gl.bind_vertex_array(Some(buffers.mesh_vao));
            gl.draw_arrays(glow::TRIANGLES, 0, buffers.mesh_vertex_count);
            gl.bind_vertex_array(None);

            let error = gl.get_error();
            if error != glow::NO_ERROR {
                return Err(RenderError::Context(format!(
                    "GL error {error:#06x} while rendering {view}"
                )));
            }

            gl.bind_framebuffer(glow::READ_FRAMEBUFFER, Some(self.msaa_fbo));
            gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, Some(self.resolve_fbo));
            gl.blit_framebuffer(
                0,
                0,
                w,
                h,
                0,
                0,
                w,
                h,
                glow::COLOR_BUFFER_BIT,
                glow::NEAREST,
            );

            gl.bind_framebuffer(glow::READ_FRAMEBUFFER, Some(self.resolve_fbo));
            let mut pixels = vec![0u8; self.width as usize * self.height as usize * 4];
            gl.read_pixels(
                0,
                0,
                w,
                h,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(&mut pixels),
            );

            Ok(RgbaFrame {
                width: self.width,
                height: self.height,
                pixels: flip_rows(pixels, self.width, self.height),
            })
        }
    }

    fn release_buffers(&mut self) {
        if let Some(buffers) = self.buffers.take() {
            unsafe {
                self.gl.delete_vertex_array(buffers.grid_vao);
                self.gl.delete_buffer(buffers.grid_vbo);
                self.gl.delete_vertex_array(buffers.mesh_vao);
                self.gl.delete_buffer(buffers.mesh_vbo);
            }
        }
    }

    fn set_uniform_mat4(&self, name: &str, matrix: &Mat4) {
        unsafe {
            if let Some(loc) = self.gl.get_uniform_location(self.program, name) {
                self.gl
                    .uniform_matrix_4_f32_slice(Some(&loc), false, &matrix.to_cols_array());
            }
        }
    }

    fn set_uniform_mat3(&self, name: &str, matrix: &[f32; 9]) {
        unsafe {
            if let Some(loc) = self.gl.get_uniform_location(self.program, name) {
                self.gl.uniform_matrix_3_f32_slice(Some(&loc), false, matrix);
            }
        }
    }

    fn set_uniform_vec3(&self, name: &str, vec: Vec3) {
        unsafe {
            if let Some(loc) = self.gl.get_uniform_location(self.program, name) {
                self.gl.uniform_3_f32(Some(&loc), vec.x, vec.y, vec.z);
            }
        }
    }

    fn set_uniform_f32(&self, name: &str, value: f32) {
        unsafe {
            if let Some(loc) = self.gl.get_uniform_location(self.program, name) {
                self.gl.uniform_1_f32(Some(&loc), value);
            }
        }
    }
}

impl Drop for SceneRenderer {
    fn drop(&mut self) {
        self.release_buffers();
        unsafe {
            self.gl.delete_framebuffer(self.msaa_fbo);
            self.gl.delete_framebuffer(self.resolve_fbo);
            self.gl.delete_renderbuffer(self.msaa_color);
            self.gl.delete_renderbuffer(self.msaa_depth);
            self.gl.delete_renderbuffer(self.resolve_color);
            self.gl.delete_program(self.program);
        }
    }
}

fn compile_program(
    gl: &glow::Context,
    vs_source: &str,
    fs_source: &str,
) -> Result<glow::Program, RenderError> {
    unsafe {
        let vs = gl
            .create_shader(glow::VERTEX_SHADER)
            .map_err(RenderError::Shader)?;
        gl.shader_source(vs, vs_source);
        gl.compile_shader(vs);
        if !gl.get_shader_compile_status(vs) {
            let info = gl.get_shader_info_log(vs);
            gl.delete_shader(vs);
            return Err(RenderError::Shader(format!("vertex shader: {info}")));
        }

        let fs = gl
            .create_shader(glow::FRAGMENT_SHADER)
            .map_err(RenderError::Shader)?;
        gl.shader_source(fs, fs_source);
        gl.compile_shader(fs);
        if !gl.get_shader_compile_status(fs) {
            let info = gl.get_shader_info_log(fs);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(RenderError::Shader(format!("fragment shader: {info}")));
        }

        let program = gl.create_program().map_err(RenderError::Shader)?;
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);
        if !gl.get_program_link_status(program) {
            let info = gl.get_program_info_log(program);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            gl.delete_program(program);
            return Err(RenderError::Shader(format!("program link: {info}")));
        }

        gl.delete_shader(vs);
        gl.delete_shader(fs);
        Ok(program)
    }
}

/// Reverse pixel rows so row 0 is the top of the image. GL reads frames
/// bottom-up; image files go top-down.
fn flip_rows(pixels: Vec<u8>, width: u32, height: u32) -> Vec<u8> {
    let row_bytes = width as usize * 4;
    let mut flipped = Vec::with_capacity(pixels.len());
    for row in pixels.chunks_exact(row_bytes).rev() {
        flipped.extend_from_slice(row);
    }
    debug_assert_eq!(flipped.len(), row_bytes * height as usize);
    flipped
}

/// Render all eight compass views of a toolpath.
///
/// Returns `(view, frame)` pairs in [`View::ALL`] order. Fails fast: the
/// first view that cannot be rendered aborts the whole call, since a GL
/// failure on one view means the context is unusable for the rest.
/// Toolpaths with no geometry are rejected before any GPU work happens.
pub fn render_views(
    segments: &[Segment],
    bounds: Option<&Bounds>,
    bed: &PrinterBed,
    width: u32,
    height: u32,
) -> Result<Vec<(View, RgbaFrame)>, RenderError> {
    let bounds = bounds.ok_or(RenderError::NoGeometry)?;
    if segments.is_empty() {
        return Err(RenderError::NoGeometry);
    }

    let mesh_vertices = mesh::build_toolpath_mesh(
        segments,
        mesh::DEFAULT_TRACK_WIDTH,
        mesh::DEFAULT_TRACK_HEIGHT,
    );
    let grid_vertices = grid::grid_vertices(bed);

    let mut renderer = SceneRenderer::new(width, height)?;
    renderer.upload_toolpath(&grid_vertices, &mesh_vertices)?;

    let mut frames = Vec::with_capacity(View::ALL.len());
    for view in View::ALL {
        let frame = renderer.render_view(bounds, view)?;
        debug!(%view, "rendered preview frame");
        frames.push((view, frame));
    }
    Ok(frames)
}
