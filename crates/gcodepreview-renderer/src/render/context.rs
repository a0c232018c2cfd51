//! Surfaceless EGL context for offline rendering.
//!
//! No window system is involved: the context is made current without a
//! surface and all drawing targets framebuffer objects. This is what lets
//! the renderer run on headless machines and in containers.

use khronos_egl as egl;

use super::scene::RenderError;

/// An initialized EGL display with a current OpenGL 3.3 core context.
///
/// The context stays current for the lifetime of this value and is torn
/// down on drop. All GL calls made through the paired [`glow::Context`]
/// must happen on the thread that created it.
pub struct HeadlessContext {
    egl: egl::Instance<egl::Static>,
    display: egl::Display,
    context: egl::Context,
}

fn ctx_err(call: &'static str) -> impl Fn(egl::Error) -> RenderError {
    move |err| RenderError::Context(format!("{call}: {err}"))
}

impl HeadlessContext {
    pub fn new() -> Result<Self, RenderError> {
        let egl = egl::Instance::new(egl::Static);

        let display = unsafe { egl.get_display(egl::DEFAULT_DISPLAY) }
            .ok_or_else(|| RenderError::Context("no default EGL display".into()))?;
        egl.initialize(display).map_err(ctx_err("eglInitialize"))?;
        egl.bind_api(egl::OPENGL_API).map_err(ctx_err("eglBindAPI"))?;

        let config_attribs = [
            egl::SURFACE_TYPE,
            egl::PBUFFER_BIT,
            egl::RED_SIZE,
            8,
            egl::GREEN_SIZE,
            8,
            egl::BLUE_SIZE,
            8,
            egl::ALPHA_SIZE,
            8,
            egl::DEPTH_SIZE,
            24,
            egl::RENDERABLE_TYPE,
            egl::OPENGL_BIT,
            egl::NONE,
        ];
        let config = egl
            .choose_first_config(display, &config_attribs)
            .map_err(ctx_err("eglChooseConfig"))?
            .ok_or_else(|| RenderError::Context("no matching EGL config".into()))?;

        let context_attribs = [
            egl::CONTEXT_MAJOR_VERSION,
            3,
            egl::CONTEXT_MINOR_VERSION,
            3,
            egl::CONTEXT_OPENGL_PROFILE_MASK,
            egl::CONTEXT_OPENGL_CORE_PROFILE_BIT,
            egl::NONE,
        ];
        let context = egl
            .create_context(display, config, None, &context_attribs)
            .map_err(ctx_err("eglCreateContext"))?;

        // Surfaceless: draw and read surfaces stay unset.
        egl.make_current(display, None, None, Some(context))
            .map_err(ctx_err("eglMakeCurrent"))?;

        Ok(Self {
            egl,
            display,
            context,
        })
    }

    /// Load GL function pointers into a [`glow::Context`].
    pub fn load_gl(&self) -> glow::Context {
        unsafe {
            glow::Context::from_loader_function(|name| match self.egl.get_proc_address(name) {
                Some(f) => f as *const std::ffi::c_void,
                None => std::ptr::null(),
            })
        }
    }
}

impl Drop for HeadlessContext {
    fn drop(&mut self) {
        let _ = self.egl.make_current(self.display, None, None, None);
        let _ = self.egl.destroy_context(self.display, self.context);
        let _ = self.egl.terminate(self.display);
    }
}
