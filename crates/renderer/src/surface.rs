use crate::pipeline::{PipelineError, ShaderProgram};
use crate::types::ViewportSize;

/// Two triangles covering the drawable.
pub const QUAD_VERTEX_COUNT: u32 = 6;

/// Per-frame presentation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("surface lost or outdated")]
    SurfaceLost,
    #[error("timed out acquiring the next frame")]
    Timeout,
    #[error("graphics device ran out of memory")]
    OutOfMemory,
}

/// The graphics operations a view needs from its context.
///
/// Implemented by the wgpu backend; tests substitute a recording double.
pub trait RenderBackend {
    /// Sizes the drawable and the rendering viewport to `(0, 0, width, height)`.
    fn configure(&mut self, size: ViewportSize);
    fn drawable_size(&self) -> ViewportSize;
    /// Presents a cleared (black) frame.
    fn clear(&mut self) -> Result<(), FrameError>;
    /// Turns a compiled program into a drawable pipeline.
    fn link(&mut self, program: &ShaderProgram) -> Result<(), PipelineError>;
    fn upload_uniforms(&mut self, block: &[u8]);
    fn draw(&mut self, vertex_count: u32) -> Result<(), FrameError>;
}

/// Owns the drawable and keeps it sized to the viewport.
#[derive(Debug)]
pub struct SurfaceManager<B> {
    backend: B,
    size: ViewportSize,
}

impl<B: RenderBackend> SurfaceManager<B> {
    /// Configures the drawable at `size`. An empty size keeps whatever the
    /// backend already has.
    pub fn new(mut backend: B, size: ViewportSize) -> Self {
        let size = if size.is_empty() {
            backend.drawable_size()
        } else {
            backend.configure(size);
            size
        };
        Self { backend, size }
    }

    /// Applies a new viewport size. Zero-area sizes are ignored and leave the
    /// previous drawable in place; returns whether the drawable changed.
    pub fn resize(&mut self, size: ViewportSize) -> bool {
        if size.is_empty() {
            tracing::debug!(width = size.width, height = size.height, "ignoring empty resize");
            return false;
        }
        self.size = size;
        self.backend.configure(size);
        true
    }

    /// Reconfigures at the current size after the surface was lost.
    pub fn reconfigure(&mut self) {
        if !self.size.is_empty() {
            self.backend.configure(self.size);
        }
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
