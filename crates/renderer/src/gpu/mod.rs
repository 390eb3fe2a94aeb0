//! wgpu implementation of [`crate::surface::RenderBackend`].
//!
//! - `context` owns the instance, device and surface, and reconfigures the
//!   swapchain when the window resizes.
//! - `pipeline` turns a linked [`crate::ShaderProgram`] into a render pipeline
//!   with its uniform buffer and fullscreen quad.
//! - `overlay` uploads the optional overlay image and draws it with alpha
//!   blending after the pattern.
//! - `backend` records one render pass per frame and maps presentation errors
//!   onto [`crate::FrameError`].

mod backend;
mod context;
mod overlay;
mod pipeline;

pub use backend::GpuBackend;
