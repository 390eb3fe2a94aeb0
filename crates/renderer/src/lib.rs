//! Renderer crate for psyche, a fullscreen animated shader pattern.
//!
//! The flow from configuration to pixels:
//!
//! ```text
//!   psyche CLI / config file
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ ShaderSources ──▶ winit event loop
//!                                           │
//!                          PatternView::mount (SurfaceManager + ShaderProgram)
//!                                           │
//!        Resized / CursorMoved / Occluded ──┤
//!                                           ▼
//!                      RedrawRequested ──▶ tick() ──▶ uniforms ─▶ draw 6 vertices
//!                                           └────────── request_redraw (vsync)
//! ```
//!
//! [`PatternView`] holds all per-mount state and is generic over its
//! [`RenderBackend`] and [`PresentationHost`], so the lifecycle can be driven
//! without a GPU. The fragment stage is assembled from a [`ColorMapping`];
//! [`pattern`] evaluates the same function on the CPU.

mod compile;
pub mod frame;
mod gpu;
pub mod input;
pub mod overlay;
pub mod pattern;
mod pipeline;
pub mod surface;
mod types;
pub mod uniforms;
pub mod view;
pub mod wake;
mod window;

use anyhow::Result;

pub use compile::{pattern_fragment_source, PATTERN_VERTEX_GLSL};
pub use frame::{LoopState, TimeSource};
pub use gpu::GpuBackend;
pub use input::InputTracker;
pub use pipeline::{compile, compile_sources, PipelineError, ShaderProgram, ShaderSources, Stage};
pub use surface::{FrameError, RenderBackend, SurfaceManager, QUAD_VERTEX_COUNT};
pub use types::{
    ColorMapping, Offset, OverlayAnchor, OverlaySettings, PresentationOptions, RendererConfig,
    ViewportSize, DEFAULT_DAMPING, DEFAULT_OPACITY,
};
pub use uniforms::{UniformSlot, UniformTable};
pub use view::{PatternView, PresentationHost, TickOutcome, ViewError, ViewOptions};
pub use window::WindowHost;

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Builds the shader sources and runs the window until it closes.
    ///
    /// Only failures to read a fragment override or to open a window are
    /// returned; GPU and shader failures leave a blank window instead.
    pub fn run(&mut self) -> Result<()> {
        let sources = ShaderSources::load(&self.config)?;
        tracing::info!(
            palette = self.config.color_mapping.name(),
            fragment_override = self.config.fragment_override.is_some(),
            "starting renderer"
        );
        window::run(&self.config, sources)
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }
}
