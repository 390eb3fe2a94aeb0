use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::warn;

use crate::pipeline::{PipelineError, ShaderProgram};
use crate::surface::{FrameError, RenderBackend};
use crate::types::{OverlaySettings, ViewportSize};

use super::context::GpuContext;
use super::overlay::OverlayPass;
use super::pipeline::PatternPipeline;

/// [`RenderBackend`] on top of wgpu.
pub struct GpuBackend {
    context: GpuContext,
    pattern: Option<PatternPipeline>,
    overlay: Option<OverlayPass>,
    opacity: f64,
}

impl GpuBackend {
    /// Acquires the surface, adapter and device for `target`.
    ///
    /// An overlay that cannot be loaded is logged and skipped.
    pub fn new<T>(
        target: T,
        size: ViewportSize,
        opacity: f32,
        overlay: Option<&OverlaySettings>,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
    {
        let context = GpuContext::new(target, size)?;
        let overlay = overlay.and_then(|settings| {
            match OverlayPass::new(
                &context.device,
                &context.queue,
                settings,
                context.format(),
                context.size,
            ) {
                Ok(pass) => Some(pass),
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "continuing without overlay");
                    None
                }
            }
        });

        Ok(Self {
            context,
            pattern: None,
            overlay,
            opacity: f64::from(opacity.clamp(0.0, 1.0)),
        })
    }

    fn acquire(&self) -> Result<wgpu::SurfaceTexture, FrameError> {
        self.context
            .surface
            .get_current_texture()
            .map_err(frame_error)
    }

    fn submit(&self, pattern_vertices: Option<u32>) -> Result<(), FrameError> {
        let frame = self.acquire()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pattern pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let size = self.context.size;
            pass.set_viewport(0.0, 0.0, size.width as f32, size.height as f32, 0.0, 1.0);

            if let (Some(count), Some(pattern)) = (pattern_vertices, self.pattern.as_ref()) {
                pass.set_pipeline(&pattern.pipeline);
                let opacity = self.opacity;
                pass.set_blend_constant(wgpu::Color {
                    r: opacity,
                    g: opacity,
                    b: opacity,
                    a: opacity,
                });
                pass.set_bind_group(0, &pattern.bind_group, &[]);
                pass.set_vertex_buffer(0, pattern.vertices.slice(..));
                pass.draw(0..count, 0..1);
                if let Some(overlay) = self.overlay.as_ref() {
                    overlay.encode(&mut pass);
                }
            }
        }

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

impl RenderBackend for GpuBackend {
    fn configure(&mut self, size: ViewportSize) {
        self.context.resize(size);
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.resize(&self.context.queue, self.context.size);
        }
    }

    fn drawable_size(&self) -> ViewportSize {
        self.context.size
    }

    fn clear(&mut self) -> Result<(), FrameError> {
        self.submit(None)
    }

    fn link(&mut self, program: &ShaderProgram) -> Result<(), PipelineError> {
        let pattern = PatternPipeline::new(&self.context.device, program, self.context.format())?;
        self.pattern = Some(pattern);
        Ok(())
    }

    fn upload_uniforms(&mut self, block: &[u8]) {
        if let Some(pattern) = self.pattern.as_ref() {
            self.context
                .queue
                .write_buffer(&pattern.uniform_buffer, 0, block);
        }
    }

    fn draw(&mut self, vertex_count: u32) -> Result<(), FrameError> {
        self.submit(Some(vertex_count))
    }
}

fn frame_error(err: wgpu::SurfaceError) -> FrameError {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => FrameError::SurfaceLost,
        wgpu::SurfaceError::OutOfMemory => FrameError::OutOfMemory,
        _ => FrameError::Timeout,
    }
}
