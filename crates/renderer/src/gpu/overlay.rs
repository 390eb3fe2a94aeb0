use anyhow::{Context, Result};
use wgpu::util::DeviceExt;

use crate::compile::{OVERLAY_FRAGMENT_GLSL, OVERLAY_VERTEX_GLSL};
use crate::overlay::{fits_texture, OverlayRect};
use crate::pipeline::compile;
use crate::types::{OverlayAnchor, OverlaySettings, ViewportSize};
use crate::uniforms::{UniformBlock, OVERLAY_RECT};

use super::pipeline::{build_render_pipeline, uniform_layout, vertex_buffer, StageSources, UNIT_QUAD_VERTICES};

/// Static image drawn over the pattern with alpha blending.
pub(crate) struct OverlayPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
    vertices: wgpu::Buffer,
    block: UniformBlock,
    image_size: (u32, u32),
    anchor: OverlayAnchor,
}

impl OverlayPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        settings: &OverlaySettings,
        format: wgpu::TextureFormat,
        viewport: ViewportSize,
    ) -> Result<Self> {
        let image = image::open(&settings.image)
            .with_context(|| format!("failed to load overlay image {}", settings.image.display()))?
            .to_rgba8();
        let image_size = image.dimensions();
        fits_texture(image_size, device.limits().max_texture_dimension_2d)
            .with_context(|| format!("cannot upload overlay image {}", settings.image.display()))?;

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("overlay image"),
                size: wgpu::Extent3d {
                    width: image_size.0,
                    height: image_size.1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            image.as_raw(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("overlay sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("overlay texture layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("overlay texture bind group"),
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let program = compile(OVERLAY_VERTEX_GLSL, OVERLAY_FRAGMENT_GLSL)?;
        let rect_layout = uniform_layout(device, "overlay uniform layout");
        let pipeline = build_render_pipeline(
            device,
            "overlay pipeline",
            StageSources {
                vertex: program.vertex_source(),
                fragment: program.fragment_source(),
            },
            format,
            &[&rect_layout, &texture_layout],
            Some(wgpu::BlendState::ALPHA_BLENDING),
        )?;

        let block = program.uniforms().block();
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("overlay uniforms"),
            size: block.as_bytes().len() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("overlay uniform bind group"),
            layout: &rect_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        tracing::info!(
            path = %settings.image.display(),
            width = image_size.0,
            height = image_size.1,
            anchor = ?settings.anchor,
            "loaded overlay image"
        );

        let mut pass = Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group,
            vertices: vertex_buffer(device, "overlay quad", &UNIT_QUAD_VERTICES),
            block,
            image_size,
            anchor: settings.anchor,
        };
        pass.resize(queue, viewport);
        Ok(pass)
    }

    /// Re-anchors the image for a new viewport.
    pub fn resize(&mut self, queue: &wgpu::Queue, viewport: ViewportSize) {
        let rect = OverlayRect::place(self.anchor, self.image_size, viewport);
        self.block.set_vec4(OVERLAY_RECT, rect.to_clip_space(viewport));
        queue.write_buffer(&self.uniform_buffer, 0, self.block.as_bytes());
    }

    pub fn encode(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, &self.texture_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertices.slice(..));
        pass.draw(0..UNIT_QUAD_VERTICES.len() as u32, 0..1);
    }
}
