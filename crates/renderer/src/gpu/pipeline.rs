use std::borrow::Cow;

use wgpu::naga::ShaderStage;
use wgpu::util::DeviceExt;

use crate::pipeline::{PipelineError, ShaderProgram};

/// Fullscreen quad as two clip-space triangles.
pub(crate) const QUAD_VERTICES: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

/// Unit square in `[0, 1]`, mapped onto the overlay rectangle by its vertex stage.
pub(crate) const UNIT_QUAD_VERTICES: [[f32; 2]; 6] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [1.0, 1.0],
];

pub(crate) fn vertex_buffer(device: &wgpu::Device, label: &str, vertices: &[[f32; 2]]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

pub(crate) fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

pub(crate) struct StageSources<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

/// Creates a triangle-list pipeline with one `vec2` vertex attribute.
///
/// Device validation errors raised while building are captured through an
/// error scope and returned as link failures.
pub(crate) fn build_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    sources: StageSources<'_>,
    format: wgpu::TextureFormat,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    blend: Option<wgpu::BlendState>,
) -> Result<wgpu::RenderPipeline, PipelineError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{label} vertex")),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(sources.vertex.to_string()),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    });
    let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{label} fragment")),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(sources.fragment.to_string()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} layout")),
        bind_group_layouts,
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &vertex_module,
            entry_point: Some("main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x2],
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(PipelineError::Link {
            diagnostic: err.to_string(),
        }),
        None => Ok(pipeline),
    }
}

/// Fades the pattern into the cleared background by the pass blend constant.
const CONSTANT_OPACITY_BLENDING: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Constant,
        dst_factor: wgpu::BlendFactor::OneMinusConstant,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent::REPLACE,
};

/// GPU objects for the pattern program: pipeline, uniform buffer and quad.
pub(crate) struct PatternPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub vertices: wgpu::Buffer,
}

impl PatternPipeline {
    pub fn new(
        device: &wgpu::Device,
        program: &ShaderProgram,
        format: wgpu::TextureFormat,
    ) -> Result<Self, PipelineError> {
        let layout = uniform_layout(device, "pattern uniform layout");
        let pipeline = build_render_pipeline(
            device,
            "pattern pipeline",
            StageSources {
                vertex: program.vertex_source(),
                fragment: program.fragment_source(),
            },
            format,
            &[&layout],
            Some(CONSTANT_OPACITY_BLENDING),
        )?;

        let block_size = u64::from(program.uniforms().block_size().max(16));
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pattern uniforms"),
            size: block_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pattern bind group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            pipeline,
            uniform_buffer,
            bind_group,
            vertices: vertex_buffer(device, "pattern quad", &QUAD_VERTICES),
        })
    }
}
