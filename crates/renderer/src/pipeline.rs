use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::naga;

use crate::compile::{compile_stage, link_stages, pattern_fragment_source, PATTERN_VERTEX_GLSL};
use crate::types::RendererConfig;
use crate::uniforms::UniformTable;

/// Programmable stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            Stage::Vertex => naga::ShaderStage::Vertex,
            Stage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => f.write_str("vertex"),
            Stage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Compilation failures are terminal for a view: the sources are static, so
/// there is nothing to retry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    #[error("{stage} shader failed to compile:\n{diagnostic}")]
    Compile { stage: Stage, diagnostic: String },
    #[error("shader program failed to link:\n{diagnostic}")]
    Link { diagnostic: String },
}

/// Vertex and fragment sources shared read-only by every consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    /// Sources for the bundled pattern with the configured color mapping, or
    /// the override fragment file when one is set.
    pub fn load(config: &RendererConfig) -> Result<Arc<Self>> {
        let fragment = match &config.fragment_override {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read fragment shader at {}", path.display()))?,
            None => pattern_fragment_source(&config.color_mapping),
        };
        Ok(Arc::new(Self {
            vertex: PATTERN_VERTEX_GLSL.to_string(),
            fragment,
        }))
    }

    pub fn with_fragment(fragment: impl Into<String>) -> Self {
        Self {
            vertex: PATTERN_VERTEX_GLSL.to_string(),
            fragment: fragment.into(),
        }
    }
}

/// A compiled and linked vertex/fragment pair plus its uniform slot table.
///
/// Immutable once built; the GPU backend turns the validated sources into a
/// render pipeline.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    vertex_source: String,
    fragment_source: String,
    uniforms: UniformTable,
}

impl ShaderProgram {
    pub fn uniforms(&self) -> &UniformTable {
        &self.uniforms
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }
}

/// Compiles both stages, links them, and reflects the uniform block.
pub fn compile(vertex_source: &str, fragment_source: &str) -> Result<ShaderProgram, PipelineError> {
    let vertex = compile_stage(vertex_source, Stage::Vertex)?;
    let fragment = compile_stage(fragment_source, Stage::Fragment)?;
    link_stages(&vertex, &fragment)?;
    let uniforms = UniformTable::reflect(&[&vertex, &fragment]);
    tracing::debug!(
        block_size = uniforms.block_size(),
        uniforms = ?uniforms.names().collect::<Vec<_>>(),
        "compiled shader program"
    );

    Ok(ShaderProgram {
        vertex_source: vertex_source.to_string(),
        fragment_source: fragment_source.to_string(),
        uniforms,
    })
}

/// Compiles the shared sources.
pub fn compile_sources(sources: &ShaderSources) -> Result<ShaderProgram, PipelineError> {
    compile(&sources.vertex, &sources.fragment)
}
