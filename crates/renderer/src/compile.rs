use std::collections::BTreeSet;

use wgpu::naga;

use crate::pipeline::{PipelineError, Stage};
use crate::types::ColorMapping;

/// Passthrough vertex stage; the quad arrives as 6 clip-space positions.
pub const PATTERN_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;

void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Builds the pattern fragment stage for the requested color mapping.
///
/// The source is assembled from three parts:
///
/// 1. [`FRAGMENT_HEADER`] declares the uniform block (`u_resolution`,
///    `u_offset`, `u_time`) and the color output.
/// 2. A `palette()` function generated from `mapping`.
/// 3. [`FRAGMENT_MAIN`] computes the interference pattern and hands it to
///    `palette()`.
pub fn pattern_fragment_source(mapping: &ColorMapping) -> String {
    let palette = palette_glsl(mapping);
    format!("{FRAGMENT_HEADER}\n{palette}\n{FRAGMENT_MAIN}")
}

fn palette_glsl(mapping: &ColorMapping) -> String {
    match mapping {
        ColorMapping::Gradient { low, high } => format!(
            r"vec3 palette(float finalPattern, float angle, float len, float time) {{
    float t = sin(time + finalPattern) * 0.5 + 0.5;
    vec3 color = mix({low}, {high}, t);
    return mix(vec3(0.0), color, smoothstep(0.2, 0.8, finalPattern));
}}
",
            low = glsl_vec3(*low),
            high = glsl_vec3(*high),
        ),
        ColorMapping::CosineWaves => r"vec3 palette(float finalPattern, float angle, float len, float time) {
    float r = cos(finalPattern * 3.0 + time) * 0.5 + 0.5;
    float g = cos(angle * 2.0 + time * 0.7 + 2.094) * 0.5 + 0.5;
    float b = cos(len * 8.0 - time * 1.3 + 4.188) * 0.5 + 0.5;
    return vec3(r, g, b);
}
"
        .to_string(),
    }
}

fn glsl_vec3(value: [f32; 3]) -> String {
    // `{:?}` always keeps a decimal point or exponent, which GLSL needs for float literals.
    format!("vec3({:?}, {:?}, {:?})", value[0], value[1], value[2])
}

/// Uniform block layout shared by every pattern fragment stage.
const FRAGMENT_HEADER: &str = r"#version 450
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform PatternParams {
    vec2 u_resolution;
    vec2 u_offset;
    float u_time;
} params;
";

const FRAGMENT_MAIN: &str = r"void main() {
    // Hardware origin is top-left; the pattern is defined from the bottom-left.
    vec2 fragCoord = vec2(gl_FragCoord.x, params.u_resolution.y - gl_FragCoord.y);
    vec2 uv = (fragCoord - params.u_offset) / params.u_resolution;
    vec2 p = uv - vec2(0.5);
    p = vec2(p.x * (params.u_resolution.x / params.u_resolution.y), p.y);

    float len = length(p);
    float angle = atan(p.y, p.x);

    float pattern = cos(10.0 * angle - params.u_time) * sin(10.0 * len + params.u_time);
    float shapePattern = cos(len * 15.0 - params.u_time) * sin(angle * 12.0 + params.u_time);
    float finalPattern = mix(pattern, shapePattern, 0.7);

    outColor = vec4(palette(finalPattern, angle, len, params.u_time), 1.0);
}
";

/// Unit-quad vertex stage for the overlay image; `u_rect` holds clip-space
/// `(left, bottom, right, top)`.
pub(crate) const OVERLAY_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_corner;
layout(location = 0) out vec2 v_uv;

layout(std140, set = 0, binding = 0) uniform OverlayParams {
    vec4 u_rect;
} overlay;

void main() {
    v_uv = vec2(a_corner.x, 1.0 - a_corner.y);
    gl_Position = vec4(mix(overlay.u_rect.xy, overlay.u_rect.zw, a_corner), 0.0, 1.0);
}
";

pub(crate) const OVERLAY_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(set = 1, binding = 0) uniform texture2D u_image;
layout(set = 1, binding = 1) uniform sampler u_sampler;

void main() {
    outColor = texture(sampler2D(u_image, u_sampler), v_uv);
}
";

/// Parses and validates a single GLSL stage.
///
/// Diagnostics are rendered against `source` so they carry line/column
/// context, which is what ends up in the developer log on failure.
pub(crate) fn compile_stage(source: &str, stage: Stage) -> Result<naga::Module, PipelineError> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(stage.naga());
    let module = frontend
        .parse(&options, source)
        .map_err(|errors| PipelineError::Compile {
            stage,
            diagnostic: errors.emit_to_string(source),
        })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|err| PipelineError::Compile {
            stage,
            diagnostic: err.emit_to_string(source),
        })?;

    if entry_point(&module, stage).is_none() {
        return Err(PipelineError::Compile {
            stage,
            diagnostic: format!("no {stage} entry point named `main`"),
        });
    }

    Ok(module)
}

/// Checks that every fragment input location is written by the vertex stage.
pub(crate) fn link_stages(
    vertex: &naga::Module,
    fragment: &naga::Module,
) -> Result<(), PipelineError> {
    let produced = entry_point(vertex, Stage::Vertex)
        .map(|ep| output_locations(vertex, ep))
        .unwrap_or_default();
    let consumed = entry_point(fragment, Stage::Fragment)
        .map(|ep| input_locations(fragment, ep))
        .unwrap_or_default();

    let missing: Vec<String> = consumed
        .difference(&produced)
        .map(|location| location.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Link {
            diagnostic: format!(
                "fragment inputs at location(s) {} are not written by the vertex stage",
                missing.join(", ")
            ),
        })
    }
}

fn entry_point(module: &naga::Module, stage: Stage) -> Option<&naga::EntryPoint> {
    let wanted = stage.naga();
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == wanted && ep.name == "main")
}

fn output_locations(module: &naga::Module, ep: &naga::EntryPoint) -> BTreeSet<u32> {
    let mut locations = BTreeSet::new();
    if let Some(result) = &ep.function.result {
        collect_locations(module, result.ty, result.binding.as_ref(), &mut locations);
    }
    locations
}

fn input_locations(module: &naga::Module, ep: &naga::EntryPoint) -> BTreeSet<u32> {
    let mut locations = BTreeSet::new();
    for argument in &ep.function.arguments {
        collect_locations(module, argument.ty, argument.binding.as_ref(), &mut locations);
    }
    locations
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    locations: &mut BTreeSet<u32>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            locations.insert(*location);
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                        locations.insert(*location);
                    }
                }
            }
        }
    }
}
