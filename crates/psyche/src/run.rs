use std::path::Path;

use anyhow::{bail, Context, Result};
use renderer::{compile_sources, pattern, Renderer, RendererConfig, ShaderSources, UniformTable, ViewportSize};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use viewconfig::ViewConfig;

use crate::cli::{RunArgs, SnapshotArgs};
use crate::paths::AppPaths;
use crate::settings;

pub fn run(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;
    tracing::debug!(?config, "resolved renderer configuration");
    let mut renderer = Renderer::new(config);
    renderer.run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(args: &RunArgs) -> Result<RendererConfig> {
    let (file, base) = match &args.config {
        Some(path) => {
            let file = ViewConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            let base = path.parent().unwrap_or(Path::new(".")).to_path_buf();
            (file, base)
        }
        None => {
            let paths = AppPaths::discover()?;
            let path = paths.config_file();
            let file = ViewConfig::load_or_default(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            tracing::debug!(config = %path.display(), "resolved psyche config path");
            (file, paths.config_dir().to_path_buf())
        }
    };
    Ok(settings::resolve(&file, args, &base))
}

/// Prints the fragment stage the window would compile.
pub fn print_shader(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let sources = ShaderSources::load(&config)?;
    print!("{}", sources.fragment);
    Ok(())
}

#[derive(Serialize)]
struct CheckReport<'a> {
    palette: &'a str,
    fragment_override: Option<&'a Path>,
    uniforms: &'a UniformTable,
}

/// Compiles and links both stages without a GPU.
pub fn check(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let sources = ShaderSources::load(&config)?;
    let program = compile_sources(&sources).context("shader check failed")?;
    let report = CheckReport {
        palette: config.color_mapping.name(),
        fragment_override: config.fragment_override.as_deref(),
        uniforms: program.uniforms(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Renders one frame with the CPU reference and saves it.
pub fn snapshot(args: &RunArgs, snapshot: &SnapshotArgs) -> Result<()> {
    let config = resolve_config(args)?;
    if config.fragment_override.is_some() {
        bail!("snapshot renders the bundled pattern only; drop --fragment or pattern.fragment");
    }
    let (width, height) = snapshot.resolution;
    let mut image = pattern::render_image(
        &config.color_mapping,
        ViewportSize::new(width, height),
        snapshot.time,
        [0.0, 0.0],
    );
    pattern::fade_over_black(&mut image, config.opacity);
    image
        .save(&snapshot.output)
        .with_context(|| format!("failed to write snapshot to {}", snapshot.output.display()))?;
    tracing::info!(
        path = %snapshot.output.display(),
        width,
        height,
        time = snapshot.time,
        palette = config.color_mapping.name(),
        "snapshot written"
    );
    Ok(())
}
