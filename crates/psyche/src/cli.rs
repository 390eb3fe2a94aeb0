use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use viewconfig::{AnchorSetting, PaletteSetting};

#[derive(Parser, Debug)]
#[command(
    name = "psyche",
    author,
    version,
    about = "Fullscreen animated shader pattern that follows the pointer",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Configuration file (defaults to `config.toml` in the config directory).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Color mapping: `gradient` or `waves`.
    #[arg(long, value_name = "NAME", value_parser = parse_palette)]
    pub palette: Option<PaletteSetting>,

    /// Image drawn over the pattern at full viewport height.
    #[arg(long, value_name = "IMAGE")]
    pub overlay: Option<PathBuf>,

    /// Overlay placement: `center` or `top-left`.
    #[arg(long, value_name = "ANCHOR", value_parser = parse_anchor)]
    pub anchor: Option<AnchorSetting>,

    /// GLSL fragment stage to use instead of the bundled pattern.
    #[arg(long, value_name = "FILE")]
    pub fragment: Option<PathBuf>,

    /// Scale applied to the pointer offset (default 0.1).
    #[arg(long, value_name = "FACTOR", value_parser = parse_damping)]
    pub damping: Option<f64>,

    /// Pattern opacity over the black background (default 0.9).
    #[arg(long, value_name = "ALPHA", value_parser = parse_opacity)]
    pub opacity: Option<f32>,

    /// Stay in a regular window instead of going fullscreen.
    #[arg(long)]
    pub windowed: bool,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Keep the pointer visible over the pattern.
    #[arg(long)]
    pub show_cursor: bool,

    /// Let the display idle while the pattern is on screen.
    #[arg(long)]
    pub no_wake_lock: bool,

    /// Freeze the animation at this many seconds.
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub still_time: Option<f32>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the assembled fragment shader.
    Shader,
    /// Compile both stages and print the reflected uniform table as JSON.
    Check,
    /// Render one frame on the CPU and write it as a PNG.
    Snapshot(SnapshotArgs),
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Output PNG path.
    #[arg(value_name = "PNG")]
    pub output: PathBuf,

    /// Frame size in pixels.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "800x600")]
    pub resolution: (u32, u32),

    /// Shader time in seconds.
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds, default_value = "1")]
    pub time: f32,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_palette(value: &str) -> Result<PaletteSetting, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "gradient" | "default" => Ok(PaletteSetting::Gradient),
        "waves" | "cosine" => Ok(PaletteSetting::Waves),
        "" => Err("palette must not be empty".to_string()),
        other => Err(format!("unknown palette '{other}' (expected gradient or waves)")),
    }
}

pub fn parse_anchor(value: &str) -> Result<AnchorSetting, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "center" | "centre" => Ok(AnchorSetting::Center),
        "top-left" | "topleft" | "left" => Ok(AnchorSetting::TopLeft),
        "" => Err("anchor must not be empty".to_string()),
        other => Err(format!("unknown anchor '{other}' (expected center or top-left)")),
    }
}

pub fn parse_damping(value: &str) -> Result<f64, String> {
    let damping: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid damping '{value}'"))?;
    if !damping.is_finite() || damping < 0.0 {
        return Err(format!("damping must be a non-negative number, got {damping}"));
    }
    Ok(damping)
}

pub fn parse_opacity(value: &str) -> Result<f32, String> {
    let opacity: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid opacity '{value}'"))?;
    if !(0.0..=1.0).contains(&opacity) {
        return Err(format!("opacity must be within [0, 1], got {opacity}"));
    }
    Ok(opacity)
}

pub fn parse_seconds(value: &str) -> Result<f32, String> {
    let seconds: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid number of seconds '{value}'"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("seconds must be non-negative, got {seconds}"));
    }
    Ok(seconds)
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{value}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{value}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{value}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("size must be non-zero, got {width}x{height}"));
    }
    Ok((width, height))
}
