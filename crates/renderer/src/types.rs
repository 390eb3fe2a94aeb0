use std::path::PathBuf;

use winit::dpi::PhysicalSize;

/// Pointer damping applied at upload time unless configured otherwise.
pub const DEFAULT_DAMPING: f64 = 0.1;
/// The pattern is laid over a black background at this opacity.
pub const DEFAULT_OPACITY: f32 = 0.9;

/// Drawable dimensions in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-area viewport (minimised window) cannot back a drawable.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_uniform(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl From<PhysicalSize<u32>> for ViewportSize {
    fn from(size: PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

impl From<ViewportSize> for PhysicalSize<u32> {
    fn from(size: ViewportSize) -> Self {
        PhysicalSize::new(size.width, size.height)
    }
}

/// Pointer displacement from the viewport center, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scales the stored offset for upload; the stored value is never pre-scaled.
    pub fn damped(&self, damping: f64) -> [f32; 2] {
        [(self.x * damping) as f32, (self.y * damping) as f32]
    }
}

/// Final color mapping applied to the interference pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorMapping {
    /// Two-color gradient masked by `smoothstep(0.2, 0.8, pattern)`.
    Gradient { low: [f32; 3], high: [f32; 3] },
    /// Independent per-channel cosine waves over pattern, angle and radius.
    CosineWaves,
}

impl ColorMapping {
    pub const TURQUOISE: [f32; 3] = [0.0, 1.0, 1.0];
    pub const PURPLE: [f32; 3] = [0.5, 0.0, 0.5];

    pub fn name(&self) -> &'static str {
        match self {
            ColorMapping::Gradient { .. } => "gradient",
            ColorMapping::CosineWaves => "waves",
        }
    }
}

impl Default for ColorMapping {
    fn default() -> Self {
        Self::Gradient {
            low: Self::TURQUOISE,
            high: Self::PURPLE,
        }
    }
}

/// Where the overlay image sits horizontally; it always spans the viewport height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayAnchor {
    #[default]
    Center,
    TopLeft,
}

/// Static image drawn above the pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySettings {
    pub image: PathBuf,
    pub anchor: OverlayAnchor,
}

/// Page-level presentation state held while the view is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationOptions {
    /// Borderless fullscreen; the native stand-in for suppressing page scroll.
    pub fullscreen: bool,
    pub hide_cursor: bool,
}

impl Default for PresentationOptions {
    fn default() -> Self {
        Self {
            fullscreen: true,
            hide_cursor: true,
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags and the config file: which color mapping
/// to assemble into the fragment stage, how the window is presented, and which
/// optional collaborators (overlay image, wake lock) are attached.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels when not fullscreen.
    pub surface_size: (u32, u32),
    /// Color mapping policy for the fragment stage.
    pub color_mapping: ColorMapping,
    /// Replaces the assembled fragment stage with the contents of this file.
    pub fragment_override: Option<PathBuf>,
    /// Scale applied to the pointer offset when it is uploaded.
    pub damping: f64,
    /// Pattern opacity over the black background, in `[0, 1]`.
    pub opacity: f32,
    pub presentation: PresentationOptions,
    pub overlay: Option<OverlaySettings>,
    /// Hold a display wake lock while the view is visible.
    pub wake_lock: bool,
    /// Freeze the animation clock at this many seconds.
    pub still_time: Option<f32>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            color_mapping: ColorMapping::default(),
            fragment_override: None,
            damping: DEFAULT_DAMPING,
            opacity: DEFAULT_OPACITY,
            presentation: PresentationOptions::default(),
            overlay: None,
            wake_lock: true,
            still_time: None,
        }
    }
}
