use std::path::{Path, PathBuf};

use renderer::{
    ColorMapping, OverlayAnchor, OverlaySettings, PresentationOptions, RendererConfig,
};
use viewconfig::{AnchorSetting, PaletteSetting, ViewConfig};

use crate::cli::RunArgs;

/// Merges the config file with CLI flags; flags win. Relative paths from the
/// file are resolved against `base` (the file's directory).
pub fn resolve(config: &ViewConfig, args: &RunArgs, base: &Path) -> RendererConfig {
    let defaults = RendererConfig::default();

    let color_mapping = match args.palette.unwrap_or(config.pattern.palette) {
        PaletteSetting::Gradient => ColorMapping::Gradient {
            low: config.pattern.low.unwrap_or(ColorMapping::TURQUOISE),
            high: config.pattern.high.unwrap_or(ColorMapping::PURPLE),
        },
        PaletteSetting::Waves => ColorMapping::CosineWaves,
    };

    let fragment_override = args
        .fragment
        .clone()
        .or_else(|| config.pattern.fragment.as_ref().map(|path| rebase(base, path)));

    let anchor_setting = args
        .anchor
        .or_else(|| config.overlay.as_ref().map(|overlay| overlay.anchor))
        .unwrap_or_default();
    let overlay_image = args.overlay.clone().or_else(|| {
        config
            .overlay
            .as_ref()
            .map(|overlay| rebase(base, &overlay.image))
    });
    let overlay = overlay_image.map(|image| OverlaySettings {
        image,
        anchor: anchor(anchor_setting),
    });

    RendererConfig {
        surface_size: args.size.unwrap_or(defaults.surface_size),
        color_mapping,
        fragment_override,
        damping: args.damping.unwrap_or(config.input.damping),
        opacity: args.opacity.unwrap_or(config.pattern.opacity),
        presentation: PresentationOptions {
            fullscreen: config.presentation.fullscreen && !args.windowed,
            hide_cursor: config.presentation.hide_cursor && !args.show_cursor,
        },
        overlay,
        wake_lock: config.wake_lock.enabled && !args.no_wake_lock,
        still_time: args
            .still_time
            .or_else(|| config.pattern.still_time.map(|time| time.as_secs_f32())),
    }
}

fn anchor(setting: AnchorSetting) -> OverlayAnchor {
    match setting {
        AnchorSetting::Center => OverlayAnchor::Center,
        AnchorSetting::TopLeft => OverlayAnchor::TopLeft,
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
