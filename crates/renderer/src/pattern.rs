//! CPU evaluation of the pattern fragment stage.
//!
//! Mirrors the GLSL in [`crate::compile`] operation for operation in `f32`, so
//! it can be used for golden-value tests and for the GPU-free `snapshot`
//! command.

use image::{Rgba, RgbaImage};

use crate::types::{ColorMapping, ViewportSize};

/// Inputs of one fragment invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentInputs {
    /// Pixel coordinate with a bottom-left origin.
    pub coord: [f32; 2],
    pub resolution: [f32; 2],
    pub time: f32,
    /// Offset as uploaded, i.e. already damped.
    pub offset: [f32; 2],
}

/// Intermediate values of the pattern before color mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternSample {
    pub p: [f32; 2],
    pub len: f32,
    pub angle: f32,
    pub pattern: f32,
    pub shape: f32,
    pub final_pattern: f32,
}

pub fn sample(inputs: &FragmentInputs) -> PatternSample {
    let [w, h] = inputs.resolution;
    let t = inputs.time;
    let uv = [
        (inputs.coord[0] - inputs.offset[0]) / w,
        (inputs.coord[1] - inputs.offset[1]) / h,
    ];
    let p = [(uv[0] - 0.5) * (w / h), uv[1] - 0.5];

    let len = (p[0] * p[0] + p[1] * p[1]).sqrt();
    // atan2(0, 0) is 0, matching GLSL on every backend we target.
    let angle = p[1].atan2(p[0]);

    let pattern = (10.0 * angle - t).cos() * (10.0 * len + t).sin();
    let shape = (len * 15.0 - t).cos() * (angle * 12.0 + t).sin();
    let final_pattern = mix(pattern, shape, 0.7);

    PatternSample {
        p,
        len,
        angle,
        pattern,
        shape,
        final_pattern,
    }
}

/// RGBA output of the fragment stage for `inputs`.
pub fn shade(mapping: &ColorMapping, inputs: &FragmentInputs) -> [f32; 4] {
    let s = sample(inputs);
    let t = inputs.time;
    let [r, g, b] = match mapping {
        ColorMapping::Gradient { low, high } => {
            let k = (t + s.final_pattern).sin() * 0.5 + 0.5;
            let mask = smoothstep(0.2, 0.8, s.final_pattern);
            [0, 1, 2].map(|i| mix(0.0, mix(low[i], high[i], k), mask))
        }
        ColorMapping::CosineWaves => [
            (s.final_pattern * 3.0 + t).cos() * 0.5 + 0.5,
            (s.angle * 2.0 + t * 0.7 + 2.094).cos() * 0.5 + 0.5,
            (s.len * 8.0 - t * 1.3 + 4.188).cos() * 0.5 + 0.5,
        ],
    };
    [r, g, b, 1.0]
}

/// Renders a full frame, sampling each pixel at its center.
///
/// Row 0 of the image is the top of the viewport.
pub fn render_image(
    mapping: &ColorMapping,
    size: ViewportSize,
    time: f32,
    offset: [f32; 2],
) -> RgbaImage {
    let resolution = size.as_uniform();
    RgbaImage::from_fn(size.width, size.height, |x, row| {
        let inputs = FragmentInputs {
            coord: [x as f32 + 0.5, size.height as f32 - (row as f32 + 0.5)],
            resolution,
            time,
            offset,
        };
        Rgba(shade(mapping, &inputs).map(to_unorm8))
    })
}

/// Lays `image` over black at `opacity`, as the window presents it.
pub fn fade_over_black(image: &mut RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    for pixel in image.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = to_unorm8(f32::from(*channel) / 255.0 * opacity);
        }
    }
}

fn to_unorm8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn inputs(coord: [f32; 2], time: f32) -> FragmentInputs {
        FragmentInputs {
            coord,
            resolution: [800.0, 600.0],
            time,
            offset: [0.0, 0.0],
        }
    }

    fn assert_close(actual: &[f32], expected: &[f32]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < EPS, "expected {expected:?}, got {actual:?}");
        }
    }

    #[test]
    fn center_pixel_matches_golden_values() {
        let center = inputs([400.0, 300.0], 1.0);
        let s = sample(&center);
        assert_eq!(s.len, 0.0);
        assert_eq!(s.angle, 0.0);
        assert!((s.final_pattern - 0.454_648_7).abs() < EPS);

        let gradient = shade(&ColorMapping::default(), &center);
        assert_close(&gradient, &[0.193_090_05, 0.001_305_35, 0.194_395_4, 1.0]);

        let waves = shade(&ColorMapping::CosineWaves, &center);
        assert_close(&waves, &[0.143_716_64, 0.029_902_27, 0.015_991_33, 1.0]);
    }

    #[test]
    fn right_of_center_is_masked_to_black() {
        let right = inputs([600.0, 300.0], 1.0);
        assert!((sample(&right).final_pattern + 0.535_600_1).abs() < EPS);
        assert_close(&shade(&ColorMapping::default(), &right), &[0.0, 0.0, 0.0, 1.0]);
        assert_close(
            &shade(&ColorMapping::CosineWaves, &right),
            &[0.910_738_4, 0.029_902_27, 0.873_080_7, 1.0],
        );
    }

    #[test]
    fn corner_region_at_later_time() {
        let corner = inputs([100.0, 50.0], 2.5);
        assert!((sample(&corner).final_pattern + 0.416_998_6).abs() < EPS);
        assert_close(&shade(&ColorMapping::default(), &corner), &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn shading_is_deterministic() {
        let a = inputs([123.5, 456.5], 3.25);
        assert_eq!(
            shade(&ColorMapping::CosineWaves, &a),
            shade(&ColorMapping::CosineWaves, &a)
        );
    }

    #[test]
    fn offset_shifts_the_pattern_center() {
        let shifted = FragmentInputs {
            coord: [421.2, 318.4],
            offset: [21.2, 18.4],
            ..inputs([0.0, 0.0], 1.0)
        };
        let s = sample(&shifted);
        assert!(s.len < 1e-5);
    }

    #[test]
    fn rendered_image_is_opaque_and_sized() {
        let image = render_image(
            &ColorMapping::CosineWaves,
            ViewportSize::new(8, 6),
            1.0,
            [0.0, 0.0],
        );
        assert_eq!(image.dimensions(), (8, 6));
        assert!(image.pixels().all(|pixel| pixel.0[3] == 255));
    }

    #[test]
    fn fading_scales_color_and_keeps_alpha() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 0, 255]));
        fade_over_black(&mut image, 0.9);
        assert!(image.pixels().all(|pixel| pixel.0 == [180, 90, 0, 255]));

        let mut untouched = RgbaImage::from_pixel(1, 1, Rgba([17, 34, 51, 255]));
        fade_over_black(&mut untouched, 1.0);
        assert_eq!(untouched.get_pixel(0, 0).0, [17, 34, 51, 255]);
    }
}
