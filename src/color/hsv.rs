use super::Rgb;

/// Hue / saturation / value triple.
///
/// `h` is in degrees `[0, 360)`, `s` and `v` are in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    pub fn from_rgb(rgb: Rgb) -> Self {
        let max = rgb.r.max(rgb.g).max(rgb.b);
        let min = rgb.r.min(rgb.g).min(rgb.b);
        let delta = max - min;

        // Ratios are taken on the integer channels so a round trip through
        // `to_rgb` never loses precision to a double division.
        let v = max as f32 / 255.0;
        let s = if max == 0 {
            0.0
        } else {
            delta as f32 / max as f32
        };

        let h = if delta == 0 {
            0.0
        } else {
            let (r, g, b) = (rgb.r as f32, rgb.g as f32, rgb.b as f32);
            let d = delta as f32;
            let raw = if max == rgb.r {
                (g - b) / d
            } else if max == rgb.g {
                (b - r) / d + 2.0
            } else {
                (r - g) / d + 4.0
            };
            (raw * 60.0).rem_euclid(360.0)
        };

        Self { h, s, v }
    }

    /// Convert back to 8-bit RGB.
    ///
    /// The brightest channel is quantized first and the darkest channel is
    /// floored against it, so the 8-bit result never has a lower saturation
    /// or value than `self` (after rounding `v` to the nearest step).
    pub fn to_rgb(self) -> Rgb {
        let s = self.s.clamp(0.0, 1.0);
        let v = self.v.clamp(0.0, 1.0);

        let top = (v * 255.0).round();
        let bottom = (top * (1.0 - s)).floor();

        let h = self.h.rem_euclid(360.0) / 60.0;
        let sector = h.floor();
        let f = h - sector;
        let falling = (top * (1.0 - s * f)).round().clamp(bottom, top);
        let rising = (top * (1.0 - s * (1.0 - f))).round().clamp(bottom, top);

        let (r, g, b) = match sector as u8 {
            0 => (top, rising, bottom),
            1 => (falling, top, bottom),
            2 => (bottom, top, rising),
            3 => (bottom, falling, top),
            4 => (rising, bottom, top),
            _ => (top, bottom, falling),
        };

        Rgb::new(r as u8, g as u8, b as u8)
    }
}
