//! Scoring quantized colors against the named swatch targets.

use super::quantize::QuantizedColor;
use crate::color::{ColorCandidateSet, Rgb, Swatch, SwatchKind};

const WEIGHT_SATURATION: f32 = 0.24;
const WEIGHT_LIGHTNESS: f32 = 0.52;
const WEIGHT_POPULATION: f32 = 0.24;

/// `(min, target, max)` on the HSL scale.
type Band = (f32, f32, f32);

const LIGHT: Band = (0.55, 0.74, 1.0);
const NORMAL: Band = (0.3, 0.5, 0.7);
const DARK: Band = (0.0, 0.26, 0.45);
const VIBRANT: Band = (0.35, 1.0, 1.0);
const MUTED: Band = (0.0, 0.3, 0.4);

struct Target {
    kind: SwatchKind,
    lightness: Band,
    saturation: Band,
}

/// Targets in the order they claim colors. A color claimed by an earlier
/// target is not offered to later ones.
const TARGETS: [Target; 6] = [
    Target {
        kind: SwatchKind::LightVibrant,
        lightness: LIGHT,
        saturation: VIBRANT,
    },
    Target {
        kind: SwatchKind::Vibrant,
        lightness: NORMAL,
        saturation: VIBRANT,
    },
    Target {
        kind: SwatchKind::DarkVibrant,
        lightness: DARK,
        saturation: VIBRANT,
    },
    Target {
        kind: SwatchKind::LightMuted,
        lightness: LIGHT,
        saturation: MUTED,
    },
    Target {
        kind: SwatchKind::Muted,
        lightness: NORMAL,
        saturation: MUTED,
    },
    Target {
        kind: SwatchKind::DarkMuted,
        lightness: DARK,
        saturation: MUTED,
    },
];

/// HSL saturation and lightness, each in `[0, 1]`.
fn saturation_lightness(rgb: Rgb) -> (f32, f32) {
    let max = rgb.r.max(rgb.g).max(rgb.b) as f32 / 255.0;
    let min = rgb.r.min(rgb.g).min(rgb.b) as f32 / 255.0;
    let lightness = (max + min) / 2.0;
    let delta = max - min;
    let saturation = if delta == 0.0 {
        0.0
    } else {
        delta / (1.0 - (2.0 * lightness - 1.0).abs())
    };
    (saturation.clamp(0.0, 1.0), lightness)
}

fn within(value: f32, band: Band) -> bool {
    value >= band.0 && value <= band.2
}

/// Assign quantized colors to swatch slots.
pub(crate) fn build_candidates(colors: &[QuantizedColor]) -> ColorCandidateSet {
    let mut set = ColorCandidateSet::new();

    let Some(dominant) = colors.iter().max_by_key(|c| c.population) else {
        return set;
    };
    set.set(
        SwatchKind::Dominant,
        Swatch::new(dominant.rgb, dominant.population),
    );

    let max_population = dominant.population.max(1) as f32;
    let profiles: Vec<(f32, f32)> = colors.iter().map(|c| saturation_lightness(c.rgb)).collect();
    let mut claimed = vec![false; colors.len()];

    for target in &TARGETS {
        let mut best: Option<(usize, f32)> = None;
        for (i, (color, &(s, l))) in colors.iter().zip(&profiles).enumerate() {
            if claimed[i] || !within(s, target.saturation) || !within(l, target.lightness) {
                continue;
            }
            let score = WEIGHT_SATURATION * (1.0 - (s - target.saturation.1).abs())
                + WEIGHT_LIGHTNESS * (1.0 - (l - target.lightness.1).abs())
                + WEIGHT_POPULATION * (color.population as f32 / max_population);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((i, score));
            }
        }

        if let Some((index, _)) = best {
            claimed[index] = true;
            let color = colors[index];
            set.set(target.kind, Swatch::new(color.rgb, color.population));
        }
    }

    set
}
