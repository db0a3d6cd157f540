//! Accent color derivation for cover-art backed rows.
//!
//! Turns an optional [`ColorCandidateSet`] plus a fallback seed into the
//! translucent background color a row is painted with. Everything here is
//! pure: no I/O, no shared state, identical output for identical input.
//!
//! - Candidates present: the first swatch in [`SwatchKind::PRIORITY`] wins.
//! - No usable swatch: the seed picks one of [`FALLBACK_COLORS`].
//! - Either way the chosen color goes through [`adjust_for_background`].

mod hsv;

pub use hsv::Hsv;

// ============================================================================
// Constants
// ============================================================================

/// Alpha applied to every derived background (~75% opaque).
pub const BACKGROUND_ALPHA: u8 = 190;

const SATURATION_SCALE: f32 = 0.8;
const MIN_SATURATION: f32 = 0.4;
const VALUE_SCALE: f32 = 0.9;
const MIN_VALUE: f32 = 0.5;

/// Hues used when artwork yields nothing. Index 0 is the empty-seed default.
pub const FALLBACK_COLORS: [Rgb; 16] = [
    Rgb::from_hex(0xFF6F00), // orange
    Rgb::from_hex(0x2196F3), // blue
    Rgb::from_hex(0x388E3C), // green
    Rgb::from_hex(0x7B1FA2), // purple
    Rgb::from_hex(0xB71C1C), // red
    Rgb::from_hex(0x00838F), // cyan
    Rgb::from_hex(0xFF9800), // amber
    Rgb::from_hex(0x4CAF50), // light green
    Rgb::from_hex(0x9C27B0), // deep purple
    Rgb::from_hex(0x3F51B5), // indigo
    Rgb::from_hex(0x009688), // teal
    Rgb::from_hex(0xE91E63), // pink
    Rgb::from_hex(0xFF5722), // deep orange
    Rgb::from_hex(0x03A9F4), // light blue
    Rgb::from_hex(0x827717), // olive
    Rgb::from_hex(0x795548), // brown
];

// ============================================================================
// Color Types
// ============================================================================

/// Opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a `0xRRGGBB` literal. Bits above 24 are ignored.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    pub fn to_hsv(self) -> Hsv {
        Hsv::from_rgb(self)
    }

    pub const fn with_alpha(self, a: u8) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}

/// 8-bit RGB color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// Blend over an opaque base, as a compositor would paint it.
    pub fn composite_over(self, base: Rgb) -> Rgb {
        let a = self.a as u16;
        let blend = |top: u8, bottom: u8| -> u8 {
            ((top as u16 * a + bottom as u16 * (255 - a) + 127) / 255) as u8
        };
        Rgb::new(
            blend(self.r, base.r),
            blend(self.g, base.g),
            blend(self.b, base.b),
        )
    }
}

// ============================================================================
// Swatches
// ============================================================================

/// Named swatch slots produced by palette extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwatchKind {
    Vibrant,
    LightVibrant,
    DarkVibrant,
    Dominant,
    Muted,
    LightMuted,
    DarkMuted,
}

impl SwatchKind {
    /// Order in which swatches are tried for a background.
    pub const PRIORITY: [SwatchKind; 7] = [
        SwatchKind::Vibrant,
        SwatchKind::LightVibrant,
        SwatchKind::DarkVibrant,
        SwatchKind::Dominant,
        SwatchKind::Muted,
        SwatchKind::LightMuted,
        SwatchKind::DarkMuted,
    ];

    const fn slot(self) -> usize {
        match self {
            Self::Vibrant => 0,
            Self::LightVibrant => 1,
            Self::DarkVibrant => 2,
            Self::Dominant => 3,
            Self::Muted => 4,
            Self::LightMuted => 5,
            Self::DarkMuted => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Vibrant => "vibrant",
            Self::LightVibrant => "light-vibrant",
            Self::DarkVibrant => "dark-vibrant",
            Self::Dominant => "dominant",
            Self::Muted => "muted",
            Self::LightMuted => "light-muted",
            Self::DarkMuted => "dark-muted",
        }
    }
}

/// A representative color of an image region and how many pixels it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub rgb: Rgb,
    pub population: u32,
}

impl Swatch {
    pub const fn new(rgb: Rgb, population: u32) -> Self {
        Self { rgb, population }
    }
}

/// Every swatch slot, each possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorCandidateSet {
    swatches: [Option<Swatch>; 7],
}

impl ColorCandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: SwatchKind, swatch: Swatch) -> Self {
        self.set(kind, swatch);
        self
    }

    pub fn set(&mut self, kind: SwatchKind, swatch: Swatch) {
        self.swatches[kind.slot()] = Some(swatch);
    }

    pub fn get(&self, kind: SwatchKind) -> Option<Swatch> {
        self.swatches[kind.slot()]
    }

    pub fn is_empty(&self) -> bool {
        self.swatches.iter().all(Option::is_none)
    }

    /// First present swatch in [`SwatchKind::PRIORITY`] order.
    pub fn preferred(&self) -> Option<(SwatchKind, Swatch)> {
        SwatchKind::PRIORITY
            .into_iter()
            .find_map(|kind| self.get(kind).map(|swatch| (kind, swatch)))
    }
}

// ============================================================================
// Derivation
// ============================================================================

/// Derive a row background from extracted candidates, or from `seed` when
/// there are none.
///
/// The seed is only consulted when `candidates` is `None` or has no swatch.
pub fn derive_background_color(candidates: Option<&ColorCandidateSet>, seed: &str) -> Rgba {
    match candidates.and_then(ColorCandidateSet::preferred) {
        Some((_, swatch)) => adjust_for_background(swatch.rgb),
        None => fallback_color(seed),
    }
}

/// Seeded fallback background. The empty seed always maps to entry 0.
pub fn fallback_color(seed: &str) -> Rgba {
    adjust_for_background(FALLBACK_COLORS[fallback_index(seed)])
}

/// Index into [`FALLBACK_COLORS`] for `seed`.
///
/// Two steps: a whole-string hash picks a slot, then an offset from the
/// seed's length and first character shifts it. Both are reduced modulo the
/// palette size.
pub fn fallback_index(seed: &str) -> usize {
    let Some(first) = seed.chars().next() else {
        return 0;
    };
    let size = FALLBACK_COLORS.len();

    let hashed = seed_hash(seed) as usize % size;
    let offset = (seed.len() + first as usize) % size;
    (hashed + offset) % size
}

/// 32-bit FNV-1a.
///
/// The final multiply is by an odd prime, so modulo any power of two the
/// last byte still maps to a distinct residue. Seeds that differ only in
/// their last byte therefore collide only when those bytes agree modulo the
/// palette size.
fn seed_hash(seed: &str) -> u32 {
    const OFFSET_BASIS: u32 = 0x811C_9DC5;
    const PRIME: u32 = 0x0100_0193;

    seed.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ byte as u32).wrapping_mul(PRIME)
    })
}

/// Tone a color down into a legible background.
///
/// Saturation is scaled by 0.8 but kept at or above 0.4, value is scaled by
/// 0.9 but kept at or above 0.5, then [`BACKGROUND_ALPHA`] is applied.
pub fn adjust_for_background(rgb: Rgb) -> Rgba {
    let mut hsv = rgb.to_hsv();
    hsv.s = (hsv.s * SATURATION_SCALE).max(MIN_SATURATION);
    hsv.v = (hsv.v * VALUE_SCALE).max(MIN_VALUE);
    hsv.to_rgb().with_alpha(BACKGROUND_ALPHA)
}

/// Scale a color's brightness by `factor`, keeping hue, saturation and alpha.
pub fn darken(color: Rgba, factor: f32) -> Rgba {
    let mut hsv = color.rgb().to_hsv();
    hsv.v *= factor.clamp(0.0, 1.0);
    hsv.to_rgb().with_alpha(color.a)
}

// ============================================================================
// Tests
// ============================================================================
