//! Cover thumbnails drawn with upper-half-block characters.
//!
//! Each terminal cell shows two vertically stacked pixels: the upper one as
//! the glyph's foreground, the lower one as the cell background.

use image::{imageops, RgbaImage};
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};
use std::borrow::Cow;

const UPPER_HALF: &str = "▀";

/// Render `image` into `width` x `height` cells. Transparent pixels are
/// composited onto `backdrop`.
pub(super) fn halfblock_lines(
    image: &RgbaImage,
    width: u16,
    height: u16,
    backdrop: (u8, u8, u8),
) -> Vec<Line<'static>> {
    if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
        return Vec::new();
    }
    let target = (u32::from(width), u32::from(height) * 2);
    let scaled = if image.dimensions() == target {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(imageops::thumbnail(image, target.0, target.1))
    };

    (0..scaled.height())
        .step_by(2)
        .map(|y| {
            let spans: Vec<Span<'static>> = (0..scaled.width())
                .map(|x| {
                    let top = blend(scaled.get_pixel(x, y).0, backdrop);
                    let bottom = if y + 1 < scaled.height() {
                        blend(scaled.get_pixel(x, y + 1).0, backdrop)
                    } else {
                        Color::Rgb(backdrop.0, backdrop.1, backdrop.2)
                    };
                    Span::styled(UPPER_HALF, Style::default().fg(top).bg(bottom))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn blend([r, g, b, a]: [u8; 4], (br, bg, bb): (u8, u8, u8)) -> Color {
    let mix = |c: u8, base: u8| -> u8 {
        ((u16::from(c) * u16::from(a) + u16::from(base) * (255 - u16::from(a))) / 255) as u8
    };
    Color::Rgb(mix(r, br), mix(g, bg), mix(b, bb))
}
