//! Median-cut quantization over a 5-bit-per-channel histogram.

use crate::color::Rgb;
use std::collections::HashMap;

/// Bits kept per channel before quantization.
const QUANTIZE_BITS: u32 = 5;

/// Pixels with less alpha than this are ignored.
const MIN_ALPHA: u8 = 128;

/// Colors at or past these HSL lightness bounds are treated as near
/// black/white and left out of the palette.
const MIN_LIGHTNESS: f32 = 0.05;
const MAX_LIGHTNESS: f32 = 0.95;

/// A representative color and the number of pixels it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QuantizedColor {
    pub rgb: Rgb,
    pub population: u32,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    channels: [u8; 3],
    count: u32,
}

#[derive(Debug, Clone, Copy)]
struct ColorBox {
    start: usize,
    end: usize,
    min: [u8; 3],
    max: [u8; 3],
    population: u64,
}

impl ColorBox {
    fn new(buckets: &[Bucket], start: usize, end: usize) -> Self {
        let mut min = [u8::MAX; 3];
        let mut max = [0u8; 3];
        let mut population = 0u64;
        for bucket in &buckets[start..end] {
            for dim in 0..3 {
                min[dim] = min[dim].min(bucket.channels[dim]);
                max[dim] = max[dim].max(bucket.channels[dim]);
            }
            population += bucket.count as u64;
        }
        Self {
            start,
            end,
            min,
            max,
            population,
        }
    }

    fn can_split(&self) -> bool {
        self.end - self.start > 1
    }

    fn volume(&self) -> u32 {
        (0..3)
            .map(|dim| (self.max[dim] - self.min[dim]) as u32 + 1)
            .product()
    }

    fn longest_dimension(&self) -> usize {
        (0..3)
            .max_by_key(|&dim| self.max[dim] - self.min[dim])
            .unwrap_or(0)
    }

    fn average(&self, buckets: &[Bucket]) -> QuantizedColor {
        let mut sums = [0u64; 3];
        for bucket in &buckets[self.start..self.end] {
            for dim in 0..3 {
                sums[dim] += bucket.channels[dim] as u64 * bucket.count as u64;
            }
        }
        let population = self.population.max(1);
        let channel = |dim: usize| widen((sums[dim] / population) as u8);
        QuantizedColor {
            rgb: Rgb::new(channel(0), channel(1), channel(2)),
            population: self.population.min(u32::MAX as u64) as u32,
        }
    }
}

/// Reduce `pixels` (RGBA) to at most `max_colors` representative colors.
///
/// Transparent and near black/white pixels are skipped. An image with no
/// usable pixels yields an empty vector.
pub(crate) fn quantize<I>(pixels: I, max_colors: usize) -> Vec<QuantizedColor>
where
    I: IntoIterator<Item = [u8; 4]>,
{
    let mut histogram: HashMap<[u8; 3], u32> = HashMap::new();
    for [r, g, b, a] in pixels {
        if a < MIN_ALPHA {
            continue;
        }
        let key = [narrow(r), narrow(g), narrow(b)];
        *histogram.entry(key).or_default() += 1;
    }

    let mut buckets: Vec<Bucket> = histogram
        .into_iter()
        .filter(|(channels, _)| !is_near_black_or_white(*channels))
        .map(|(channels, count)| Bucket { channels, count })
        .collect();

    if buckets.is_empty() || max_colors == 0 {
        return Vec::new();
    }

    if buckets.len() <= max_colors {
        return buckets
            .iter()
            .map(|b| QuantizedColor {
                rgb: Rgb::new(widen(b.channels[0]), widen(b.channels[1]), widen(b.channels[2])),
                population: b.count,
            })
            .collect();
    }

    let mut boxes = vec![ColorBox::new(&buckets, 0, buckets.len())];
    while boxes.len() < max_colors {
        let Some(index) = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.can_split())
            .max_by_key(|(_, b)| b.volume())
            .map(|(i, _)| i)
        else {
            break;
        };
        let target = boxes.swap_remove(index);
        let (low, high) = split_box(&mut buckets, &target);
        boxes.push(low);
        boxes.push(high);
    }

    boxes.iter().map(|b| b.average(&buckets)).collect()
}

/// Split a box at the population median along its longest dimension.
fn split_box(buckets: &mut [Bucket], target: &ColorBox) -> (ColorBox, ColorBox) {
    let dim = target.longest_dimension();
    buckets[target.start..target.end].sort_unstable_by_key(|b| {
        (
            b.channels[dim],
            b.channels[(dim + 1) % 3],
            b.channels[(dim + 2) % 3],
        )
    });

    let half = target.population / 2;
    let mut running = 0u64;
    let mut mid = target.end - 1;
    for (offset, bucket) in buckets[target.start..target.end].iter().enumerate() {
        running += bucket.count as u64;
        if running >= half {
            mid = target.start + offset + 1;
            break;
        }
    }
    let mid = mid.clamp(target.start + 1, target.end - 1);

    (
        ColorBox::new(buckets, target.start, mid),
        ColorBox::new(buckets, mid, target.end),
    )
}

fn narrow(channel: u8) -> u8 {
    channel >> (8 - QUANTIZE_BITS)
}

fn widen(channel: u8) -> u8 {
    (channel << (8 - QUANTIZE_BITS)) | (channel >> (2 * QUANTIZE_BITS - 8))
}

fn is_near_black_or_white(channels: [u8; 3]) -> bool {
    let rgb = channels.map(widen);
    let max = rgb.iter().copied().max().unwrap_or(0) as f32 / 255.0;
    let min = rgb.iter().copied().min().unwrap_or(0) as f32 / 255.0;
    let lightness = (max + min) / 2.0;
    lightness <= MIN_LIGHTNESS || lightness >= MAX_LIGHTNESS
}
