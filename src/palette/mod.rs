//! Background palette extraction.
//!
//! [`PaletteExtractor::extract`] takes a finished artwork load and, off the
//! UI task, reduces the image to a [`ColorCandidateSet`]. The callback is
//! invoked exactly once: with the candidates, or with `None` when the load
//! failed, the image went away first, or extraction errored or panicked.
//! Failures are logged and never reach the caller as errors.

mod quantize;
mod targets;

use crate::artwork::ArtworkOutcome;
use crate::color::ColorCandidateSet;
use crate::util::panic_message;
use image::imageops::FilterType;
use image::RgbaImage;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::task::JoinHandle;

/// Default number of colors kept by quantization.
pub const DEFAULT_MAX_COLORS: usize = 32;

/// Images larger than this many pixels are scaled down before quantizing.
const MAX_SAMPLE_AREA: u32 = 112 * 112;

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("Artwork was released before extraction started")]
    Recycled,
    #[error("Artwork has no pixels")]
    EmptyImage,
    #[error("Palette extraction panicked: {0}")]
    Panicked(String),
}

type ComputeFn = fn(&RgbaImage, usize) -> Result<ColorCandidateSet, PaletteError>;

/// Spawns palette work for decoded artwork.
#[derive(Debug, Clone, Copy)]
pub struct PaletteExtractor {
    max_colors: usize,
    compute: ComputeFn,
}

impl Default for PaletteExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COLORS)
    }
}

impl PaletteExtractor {
    pub fn new(max_colors: usize) -> Self {
        Self {
            max_colors: max_colors.max(1),
            compute: candidates_from_image,
        }
    }

    /// Replace the extraction routine (fault injection in tests).
    #[doc(hidden)]
    pub fn with_compute(mut self, compute: ComputeFn) -> Self {
        self.compute = compute;
        self
    }

    pub fn max_colors(&self) -> usize {
        self.max_colors
    }

    /// Extract candidates for `artwork` and hand them to `on_result`.
    ///
    /// A failed load reports `None` synchronously and returns no handle.
    /// Otherwise the work runs on the blocking pool and the returned handle
    /// resolves after `on_result` has run. Only a weak reference to the
    /// image is held until the work starts: if every owner drops it first,
    /// the result is `None`.
    ///
    /// Must be called inside a Tokio runtime when `artwork` is decoded.
    pub fn extract<F>(&self, artwork: &ArtworkOutcome, on_result: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Option<ColorCandidateSet>) + Send + 'static,
    {
        let image = match artwork {
            ArtworkOutcome::Decoded(image) => Arc::downgrade(image),
            ArtworkOutcome::Failed(e) => {
                tracing::debug!(error = %e, "No artwork to extract a palette from");
                on_result(None);
                return None;
            }
        };

        let this = *self;
        Some(tokio::spawn(async move {
            let candidates = this.run(image).await;
            on_result(candidates);
        }))
    }

    /// Future form of [`extract`](Self::extract).
    pub async fn candidates(&self, artwork: &ArtworkOutcome) -> Option<ColorCandidateSet> {
        match artwork {
            ArtworkOutcome::Decoded(image) => self.run(Arc::downgrade(image)).await,
            ArtworkOutcome::Failed(_) => None,
        }
    }

    async fn run(self, image: Weak<RgbaImage>) -> Option<ColorCandidateSet> {
        let compute = self.compute;
        let max_colors = self.max_colors;
        let joined = tokio::task::spawn_blocking(move || {
            let image = image.upgrade().ok_or(PaletteError::Recycled)?;
            compute(&image, max_colors)
        })
        .await;

        let result = match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(PaletteError::Panicked(panic_message(
                e.into_panic().as_ref(),
            ))),
            Err(e) => {
                tracing::debug!(error = %e, "Palette task cancelled");
                return None;
            }
        };

        match result {
            Ok(candidates) => {
                tracing::trace!(
                    preferred = ?candidates.preferred().map(|(kind, _)| kind.name()),
                    "Palette extracted"
                );
                Some(candidates)
            }
            Err(e @ PaletteError::Panicked(_)) => {
                tracing::warn!(error = %e, "Palette extraction failed");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "Palette extraction skipped");
                None
            }
        }
    }
}

/// Synchronous extraction: sample, quantize, score.
pub fn candidates_from_image(
    image: &RgbaImage,
    max_colors: usize,
) -> Result<ColorCandidateSet, PaletteError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PaletteError::EmptyImage);
    }

    let sampled;
    let source = if width.saturating_mul(height) > MAX_SAMPLE_AREA {
        let scale = (MAX_SAMPLE_AREA as f64 / (width as f64 * height as f64)).sqrt();
        let w = ((width as f64 * scale).round() as u32).max(1);
        let h = ((height as f64 * scale).round() as u32).max(1);
        sampled = image::imageops::resize(image, w, h, FilterType::Triangle);
        &sampled
    } else {
        image
    };

    let colors = quantize::quantize(source.pixels().map(|p| p.0), max_colors);
    Ok(targets::build_candidates(&colors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::ArtworkError;
    use crate::color::SwatchKind;
    use image::Rgba;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    fn explode(_: &RgbaImage, _: usize) -> Result<ColorCandidateSet, PaletteError> {
        panic!("quantizer exploded")
    }

    #[test]
    fn solid_red_is_vibrant_and_dominant() {
        let set = candidates_from_image(&solid(16, 16, [220, 30, 30]), 32).unwrap();
        let vibrant = set.get(SwatchKind::Vibrant).unwrap().rgb;
        assert!(vibrant.r > 200 && vibrant.g < 50, "{vibrant:?}");
        assert!(set.get(SwatchKind::Dominant).is_some());
    }

    #[test]
    fn large_images_are_sampled() {
        let set = candidates_from_image(&solid(800, 600, [30, 90, 200]), 32).unwrap();
        let dominant = set.get(SwatchKind::Dominant).unwrap();
        assert!(dominant.population <= MAX_SAMPLE_AREA);
    }

    #[test]
    fn empty_image_is_an_error() {
        assert!(matches!(
            candidates_from_image(&RgbaImage::new(0, 0), 32),
            Err(PaletteError::EmptyImage)
        ));
    }

    #[test]
    fn black_image_yields_empty_set() {
        let set = candidates_from_image(&solid(8, 8, [0, 0, 0]), 32).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn failed_artwork_reports_none_synchronously() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = PaletteExtractor::default().extract(
            &ArtworkOutcome::Failed(ArtworkError::Missing),
            move |c| sink.lock().unwrap().push(c),
        );
        assert!(handle.is_none());
        assert_eq!(*seen.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn decoded_artwork_reports_candidates() {
        let artwork = ArtworkOutcome::Decoded(Arc::new(solid(10, 10, [40, 180, 60])));
        let (tx, rx) = oneshot::channel();
        let handle = PaletteExtractor::default()
            .extract(&artwork, move |c| {
                let _ = tx.send(c);
            })
            .unwrap();
        handle.await.unwrap();
        let set = rx.await.unwrap().unwrap();
        assert_eq!(
            set.preferred().map(|(kind, _)| kind),
            Some(SwatchKind::Vibrant)
        );
    }

    #[tokio::test]
    async fn panic_is_reported_as_none() {
        let artwork = ArtworkOutcome::Decoded(Arc::new(solid(4, 4, [1, 2, 3])));
        let extractor = PaletteExtractor::default().with_compute(explode);
        let (tx, rx) = oneshot::channel();
        extractor
            .extract(&artwork, move |c| {
                let _ = tx.send(c);
            })
            .unwrap()
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap(), None);
    }

    #[tokio::test]
    async fn dropped_image_is_reported_as_none() {
        let artwork = ArtworkOutcome::Decoded(Arc::new(solid(4, 4, [200, 10, 10])));
        let extractor = PaletteExtractor::default();
        let weak = match &artwork {
            ArtworkOutcome::Decoded(image) => Arc::downgrade(image),
            ArtworkOutcome::Failed(_) => unreachable!(),
        };
        drop(artwork);
        assert!(weak.upgrade().is_none());
        assert_eq!(extractor.run(weak).await, None);
    }

    #[tokio::test]
    async fn candidates_future_matches_sync_path() {
        let image = solid(12, 12, [240, 160, 20]);
        let expected = candidates_from_image(&image, 32).unwrap();
        let artwork = ArtworkOutcome::Decoded(Arc::new(image));
        assert_eq!(
            PaletteExtractor::default().candidates(&artwork).await,
            Some(expected)
        );
    }

    #[test]
    fn max_colors_is_at_least_one() {
        assert_eq!(PaletteExtractor::new(0).max_colors(), 1);
    }
}
