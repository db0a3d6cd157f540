//! Cover-art loading.
//!
//! Resolves an artwork reference to bytes (HTTP(S) or a local file) and
//! decodes it into an RGBA buffer on the blocking pool. The outcome is either
//! a shared decoded image or the reason there is none; callers never see a
//! panic or a partially decoded buffer.

mod source;

pub use source::ArtworkSource;
pub(crate) use source::reject_private_host;

use futures::StreamExt;
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default cap on downloaded or read artwork (8 MiB).
pub const DEFAULT_MAX_ARTWORK_BYTES: usize = 8 * 1024 * 1024;

/// Default budget for fetching one piece of artwork.
pub const DEFAULT_ARTWORK_TIMEOUT: Duration = Duration::from_secs(15);

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("No artwork for this item")]
    Missing,
    #[error("Invalid artwork reference: {0}")]
    InvalidSource(String),
    #[error("Refusing to fetch artwork from private host: {0}")]
    PrivateHost(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Artwork too large (exceeds {0} bytes)")]
    TooLarge(usize),
    #[error("Artwork request timed out")]
    Timeout,
    #[error("Failed to read artwork: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode artwork: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Artwork decode task failed: {0}")]
    Task(String),
}

// ============================================================================
// Outcome
// ============================================================================

/// Result of one load attempt, as handed to the palette extractor.
#[derive(Debug)]
pub enum ArtworkOutcome {
    Decoded(Arc<RgbaImage>),
    Failed(ArtworkError),
}

impl ArtworkOutcome {
    pub fn image(&self) -> Option<&Arc<RgbaImage>> {
        match self {
            Self::Decoded(image) => Some(image),
            Self::Failed(_) => None,
        }
    }
}

impl From<Result<RgbaImage, ArtworkError>> for ArtworkOutcome {
    fn from(result: Result<RgbaImage, ArtworkError>) -> Self {
        match result {
            Ok(image) => Self::Decoded(Arc::new(image)),
            Err(e) => Self::Failed(e),
        }
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Fetches and decodes artwork. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ArtworkLoader {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
    allow_private_hosts: bool,
}

impl ArtworkLoader {
    pub fn new(client: reqwest::Client, timeout: Duration, max_bytes: usize) -> Self {
        Self {
            client,
            timeout,
            max_bytes,
            allow_private_hosts: false,
        }
    }

    /// Permit loopback and private addresses (local mock servers).
    pub fn allow_private_hosts(mut self) -> Self {
        self.allow_private_hosts = true;
        self
    }

    /// Load and decode `reference`. Never fails outright: every error is
    /// reported as [`ArtworkOutcome::Failed`].
    pub async fn load(&self, reference: Option<&str>) -> ArtworkOutcome {
        let result = match reference {
            None => Err(ArtworkError::Missing),
            Some(raw) => self.load_reference(raw).await,
        };
        if let Err(ref e) = result {
            tracing::debug!(reference = ?reference, error = %e, "Artwork unavailable");
        }
        result.into()
    }

    async fn load_reference(&self, raw: &str) -> Result<RgbaImage, ArtworkError> {
        let source = ArtworkSource::parse(raw, self.allow_private_hosts)?;
        let bytes = self.read_bytes(&source).await?;
        decode_off_thread(bytes).await
    }

    async fn read_bytes(&self, source: &ArtworkSource) -> Result<Vec<u8>, ArtworkError> {
        match source {
            ArtworkSource::Remote(url) => {
                tokio::time::timeout(self.timeout, self.fetch(url.as_str()))
                    .await
                    .map_err(|_| ArtworkError::Timeout)?
            }
            ArtworkSource::Local(path) => {
                let meta = tokio::fs::metadata(path).await?;
                if meta.len() > self.max_bytes as u64 {
                    return Err(ArtworkError::TooLarge(self.max_bytes));
                }
                Ok(tokio::fs::read(path).await?)
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ArtworkError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ArtworkError::HttpStatus(response.status().as_u16()));
        }
        read_limited_bytes(response, self.max_bytes).await
    }
}

/// Stream a response body, refusing anything past `limit` bytes.
async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ArtworkError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ArtworkError::TooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ArtworkError::TooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Decode on the blocking pool so large covers don't stall the UI task.
async fn decode_off_thread(bytes: Vec<u8>) -> Result<RgbaImage, ArtworkError> {
    tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|e| ArtworkError::Task(e.to_string()))?
}

/// Decode an encoded image (PNG, JPEG, ...) into RGBA8.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, ArtworkError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba(pixel));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn loader() -> ArtworkLoader {
        ArtworkLoader::new(
            reqwest::Client::new(),
            Duration::from_secs(5),
            DEFAULT_MAX_ARTWORK_BYTES,
        )
        .allow_private_hosts()
    }

    #[test]
    fn decode_png() {
        let image = decode(&png_bytes(4, 3, [10, 20, 30, 255])).unwrap();
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(ArtworkError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn missing_reference_is_failed_outcome() {
        let outcome = loader().load(None).await;
        assert!(matches!(outcome, ArtworkOutcome::Failed(ArtworkError::Missing)));
    }

    #[tokio::test]
    async fn fetches_and_decodes_remote_artwork() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cover.png"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(png_bytes(8, 8, [200, 40, 40, 255])),
            )
            .mount(&server)
            .await;

        let url = format!("{}/cover.png", server.uri());
        let outcome = loader().load(Some(&url)).await;
        let image = outcome.image().expect("decoded");
        assert_eq!(image.dimensions(), (8, 8));
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing.png", server.uri());
        let outcome = loader().load(Some(&url)).await;
        assert!(matches!(
            outcome,
            ArtworkOutcome::Failed(ArtworkError::HttpStatus(404))
        ));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 2048]))
            .mount(&server)
            .await;

        let small = ArtworkLoader::new(reqwest::Client::new(), Duration::from_secs(5), 1024)
            .allow_private_hosts();
        let url = format!("{}/big.png", server.uri());
        let outcome = small.load(Some(&url)).await;
        assert!(matches!(
            outcome,
            ArtworkOutcome::Failed(ArtworkError::TooLarge(1024))
        ));
    }

    #[tokio::test]
    async fn undecodable_body_is_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let url = format!("{}/cover.jpg", server.uri());
        let outcome = loader().load(Some(&url)).await;
        assert!(matches!(
            outcome,
            ArtworkOutcome::Failed(ArtworkError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn loopback_is_refused_by_default() {
        let strict = ArtworkLoader::new(
            reqwest::Client::new(),
            Duration::from_secs(5),
            DEFAULT_MAX_ARTWORK_BYTES,
        );
        let outcome = strict.load(Some("http://127.0.0.1:9/cover.png")).await;
        assert!(matches!(
            outcome,
            ArtworkOutcome::Failed(ArtworkError::PrivateHost(_))
        ));
    }

    #[tokio::test]
    async fn reads_local_file() {
        let dir = std::env::temp_dir().join("castgrid_artwork_test_local");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("cover.png");
        std::fs::write(&file, png_bytes(2, 2, [0, 128, 255, 255])).unwrap();

        let outcome = loader().load(file.to_str()).await;
        assert!(outcome.image().is_some());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_local_file_is_io_error() {
        let outcome = loader()
            .load(Some("/tmp/castgrid_artwork_test_nonexistent.png"))
            .await;
        assert!(matches!(outcome, ArtworkOutcome::Failed(ArtworkError::Io(_))));
    }
}
