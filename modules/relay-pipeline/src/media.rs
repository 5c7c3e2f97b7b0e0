//! Media retrieval and normalization.
//!
//! Downloads land in a [`TempMedia`] handle backed by a named temp file.
//! Dropping the handle removes the file, which is what guarantees the
//! cleanup invariant on every exit path (publish success, publish failure,
//! rejection, early return).

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::FetchError;
use crate::traits::MediaFetch;

/// Largest dimension the destination platform accepts.
pub const MEDIA_MAX_DIMENSION: u32 = 1080;

/// A downloaded media asset in a scoped temporary location. Single owner;
/// the backing file is removed when the handle is dropped.
#[derive(Debug)]
pub struct TempMedia {
    file: NamedTempFile,
}

impl TempMedia {
    /// Write raw bytes into a fresh temp file.
    pub fn from_bytes(bytes: &[u8]) -> std::io::Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Live media fetcher: bounded HTTP download plus image normalization.
pub struct HttpMediaFetcher {
    client: reqwest::Client,
    max_dimension: u32,
}

impl HttpMediaFetcher {
    pub fn new() -> Self {
        Self::with_max_dimension(MEDIA_MAX_DIMENSION)
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            max_dimension,
        }
    }
}

impl Default for HttpMediaFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetch for HttpMediaFetcher {
    async fn fetch(&self, url: &str) -> Result<TempMedia, FetchError> {
        debug!(url, "Downloading media");

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!(
                "media download returned status {status} for {url}"
            )));
        }

        let bytes = resp.bytes().await?;
        Ok(TempMedia::from_bytes(&bytes)?)
    }

    async fn normalize(&self, media: TempMedia) -> Result<TempMedia, FetchError> {
        let max = self.max_dimension;
        // Image decode/resample is CPU-bound; keep it off the async worker.
        tokio::task::spawn_blocking(move || normalize_file(media, max))
            .await
            .map_err(|e| FetchError::Decode(format!("normalize task failed: {e}")))?
    }
}

fn normalize_file(media: TempMedia, max_dimension: u32) -> Result<TempMedia, FetchError> {
    let img = decode(media.path())?;

    let needs_resize = img.width() > max_dimension || img.height() > max_dimension;
    let needs_recolor = !matches!(img, DynamicImage::ImageRgb8(_));
    if !needs_resize && !needs_recolor {
        return Ok(media);
    }

    // Downsample only, never upsample. Lanczos3 keeps detail at the cost of
    // a little CPU, which is fine at one candidate at a time.
    let img = if needs_resize {
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        img
    };
    let img = DynamicImage::ImageRgb8(img.to_rgb8());

    img.save_with_format(media.path(), ImageFormat::Jpeg)
        .map_err(|e| FetchError::Decode(e.to_string()))?;

    debug!(
        width = img.width(),
        height = img.height(),
        "Media normalized"
    );
    Ok(media)
}

/// Decode by content sniffing; temp files carry no extension to go by.
fn decode(path: &Path) -> Result<DynamicImage, FetchError> {
    image::ImageReader::open(path)
        .map_err(|e| FetchError::Decode(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| FetchError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| FetchError::Decode(e.to_string()))
}
