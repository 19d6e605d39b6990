//! Retrieval of current camera frames.

use async_trait::async_trait;
use image::DynamicImage;

use crate::CameraError;

/// Something that can hand back the raw bytes of a camera frame.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetches the encoded image at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError`] if the frame cannot be retrieved.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CameraError>;
}

/// Downloads frames over HTTP with a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    /// Wraps an existing client. Timeouts are whatever the client was
    /// built with.
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CameraError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(CameraError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        let bytes = resp.bytes().await?;
        log::trace!("{url}: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Decodes an encoded frame, guessing the format from its contents.
///
/// # Errors
///
/// Returns [`CameraError::Image`] if the bytes are not a supported image.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, CameraError> {
    Ok(image::load_from_memory(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decodes_png_bytes() {
        let frame = image::RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30]));
        let mut encoded = Vec::new();
        DynamicImage::ImageRgb8(frame)
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode(&encoded).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert!(matches!(
            decode(b"<html>camera offline</html>"),
            Err(CameraError::Image(_))
        ));
    }
}
