//! Uploaded image handling.
//!
//! Image bytes flow through the pipeline twice: base64-encoded into the
//! completion request, and handed to the publisher for media hosting. Only
//! the media type is inferred here; the bytes are passed through untouched.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;

/// An uploaded image: raw bytes plus a sniffed media type.
#[derive(Clone)]
pub struct ImageData {
    bytes: Bytes,
    media_type: &'static str,
}

impl ImageData {
    /// Wrap uploaded bytes, sniffing the media type from the magic number.
    /// Unrecognized content is treated as JPEG, which is what the upstream
    /// APIs most commonly receive.
    pub fn new(bytes: Bytes) -> Self {
        let media_type = sniff_media_type(&bytes).unwrap_or("image/jpeg");
        Self { bytes, media_type }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    /// File extension matching the sniffed media type.
    pub fn extension(&self) -> &'static str {
        match self.media_type {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }

    /// Base64 encoding of the raw bytes, as the completion API expects.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("len", &self.bytes.len())
            .field("media_type", &self.media_type)
            .finish()
    }
}

fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(b"\xff\xd8\xff") {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_png() {
        let image = ImageData::new(Bytes::from_static(b"\x89PNG\r\n\x1a\n0000"));
        assert_eq!(image.media_type(), "image/png");
        assert_eq!(image.extension(), "png");
    }

    #[test]
    fn sniffs_jpeg() {
        let image = ImageData::new(Bytes::from_static(b"\xff\xd8\xff\xe0rest"));
        assert_eq!(image.media_type(), "image/jpeg");
        assert_eq!(image.extension(), "jpg");
    }

    #[test]
    fn sniffs_gif_and_webp() {
        let gif = ImageData::new(Bytes::from_static(b"GIF89a...."));
        assert_eq!(gif.media_type(), "image/gif");

        let webp = ImageData::new(Bytes::from_static(b"RIFF\x00\x00\x00\x00WEBPVP8 "));
        assert_eq!(webp.media_type(), "image/webp");
    }

    #[test]
    fn unknown_bytes_default_to_jpeg() {
        let image = ImageData::new(Bytes::from_static(b"not an image"));
        assert_eq!(image.media_type(), "image/jpeg");
    }

    #[test]
    fn base64_roundtrip() {
        let image = ImageData::new(Bytes::from_static(b"\xff\xd8\xffdata"));
        let encoded = image.to_base64();
        let decoded = STANDARD.decode(&encoded).unwrap();
        assert_eq!(decoded, image.bytes());
    }
}
