//! Image format detection from magic bytes.
//!
//! Only the first 12 bytes of a blob are inspected. File names and claimed
//! extensions are never trusted.

use std::fmt;

/// Human-readable list of accepted formats, used in user-facing rejections.
pub const SUPPORTED_FORMATS: &str = "jpg/png/gif/webp/bmp";

/// Number of leading bytes needed to tell every supported format apart.
const HEADER_LEN: usize = 12;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Image formats the remote face-swap service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
}

impl ImageFormat {
    pub const ALL: [Self; 5] = [Self::Jpeg, Self::Png, Self::Gif, Self::Webp, Self::Bmp];

    /// Identify the format from the leading bytes of `data`.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        let header = &data[..data.len().min(HEADER_LEN)];

        if header.starts_with(JPEG_MAGIC) {
            Some(Self::Jpeg)
        } else if header.starts_with(PNG_MAGIC) {
            Some(Self::Png)
        } else if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if header.starts_with(b"RIFF") && header.get(8..12) == Some(b"WEBP".as_slice()) {
            Some(Self::Webp)
        } else if header.starts_with(b"BM") {
            Some(Self::Bmp)
        } else {
            None
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        })
    }
}

/// Whether `data` starts with one of the accepted image signatures.
pub fn is_supported_image(data: &[u8]) -> bool {
    ImageFormat::sniff(data).is_some()
}

/// MIME type for `data`, falling back to `image/jpeg` for unknown headers.
///
/// Callers are expected to have rejected unknown formats already.
pub fn mime_type_for(data: &[u8]) -> &'static str {
    ImageFormat::sniff(data).map_or("image/jpeg", ImageFormat::mime_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webp_header() -> Vec<u8> {
        let mut v = b"RIFF".to_vec();
        v.extend_from_slice(&1234u32.to_le_bytes());
        v.extend_from_slice(b"WEBPVP8 ");
        v
    }

    fn canonical() -> Vec<(Vec<u8>, ImageFormat)> {
        vec![
            (
                vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'],
                ImageFormat::Jpeg,
            ),
            (
                b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec(),
                ImageFormat::Png,
            ),
            (b"GIF89a\x01\x00\x01\x00".to_vec(), ImageFormat::Gif),
            (b"GIF87a".to_vec(), ImageFormat::Gif),
            (webp_header(), ImageFormat::Webp),
            (b"BM\x36\x00\x00\x00".to_vec(), ImageFormat::Bmp),
        ]
    }

    #[test]
    fn accepts_canonical_signatures() {
        for (bytes, expected) in canonical() {
            assert_eq!(ImageFormat::sniff(&bytes), Some(expected), "{expected}");
            assert!(is_supported_image(&bytes));
            assert_eq!(mime_type_for(&bytes), expected.mime_type());
        }
    }

    #[test]
    fn rejects_unknown_headers() {
        let samples: &[&[u8]] = &[
            b"",
            b"\xFF",
            b"\xFF\xD8",
            b"\x89PNG\r\n",
            b"GIF88a",
            b"RIFF\0\0\0\0WAVE",
            b"RIFF\0\0\0\0WEB",
            b"%PDF-1.7",
            b"hello world",
            b"B",
            b"\0\0\0\x18ftypheic",
        ];
        for sample in samples {
            assert_eq!(ImageFormat::sniff(sample), None, "{sample:?}");
            assert!(!is_supported_image(sample));
        }
    }

    #[test]
    fn riff_needs_webp_tag_at_offset_eight() {
        assert_eq!(ImageFormat::sniff(b"RIFFWEBP\0\0\0\0"), None);
        assert_eq!(
            ImageFormat::sniff(b"RIFF\0\0\0\0WEBP"),
            Some(ImageFormat::Webp)
        );
    }

    #[test]
    fn only_header_is_inspected() {
        let mut data = b"hello world!".to_vec();
        data.extend_from_slice(JPEG_MAGIC);
        assert_eq!(ImageFormat::sniff(&data), None);
    }

    #[test]
    fn mime_falls_back_to_jpeg() {
        assert_eq!(mime_type_for(b"not an image"), "image/jpeg");
    }

    #[test]
    fn every_format_has_distinct_mime() {
        let mimes: std::collections::HashSet<_> =
            ImageFormat::ALL.iter().map(|f| f.mime_type()).collect();
        assert_eq!(mimes.len(), ImageFormat::ALL.len());
        assert_eq!(ImageFormat::Webp.to_string(), "webp");
    }
}
