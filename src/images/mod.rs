//! Encoded raster blobs and JPEG container plumbing.
//!
//! Raster codecs live outside this crate: lossless bitmap tags arrive with a
//! ready encoded blob, and JPEG tags arrive with the bytes the container
//! carried. What belongs here is the container-level work the SWF format
//! imposes on those bytes: splicing the shared JPEGTables stream into
//! DefineBits bodies, stripping the historical bogus `FF D9 FF D8` prefix,
//! sniffing the payload signature (later SWF versions allow PNG and GIF in
//! DefineBitsJPEG2+), and probing header-level pixel dimensions.

// Submodule declarations
pub mod jpeg;

// Re-exports
pub use jpeg::{merge_jpeg_tables, strip_erroneous_header};

use base64::Engine;

/// The encoded format of a raster blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
}

impl ImageFormat {
    /// The MIME type used in data URLs.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }
}

/// Detect the format of an encoded blob from its signature.
pub fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(&[0xFF, 0xD8]) {
        Some(ImageFormat::Jpeg)
    } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageFormat::Png)
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some(ImageFormat::Gif)
    } else {
        None
    }
}

/// Probe the pixel dimensions of an encoded blob without decoding it.
pub fn dimensions(format: ImageFormat, data: &[u8]) -> Option<(u32, u32)> {
    match format {
        ImageFormat::Jpeg => jpeg::dimensions(data),
        ImageFormat::Png => png_dimensions(data),
        ImageFormat::Gif => gif_dimensions(data),
    }
}

/// Width and height from a PNG IHDR chunk.
fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // Signature (8) + length (4) + "IHDR" (4) + width (4) + height (4)
    if data.len() < 24 || &data[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(data[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(data[20..24].try_into().ok()?);
    Some((width, height))
}

/// Width and height from a GIF logical screen descriptor.
fn gif_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 10 {
        return None;
    }
    let width = u16::from_le_bytes(data[6..8].try_into().ok()?);
    let height = u16::from_le_bytes(data[8..10].try_into().ok()?);
    Some((width as u32, height as u32))
}

/// A 1x1 fully transparent PNG, used as the sentinel for unresolvable
/// bitmap references.
const TRANSPARENT_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// An encoded raster blob with its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ImageFormat,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn new(format: ImageFormat, data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            format,
            data,
            width,
            height,
        }
    }

    /// Build from encoded bytes alone, sniffing format and dimensions.
    pub fn from_encoded(data: Vec<u8>) -> Option<Self> {
        let format = sniff_format(&data)?;
        let (width, height) = dimensions(format, &data)?;
        Some(Self::new(format, data, width, height))
    }

    /// The sentinel substituted for missing or non-image bitmap references.
    pub fn empty() -> Self {
        Self::new(ImageFormat::Png, TRANSPARENT_PNG.to_vec(), 1, 1)
    }

    /// The base64 payload of the data URL.
    pub fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// A `data:` URL suitable for an SVG `<image>` href.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_format() {
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF]), Some(ImageFormat::Jpeg));
        assert_eq!(
            sniff_format(b"\x89PNG\r\n\x1a\n0000"),
            Some(ImageFormat::Png)
        );
        assert_eq!(sniff_format(b"GIF89a-data"), Some(ImageFormat::Gif));
        assert_eq!(sniff_format(b"bogus"), None);
    }

    #[test]
    fn test_empty_image_is_valid_png() {
        let img = EncodedImage::empty();
        assert_eq!(sniff_format(&img.data), Some(ImageFormat::Png));
        assert_eq!(dimensions(ImageFormat::Png, &img.data), Some((1, 1)));
        assert!(img.data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_gif_dimensions() {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&320u16.to_le_bytes());
        data.extend_from_slice(&200u16.to_le_bytes());
        assert_eq!(gif_dimensions(&data), Some((320, 200)));
    }

    #[test]
    fn test_from_encoded_sniffs_dimensions() {
        let img = EncodedImage::from_encoded(TRANSPARENT_PNG.to_vec()).unwrap();
        assert_eq!(img.format, ImageFormat::Png);
        assert_eq!((img.width, img.height), (1, 1));
    }
}
