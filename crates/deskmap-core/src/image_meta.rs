//! Image metadata probing for floor plan uploads.
//!
//! Floor plans store their image's pixel dimensions so the aspect ratio can
//! be derived on every read. The probe works at the header level only: MIME
//! detection via magic bytes, then a format-specific dimension scan for the
//! accepted raster formats (PNG, JPEG, GIF). Anything else is rejected.

use crate::error::{Error, Result};

/// Content type and pixel dimensions extracted from an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMeta {
    pub content_type: String,
    pub width: u32,
    pub height: u32,
}

/// Probe an uploaded image's content type and dimensions.
///
/// Fails with `InvalidInput` when the data is not one of the accepted
/// formats or its header is truncated/corrupt.
pub fn probe_image(data: &[u8]) -> Result<ImageMeta> {
    let kind = infer::get(data)
        .ok_or_else(|| Error::InvalidInput("unrecognized image data".to_string()))?;

    let dims = match kind.mime_type() {
        "image/png" => png_dimensions(data),
        "image/jpeg" => jpeg_dimensions(data),
        "image/gif" => gif_dimensions(data),
        other => {
            return Err(Error::InvalidInput(format!(
                "unsupported image type: {}",
                other
            )))
        }
    };

    let (width, height) = dims.ok_or_else(|| {
        Error::InvalidInput(format!("corrupt {} header", kind.mime_type()))
    })?;
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput(
            "image has zero width or height".to_string(),
        ));
    }

    Ok(ImageMeta {
        content_type: kind.mime_type().to_string(),
        width,
        height,
    })
}

/// PNG: 8-byte signature, then the IHDR chunk carries width and height as
/// big-endian u32 at fixed offsets.
fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 24 || &data[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(data[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(data[20..24].try_into().ok()?);
    Some((width, height))
}

/// GIF: logical screen descriptor directly after the 6-byte version header,
/// little-endian u16 width then height.
fn gif_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 10 {
        return None;
    }
    let width = u16::from_le_bytes(data[6..8].try_into().ok()?) as u32;
    let height = u16::from_le_bytes(data[8..10].try_into().ok()?) as u32;
    Some((width, height))
}

/// JPEG: walk the segment chain until a start-of-frame marker, which carries
/// sample precision, height, and width.
fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2usize; // past SOI
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            return None;
        }
        // Fill bytes before a marker are legal.
        let mut j = i;
        while j < data.len() && data[j] == 0xFF {
            j += 1;
        }
        let marker = *data.get(j)?;
        i = j + 1;

        match marker {
            // Standalone markers carry no length.
            0x01 | 0xD0..=0xD8 => continue,
            // Start of scan / end of image: no frame header was seen.
            0xD9 | 0xDA => return None,
            // SOF0..SOF15, excluding DHT (C4), JPG (C8), DAC (CC).
            0xC0..=0xCF if marker != 0xC4 && marker != 0xC8 && marker != 0xCC => {
                if i + 7 > data.len() {
                    return None;
                }
                let height = u16::from_be_bytes(data[i + 3..i + 5].try_into().ok()?) as u32;
                let width = u16::from_be_bytes(data[i + 5..i + 7].try_into().ok()?) as u32;
                return Some((width, height));
            }
            _ => {
                if i + 2 > data.len() {
                    return None;
                }
                let len = u16::from_be_bytes(data[i..i + 2].try_into().ok()?) as usize;
                if len < 2 {
                    return None;
                }
                i += len;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        // bit depth, color type, compression, filter, interlace
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data
    }

    fn gif_bytes(width: u16, height: u16) -> Vec<u8> {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(&[0, 0, 0]);
        data
    }

    fn jpeg_bytes(width: u16, height: u16) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        // APP0/JFIF segment
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
        // SOF0: len 17, precision 8, height, width, 3 components
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&[0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
        data
    }

    #[test]
    fn test_probe_png() {
        let meta = probe_image(&png_bytes(640, 360)).unwrap();
        assert_eq!(meta.content_type, "image/png");
        assert_eq!((meta.width, meta.height), (640, 360));
    }

    #[test]
    fn test_probe_gif() {
        let meta = probe_image(&gif_bytes(320, 200)).unwrap();
        assert_eq!(meta.content_type, "image/gif");
        assert_eq!((meta.width, meta.height), (320, 200));
    }

    #[test]
    fn test_probe_jpeg() {
        let meta = probe_image(&jpeg_bytes(1024, 768)).unwrap();
        assert_eq!(meta.content_type, "image/jpeg");
        assert_eq!((meta.width, meta.height), (1024, 768));
    }

    #[test]
    fn test_probe_rejects_non_image() {
        assert!(probe_image(b"%PDF-1.7 not a floor plan").is_err());
        assert!(probe_image(b"").is_err());
    }

    #[test]
    fn test_probe_rejects_truncated_png() {
        let data = png_bytes(640, 360);
        assert!(probe_image(&data[..12]).is_err());
    }

    #[test]
    fn test_probe_rejects_zero_dimensions() {
        assert!(probe_image(&png_bytes(0, 360)).is_err());
    }
}
