//! PNG encoding for finished renders

use std::io::Cursor;

use image::{ImageBuffer, ImageFormat};

use super::RenderResult;
use crate::error::{RasterError, Result};

/// Encode a render result as a lossless RGBA8 PNG
pub fn encode_png(result: &RenderResult) -> Result<Vec<u8>> {
    let img = ImageBuffer::<image::Rgba<u8>, &[u8]>::from_raw(
        result.width,
        result.height,
        result.pixels.as_slice(),
    )
    .ok_or_else(|| RasterError::Encode("Failed to create image buffer".to_string()))?;

    let mut output = Vec::new();
    img.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|e| RasterError::Encode(e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_roundtrip_keeps_pixels() {
        let mut pixels = vec![0u8; 3 * 2 * 4];
        pixels[0..4].copy_from_slice(&[255, 0, 0, 128]);
        let result = RenderResult {
            width: 3,
            height: 2,
            pixels,
        };

        let png = encode_png(&result).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 128]);
        assert_eq!(decoded.get_pixel(2, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_mismatched_buffer_fails() {
        let result = RenderResult {
            width: 4,
            height: 4,
            pixels: vec![0; 10],
        };
        let err = encode_png(&result).unwrap_err();
        assert!(err.to_string().contains("Failed to create image buffer"));
    }
}
