//! Decoding from bytes with EXIF orientation applied, as browsers do for `<img>`.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, DecodedImage, Orientation};

/// Decode any supported image format to RGBA, applying EXIF orientation.
///
/// The format is sniffed from the content. JPEG, PNG, GIF (first frame) and
/// WebP are supported.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the content is not a recognized
/// image format, or `DecodeError::CorruptedFile` if decoding fails.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let oriented = apply_orientation(img, read_orientation(bytes));
    Ok(DecodedImage::from_rgba_image(oriented.into_rgba8()))
}

/// Read the EXIF orientation tag, defaulting to `Normal`.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    let Ok(exif) = Reader::new().read_from_container(&mut cursor) else {
        return Orientation::Normal;
    };

    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(Orientation::from)
        .unwrap_or_default()
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn encode(img: &RgbaImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgba8(img.clone())
                .to_rgb8()
                .write_to(&mut out, format)
                .unwrap(),
            _ => img.write_to(&mut out, format).unwrap(),
        }
        out.into_inner()
    }

    /// Splice an APP1 segment carrying only an Orientation tag in after SOI.
    fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"MM\x00\x2A");
        tiff.extend_from_slice(&8u32.to_be_bytes()); // IFD0 offset
        tiff.extend_from_slice(&1u16.to_be_bytes()); // entry count
        tiff.extend_from_slice(&0x0112u16.to_be_bytes()); // Orientation
        tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_be_bytes()); // no IFD1

        let mut payload = b"Exif\x00\x00".to_vec();
        payload.extend_from_slice(&tiff);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    /// 8x4, black on the left half and white on the right.
    fn half_black_jpeg() -> Vec<u8> {
        let img = RgbaImage::from_fn(8, 4, |x, _| {
            if x < 4 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        encode(&img, ImageFormat::Jpeg)
    }

    fn two_pixel_image() -> DynamicImage {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_decode_png_keeps_alpha() {
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(1, 1, Rgba([10, 20, 30, 40]));
        let decoded = decode_image_bytes(&encode(&img, ImageFormat::Png)).unwrap();

        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.pixel(1, 1), [10, 20, 30, 40]);
        assert_eq!(decoded.pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_decode_jpeg_is_opaque() {
        let img = RgbaImage::from_pixel(8, 4, Rgba([128, 128, 128, 255]));
        let decoded = decode_image_bytes(&encode(&img, ImageFormat::Jpeg)).unwrap();

        assert_eq!((decoded.width, decoded.height), (8, 4));
        assert!(decoded.pixels.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_decode_unknown_format() {
        let result = decode_image_bytes(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(decode_image_bytes(&[]).is_err());
    }

    #[test]
    fn test_decode_truncated_png() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([1, 2, 3, 255]));
        let bytes = encode(&img, ImageFormat::Png);
        let result = decode_image_bytes(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))));
    }

    #[test]
    fn test_orientation_without_exif() {
        let img = RgbaImage::new(1, 1);
        assert_eq!(read_orientation(&encode(&img, ImageFormat::Png)), Orientation::Normal);
        assert_eq!(read_orientation(&[0x00, 0x01]), Orientation::Normal);
    }

    #[test]
    fn test_exif_orientation_is_read_from_jpeg() {
        let bytes = with_exif_orientation(&half_black_jpeg(), 6);
        assert_eq!(read_orientation(&bytes), Orientation::Rotate90CW);
    }

    #[test]
    fn test_decode_jpeg_applies_exif_rotation() {
        let bytes = with_exif_orientation(&half_black_jpeg(), 6);
        let decoded = decode_image_bytes(&bytes).unwrap();

        assert_eq!((decoded.width, decoded.height), (4, 8));
        // The black left half ends up on top after a clockwise quarter turn.
        assert!(decoded.pixel(2, 1)[0] < 64, "got {:?}", decoded.pixel(2, 1));
        assert!(decoded.pixel(2, 6)[0] > 192, "got {:?}", decoded.pixel(2, 6));
    }

    #[test]
    fn test_decode_jpeg_with_normal_exif_keeps_dimensions() {
        let bytes = with_exif_orientation(&half_black_jpeg(), 1);
        assert_eq!(read_orientation(&bytes), Orientation::Normal);
        let decoded = decode_image_bytes(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (8, 4));
    }

    #[test]
    fn test_apply_orientation_rotate90_swaps_dimensions() {
        let result = apply_orientation(two_pixel_image(), Orientation::Rotate90CW);
        assert_eq!((result.width(), result.height()), (1, 2));
    }

    #[test]
    fn test_apply_orientation_flip_horizontal() {
        let result = apply_orientation(two_pixel_image(), Orientation::FlipHorizontal).into_rgba8();
        assert_eq!(result.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(result.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_apply_orientation_normal_is_identity() {
        let result = apply_orientation(two_pixel_image(), Orientation::Normal).into_rgba8();
        assert_eq!(result.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }
}
