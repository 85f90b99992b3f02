//! Per-pixel alpha helpers shared by the canvas and the renderer.

use image::RgbaImage;

/// Porter-Duff "source over" for straight-alpha RGBA pixels.
pub fn source_over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    match src[3] {
        0 => return dst,
        255 => return src,
        _ => {}
    }

    let src_a = src[3] as f32 / 255.0;
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let blend = |s: u8, d: u8| -> u8 {
        let out = (s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a;
        out.round().clamp(0.0, 255.0) as u8
    };

    [
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ]
}

/// Multiply colour channels by alpha in place.
///
/// Resampling must happen on premultiplied data, otherwise the colour of
/// fully transparent pixels bleeds into visible edges.
pub fn premultiply(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let a = px[3] as u32;
        for c in &mut px.0[..3] {
            *c = ((*c as u32 * a + 127) / 255) as u8;
        }
    }
}

/// Inverse of [`premultiply`]. Fully transparent pixels become transparent black.
pub fn unpremultiply(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let a = px[3] as u32;
        if a == 0 {
            px.0 = [0, 0, 0, 0];
            continue;
        }
        for c in &mut px.0[..3] {
            *c = ((*c as u32 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_source_over_opaque_src_replaces() {
        assert_eq!(source_over([1, 2, 3, 255], [9, 8, 7, 255]), [9, 8, 7, 255]);
    }

    #[test]
    fn test_source_over_transparent_src_keeps_dst() {
        assert_eq!(source_over([1, 2, 3, 255], [9, 8, 7, 0]), [1, 2, 3, 255]);
    }

    #[test]
    fn test_source_over_half_alpha_on_opaque() {
        let out = source_over([0, 0, 0, 255], [255, 255, 255, 128]);
        assert_eq!(out[3], 255);
        assert!((out[0] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_source_over_onto_transparent_keeps_src_colour() {
        let out = source_over([0, 0, 0, 0], [200, 100, 50, 100]);
        assert_eq!(out, [200, 100, 50, 100]);
    }

    #[test]
    fn test_premultiply_roundtrip_opaque() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        premultiply(&mut img);
        unpremultiply(&mut img);
        assert_eq!(img.get_pixel(1, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_unpremultiply_clears_transparent() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 0]));
        unpremultiply(&mut img);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_premultiply_half_alpha() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 0, 128]));
        premultiply(&mut img);
        assert_eq!(img.get_pixel(0, 0).0, [100, 50, 0, 128]);
    }
}
