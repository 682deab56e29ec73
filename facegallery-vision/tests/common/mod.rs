use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

/// Encode a generated image so tests can go through the real decoder.
pub fn encoded(width: u32, height: u32, format: ImageFormat, seed: u8) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x as u8).wrapping_mul(seed),
            (y as u8).wrapping_add(seed),
            seed,
            255,
        ])
    });
    let mut buf = Cursor::new(Vec::new());
    let img = if format == ImageFormat::Jpeg {
        // jpeg has no alpha channel
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8())
    } else {
        DynamicImage::ImageRgba8(img)
    };
    img.write_to(&mut buf, format).expect("encode test image");
    buf.into_inner()
}
