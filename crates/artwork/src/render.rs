use crate::error::{ErrorKind, Result};
use crate::geometry::{CropRegion, FitMode, PadLayout};
use exn::ResultExt;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

const JPEG_QUALITY: u8 = 90;
const CANVAS: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Converts an encoded source image into a `size`×`size` JPEG.
///
/// A source that is already square at exactly `size` is re-encoded without
/// resampling. Transparent areas are flattened onto white. CPU-bound; async
/// callers should run it on a blocking thread.
///
/// # Errors
///
/// - [`Decode`](ErrorKind::Decode) if `source` is not a supported image.
/// - [`Encode`](ErrorKind::Encode) if JPEG encoding fails.
pub fn render_square(source: &[u8], size: u32, mode: FitMode) -> Result<Vec<u8>> {
    let image = image::load_from_memory(source).or_raise(|| ErrorKind::Decode)?;
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        exn::bail!(ErrorKind::Decode);
    }

    let square = if width == size && height == size {
        flatten(&image.to_rgba8())
    } else {
        match mode {
            FitMode::Crop => crop(&image, size),
            FitMode::Pad => pad(&image, size),
        }
    };

    let mut out = Vec::new();
    square
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))
        .or_raise(|| ErrorKind::Encode)?;
    Ok(out)
}

fn crop(image: &DynamicImage, size: u32) -> DynamicImage {
    let region = CropRegion::centered(image.width(), image.height());
    let square = image
        .crop_imm(region.left, region.top, region.side, region.side)
        .resize_exact(size, size, FilterType::Lanczos3);
    flatten(&square.to_rgba8())
}

fn pad(image: &DynamicImage, size: u32) -> DynamicImage {
    let layout = PadLayout::centered(image.width(), image.height(), size);
    let scaled = image.resize_exact(layout.width, layout.height, FilterType::Lanczos3);
    let mut canvas = RgbaImage::from_pixel(size, size, CANVAS);
    imageops::overlay(&mut canvas, &scaled.to_rgba8(), i64::from(layout.left), i64::from(layout.top));
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
}

/// JPEG has no alpha channel; composite onto the white canvas colour.
fn flatten(image: &RgbaImage) -> DynamicImage {
    let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), CANVAS);
    imageops::overlay(&mut canvas, image, 0, 0);
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use rstest::rstest;
    use std::io::Cursor;

    /// PNG of the given size filled with pure red.
    pub(crate) fn red_png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([255, 0, 0]));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn decode(jpeg: &[u8]) -> RgbImage {
        let image = image::load_from_memory(jpeg).unwrap();
        assert_eq!(image::guess_format(jpeg).unwrap(), ImageFormat::Jpeg);
        image.to_rgb8()
    }

    fn is_red(pixel: &Rgb<u8>) -> bool {
        pixel[0] > 200 && pixel[1] < 60 && pixel[2] < 60
    }

    fn is_white(pixel: &Rgb<u8>) -> bool {
        pixel.0.iter().all(|c| *c > 230)
    }

    #[rstest]
    #[case(FitMode::Crop, 400, 200)]
    #[case(FitMode::Crop, 200, 400)]
    #[case(FitMode::Pad, 400, 200)]
    #[case(FitMode::Pad, 30, 70)]
    #[case(FitMode::Crop, 100, 100)]
    fn test_output_is_square_jpeg(#[case] mode: FitMode, #[case] width: u32, #[case] height: u32) {
        let out = decode(&render_square(&red_png(width, height), 100, mode).unwrap());
        assert_eq!(out.dimensions(), (100, 100));
    }

    #[test]
    fn test_crop_fills_canvas() {
        let out = decode(&render_square(&red_png(400, 200), 100, FitMode::Crop).unwrap());
        assert!(is_red(out.get_pixel(2, 2)));
        assert!(is_red(out.get_pixel(97, 97)));
    }

    #[test]
    fn test_pad_centers_on_white() {
        let out = decode(&render_square(&red_png(400, 200), 100, FitMode::Pad).unwrap());
        // 100x50 image with 25-row margins above and below.
        assert!(is_white(out.get_pixel(50, 5)));
        assert!(is_white(out.get_pixel(50, 94)));
        assert!(is_red(out.get_pixel(50, 50)));
        assert!(is_red(out.get_pixel(2, 50)));
    }

    #[test]
    fn test_already_square_passes_through() {
        let out = decode(&render_square(&red_png(64, 64), 64, FitMode::Pad).unwrap());
        assert_eq!(out.dimensions(), (64, 64));
        assert!(is_red(out.get_pixel(0, 0)));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = render_square(b"definitely not an image", 100, FitMode::Crop).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Decode));
    }
}
