//! Pure layout arithmetic for the two squaring strategies.

use serde::{Deserialize, Serialize};

/// How a non-square source becomes square.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Keep the centered square of side `min(width, height)`, then scale.
    #[default]
    Crop,
    /// Scale the whole image to fit, then center it on a white square canvas.
    Pad,
}

/// Region of the source kept by [`FitMode::Crop`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub side: u32,
}
impl CropRegion {
    /// The centered square, with offsets rounded down.
    pub fn centered(width: u32, height: u32) -> Self {
        let side = width.min(height);
        Self {
            left: (width - side) / 2,
            top: (height - side) / 2,
            side,
        }
    }
}

/// Placement of the scaled source on the canvas for [`FitMode::Pad`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PadLayout {
    pub width: u32,
    pub height: u32,
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}
impl PadLayout {
    /// Scales so the larger dimension equals `target`, then splits the spare
    /// space with the leading edge rounded down and the trailing edge
    /// rounded up.
    pub fn centered(width: u32, height: u32, target: u32) -> Self {
        let (width, height) = scale_to_fit(width, height, target);
        let (spare_x, spare_y) = (target - width, target - height);
        Self {
            width,
            height,
            left: spare_x / 2,
            right: spare_x - spare_x / 2,
            top: spare_y / 2,
            bottom: spare_y - spare_y / 2,
        }
    }
}

/// Largest `(w, h)` with the source's aspect ratio and `max(w, h) == target`.
/// The smaller side is rounded to nearest and never collapses below one pixel.
fn scale_to_fit(width: u32, height: u32, target: u32) -> (u32, u32) {
    let (long, short) = (u64::from(width.max(height)), u64::from(width.min(height)));
    if long == 0 {
        return (target, target);
    }
    let scaled = ((short * u64::from(target) + long / 2) / long).clamp(1, u64::from(target)) as u32;
    if width >= height { (target, scaled) } else { (scaled, target) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_crop_landscape() {
        assert_eq!(CropRegion::centered(4000, 2000), CropRegion { left: 1000, top: 0, side: 2000 });
    }

    #[rstest]
    #[case(2000, 4000, CropRegion { left: 0, top: 1000, side: 2000 })]
    #[case(1000, 1000, CropRegion { left: 0, top: 0, side: 1000 })]
    #[case(1001, 1000, CropRegion { left: 0, top: 0, side: 1000 })]
    #[case(1003, 1000, CropRegion { left: 1, top: 0, side: 1000 })]
    fn test_crop_rounds_down(#[case] width: u32, #[case] height: u32, #[case] expected: CropRegion) {
        assert_eq!(CropRegion::centered(width, height), expected);
    }

    #[test]
    fn test_pad_landscape() {
        let layout = PadLayout::centered(4000, 2000, 1000);
        assert_eq!((layout.width, layout.height), (1000, 500));
        assert_eq!((layout.top, layout.bottom), (250, 250));
        assert_eq!((layout.left, layout.right), (0, 0));
    }

    #[test]
    fn test_pad_portrait() {
        let layout = PadLayout::centered(2000, 4000, 1000);
        assert_eq!((layout.width, layout.height), (500, 1000));
        assert_eq!((layout.left, layout.right), (250, 250));
    }

    #[test]
    fn test_pad_uneven_margin() {
        // 300x100 at 100 → 100x33, leaving 67 rows: 33 above, 34 below.
        let layout = PadLayout::centered(300, 100, 100);
        assert_eq!((layout.width, layout.height), (100, 33));
        assert_eq!((layout.top, layout.bottom), (33, 34));
    }

    #[test]
    fn test_pad_upscales_small_sources() {
        let layout = PadLayout::centered(40, 20, 1000);
        assert_eq!((layout.width, layout.height), (1000, 500));
    }

    #[test]
    fn test_pad_extreme_aspect_keeps_a_pixel() {
        let layout = PadLayout::centered(100_000, 1, 100);
        assert_eq!((layout.width, layout.height), (100, 1));
        assert_eq!(layout.top + layout.height + layout.bottom, 100);
    }

    #[test]
    fn test_fit_mode_serde_names() {
        assert_eq!(FitMode::default(), FitMode::Crop);
    }
}
