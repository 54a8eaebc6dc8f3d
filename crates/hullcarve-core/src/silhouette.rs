//! Silhouette masks and their extraction from decoded images.

use glam::UVec2;
use image::{DynamicImage, GenericImageView, Rgba};
use serde::{Deserialize, Serialize};

use crate::error::{HullError, Result};

/// A binary object/background mask, row-major with row 0 at the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Silhouette {
    width: u32,
    height: u32,
    mask: Vec<bool>,
}

impl Silhouette {
    /// Builds a mask by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut mask = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                mask.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            mask,
        }
    }

    /// A mask with every pixel set to foreground.
    pub fn full(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_, _| true)
    }

    /// A mask with no foreground pixel.
    pub fn empty(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_, _| false)
    }

    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mask dimensions as `(width, height)`.
    pub fn dimensions(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    /// Whether pixel `(x, y)` is foreground. Out-of-range pixels are background.
    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.mask[(y * self.width + x) as usize]
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Returns true if no pixel is foreground.
    pub fn is_empty(&self) -> bool {
        !self.mask.iter().any(|&m| m)
    }

    /// Inclusive pixel bounds `(min, max)` of the foreground, or `None` for an empty mask.
    pub fn bounds(&self) -> Option<(UVec2, UVec2)> {
        let mut min = UVec2::MAX;
        let mut max = UVec2::ZERO;
        let mut any = false;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.contains(x, y) {
                    min = min.min(UVec2::new(x, y));
                    max = max.max(UVec2::new(x, y));
                    any = true;
                }
            }
        }
        any.then_some((min, max))
    }
}

/// How foreground is separated from background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum KeyMode {
    /// Alpha keying when the image carries any transparency, color keying otherwise.
    #[default]
    Auto,
    /// Foreground where alpha exceeds the alpha threshold.
    Alpha,
    /// Foreground where the color is far from the background color.
    Color,
}

/// Silhouette extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilhouetteConfig {
    /// Keying policy.
    pub mode: KeyMode,
    /// Alpha strictly above this value is foreground.
    pub alpha_threshold: u8,
    /// Plain background color of non-transparent images.
    pub background_color: [u8; 3],
    /// Euclidean RGB distance strictly above this value is foreground.
    pub color_tolerance: f32,
}

impl Default for SilhouetteConfig {
    fn default() -> Self {
        Self {
            mode: KeyMode::Auto,
            alpha_threshold: 127,
            background_color: [255, 255, 255],
            color_tolerance: 25.0,
        }
    }
}

/// Converts decoded images into silhouettes. Deterministic and free of side effects.
#[derive(Debug, Clone, Default)]
pub struct SilhouetteExtractor {
    config: SilhouetteConfig,
}

impl SilhouetteExtractor {
    pub fn new(config: SilhouetteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SilhouetteConfig {
        &self.config
    }

    /// Extracts the silhouette of `image`.
    ///
    /// An all-background result is not an error here; the carver turns it into an
    /// empty hull.
    pub fn extract(&self, image: &DynamicImage) -> Silhouette {
        let (width, height) = image.dimensions();
        let use_alpha = match self.config.mode {
            KeyMode::Alpha => true,
            KeyMode::Color => false,
            KeyMode::Auto => has_transparency(image),
        };
        let rgba = image.to_rgba8();
        Silhouette::from_fn(width, height, |x, y| {
            let pixel = rgba.get_pixel(x, y);
            if use_alpha {
                pixel[3] > self.config.alpha_threshold
            } else {
                self.color_distance(pixel) > self.config.color_tolerance
            }
        })
    }

    fn color_distance(&self, pixel: &Rgba<u8>) -> f32 {
        let [br, bg, bb] = self.config.background_color;
        let dr = f32::from(pixel[0]) - f32::from(br);
        let dg = f32::from(pixel[1]) - f32::from(bg);
        let db = f32::from(pixel[2]) - f32::from(bb);
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

/// Whether the image has an alpha channel with at least one non-opaque pixel.
fn has_transparency(image: &DynamicImage) -> bool {
    image.color().has_alpha() && image.pixels().any(|(_, _, p)| p[3] < u8::MAX)
}

/// Decodes an encoded image (PNG, JPEG, ...) for view `view`.
///
/// # Errors
/// Returns [`HullError::ImageDecode`] if the bytes are not a supported image.
pub fn decode_image(view: usize, bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|source| HullError::ImageDecode { view, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage, RgbaImage};

    #[test]
    fn test_white_background_color_key() {
        let mut img = RgbImage::from_pixel(8, 6, image::Rgb([255, 255, 255]));
        img.put_pixel(2, 3, image::Rgb([10, 20, 30]));
        // Near-white stays background
        img.put_pixel(5, 1, image::Rgb([245, 245, 245]));
        let sil = SilhouetteExtractor::default().extract(&DynamicImage::ImageRgb8(img));

        assert_eq!(sil.dimensions(), UVec2::new(8, 6));
        assert_eq!(sil.foreground_count(), 1);
        assert!(sil.contains(2, 3));
        assert!(!sil.contains(5, 1));
    }

    #[test]
    fn test_grayscale_input() {
        let mut img = GrayImage::from_pixel(4, 4, Luma([255]));
        img.put_pixel(1, 1, Luma([100]));
        let sil = SilhouetteExtractor::default().extract(&DynamicImage::ImageLuma8(img));
        assert_eq!(sil.foreground_count(), 1);
        assert!(sil.contains(1, 1));
    }

    #[test]
    fn test_auto_uses_alpha_when_transparent() {
        // A white object on a transparent background: color keying would miss it
        let mut img = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 0]));
        img.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        img.put_pixel(3, 3, image::Rgba([255, 255, 255, 200]));
        let sil = SilhouetteExtractor::default().extract(&DynamicImage::ImageRgba8(img));
        assert_eq!(sil.foreground_count(), 2);
        assert!(sil.contains(0, 0));
        assert!(sil.contains(3, 3));
    }

    #[test]
    fn test_auto_falls_back_to_color_when_opaque() {
        let mut img = RgbaImage::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]));
        img.put_pixel(2, 1, image::Rgba([0, 0, 0, 255]));
        let sil = SilhouetteExtractor::default().extract(&DynamicImage::ImageRgba8(img));
        assert_eq!(sil.foreground_count(), 1);
        assert!(sil.contains(2, 1));
    }

    #[test]
    fn test_custom_background_color() {
        let config = SilhouetteConfig {
            mode: KeyMode::Color,
            background_color: [0, 255, 0],
            ..SilhouetteConfig::default()
        };
        let mut img = RgbImage::from_pixel(3, 3, image::Rgb([0, 255, 0]));
        img.put_pixel(1, 1, image::Rgb([255, 255, 255]));
        let sil = SilhouetteExtractor::new(config).extract(&DynamicImage::ImageRgb8(img));
        assert_eq!(sil.foreground_count(), 1);
        assert!(sil.contains(1, 1));
    }

    #[test]
    fn test_empty_mask_is_not_an_error() {
        let img = RgbImage::from_pixel(5, 5, image::Rgb([255, 255, 255]));
        let sil = SilhouetteExtractor::default().extract(&DynamicImage::ImageRgb8(img));
        assert!(sil.is_empty());
        assert_eq!(sil.bounds(), None);
    }

    #[test]
    fn test_bounds_and_out_of_range() {
        let sil = Silhouette::from_fn(10, 10, |x, y| (3..=6).contains(&x) && (2..=4).contains(&y));
        assert_eq!(sil.bounds(), Some((UVec2::new(3, 2), UVec2::new(6, 4))));
        assert!(!sil.contains(10, 3));
        assert!(!sil.contains(4, 99));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(16, 16, |x, y| {
            let v = ((x * 31 + y * 17) % 256) as u8;
            image::Rgb([v, v, v])
        }));
        let extractor = SilhouetteExtractor::default();
        assert_eq!(extractor.extract(&img), extractor.extract(&img));
    }

    #[test]
    fn test_decode_errors_name_view() {
        let err = decode_image(4, &[0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, HullError::ImageDecode { view: 4, .. }));
    }
}
