use image::GrayImage;
use imageproc::contrast::{adaptive_threshold, otsu_level};

/// Neighbourhood radius for local thresholding, in pixels
const ADAPTIVE_BLOCK_RADIUS: u32 = 12;

/// Black/white bitmap handed to a code reader. `true` marks a dark module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryBitmap {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl BinaryBitmap {
    pub fn from_fn(width: u32, height: u32, mut is_dark: impl FnMut(u32, u32) -> bool) -> Self {
        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push(is_dark(x, y));
            }
        }
        Self { width, height, bits }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn row(&self, y: u32) -> &[bool] {
        let start = y as usize * self.width as usize;
        &self.bits[start..start + self.width as usize]
    }

    pub fn column(&self, x: u32) -> Vec<bool> {
        (0..self.height).map(|y| self.is_dark(x, y)).collect()
    }

    pub fn dark_count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

/// Strategy for turning grayscale into black/white
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binarizer {
    /// Threshold each pixel against its local mean
    Adaptive,
    /// One image-wide threshold picked from the histogram (Otsu)
    GlobalHistogram,
}

impl Binarizer {
    /// Attempt order used by the structured-code stage
    pub const FALLBACK_ORDER: [Binarizer; 2] = [Binarizer::Adaptive, Binarizer::GlobalHistogram];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Adaptive => "adaptive",
            Self::GlobalHistogram => "global-histogram",
        }
    }

    pub fn binarize(&self, image: &GrayImage) -> BinaryBitmap {
        let (width, height) = image.dimensions();
        match self {
            Self::Adaptive => {
                let thresholded = adaptive_threshold(image, ADAPTIVE_BLOCK_RADIUS);
                BinaryBitmap::from_fn(width, height, |x, y| thresholded.get_pixel(x, y)[0] == 0)
            }
            Self::GlobalHistogram => {
                let level = otsu_level(image);
                BinaryBitmap::from_fn(width, height, |x, y| image.get_pixel(x, y)[0] <= level)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn split_image() -> GrayImage {
        // Left half dark, right half bright
        GrayImage::from_fn(40, 20, |x, _| if x < 20 { Luma([20u8]) } else { Luma([230u8]) })
    }

    #[test]
    fn test_global_histogram_splits_halves() {
        let bitmap = Binarizer::GlobalHistogram.binarize(&split_image());
        assert_eq!(bitmap.width(), 40);
        assert_eq!(bitmap.height(), 20);
        assert!(bitmap.is_dark(0, 0));
        assert!(bitmap.is_dark(19, 10));
        assert!(!bitmap.is_dark(20, 10));
        assert!(!bitmap.is_dark(39, 19));
        assert_eq!(bitmap.dark_count(), 400);
    }

    #[test]
    fn test_adaptive_marks_dark_side() {
        let bitmap = Binarizer::Adaptive.binarize(&split_image());
        // Pixels next to the edge are darker than their local mean
        assert!(bitmap.is_dark(18, 10));
        assert!(!bitmap.is_dark(21, 10));
    }

    #[test]
    fn test_fallback_order() {
        assert_eq!(
            Binarizer::FALLBACK_ORDER,
            [Binarizer::Adaptive, Binarizer::GlobalHistogram]
        );
    }
}
