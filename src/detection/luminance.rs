use image::GrayImage;
use thiserror::Error;

use crate::detection::rotation::RotatedFrame;
use crate::models::CropRegion;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LuminanceError {
    #[error("crop region {region:?} does not fit inside {width}x{height} frame")]
    CropOutOfBounds {
        region: CropRegion,
        width: u32,
        height: u32,
    },
}

/// Grayscale view over a rotated frame, bounded to a crop region
#[derive(Debug, Clone, Copy)]
pub struct LuminanceSource<'a> {
    data: &'a [u8],
    data_width: u32,
    crop: CropRegion,
}

impl<'a> LuminanceSource<'a> {
    pub fn new(frame: RotatedFrame<'a>, crop: CropRegion) -> Result<Self, LuminanceError> {
        if !crop.fits_within(frame.width, frame.height) {
            return Err(LuminanceError::CropOutOfBounds {
                region: crop,
                width: frame.width,
                height: frame.height,
            });
        }
        Ok(Self {
            data: frame.data,
            data_width: frame.width,
            crop,
        })
    }

    pub fn width(&self) -> u32 {
        self.crop.width
    }

    pub fn height(&self) -> u32 {
        self.crop.height
    }

    /// One row of the cropped view
    fn row(&self, y: u32) -> &'a [u8] {
        let start = ((self.crop.top + y) as usize) * self.data_width as usize + self.crop.left as usize;
        &self.data[start..start + self.crop.width as usize]
    }

    /// Copy the cropped region into an owned grayscale image
    pub fn render_cropped_greyscale(&self) -> GrayImage {
        let mut pixels = Vec::with_capacity(self.width() as usize * self.height() as usize);
        for y in 0..self.height() {
            pixels.extend_from_slice(self.row(y));
        }
        // Length always matches the crop dimensions
        GrayImage::from_raw(self.width(), self.height(), pixels)
            .unwrap_or_else(|| GrayImage::new(self.width(), self.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(data: &[u8], width: u32, height: u32) -> RotatedFrame<'_> {
        RotatedFrame { data, width, height }
    }

    #[test]
    fn test_render_cropped() {
        // 4x3 image
        let data: Vec<u8> = (0..12).collect();
        let source = LuminanceSource::new(frame(&data, 4, 3), CropRegion::new(1, 1, 2, 2)).unwrap();
        let image = source.render_cropped_greyscale();

        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.as_raw(), &vec![5, 6, 9, 10]);
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let data = vec![0u8; 12];
        let err = LuminanceSource::new(frame(&data, 4, 3), CropRegion::new(3, 0, 2, 1)).unwrap_err();
        assert!(matches!(err, LuminanceError::CropOutOfBounds { width: 4, height: 3, .. }));
    }

    #[test]
    fn test_full_frame_crop() {
        let data: Vec<u8> = (0..6).collect();
        let source = LuminanceSource::new(frame(&data, 3, 2), CropRegion::new(0, 0, 3, 2)).unwrap();
        assert_eq!(source.row(1), &[3, 4, 5]);
    }

    #[test]
    fn test_crop_at_bottom_right_corner() {
        // Rows are only ever read through the rendered crop, never past its height
        let data: Vec<u8> = (0..12).collect();
        let source = LuminanceSource::new(frame(&data, 4, 3), CropRegion::new(2, 1, 2, 2)).unwrap();
        let image = source.render_cropped_greyscale();
        assert_eq!(image.as_raw(), &vec![6, 7, 10, 11]);
    }
}
