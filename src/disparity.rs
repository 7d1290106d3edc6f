//! # General disparity objects
//!
//! This module provides the stereo frame, disparity map and algorithm trait shared by the
//! solvers in this crate.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{GrayImage, RgbImage};
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A pair of 8-bit colour images of the same scene, already rectified.
pub struct StereoFrame {
    pub left: RgbImage,
    pub right: RgbImage
}

/// An 8-bit integer disparity map.
///
/// Pixels the solver could not reach keep the value 0.
pub struct DisparityMap {
    data: GrayImage,
    pub max_disp: Option<u8>,
    pub min_disp: Option<u8>
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait DisparityAlgorithm {
    /// Compute the disparity map of the given stereo frame.
    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityMap>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl StereoFrame {
    pub fn new(left: RgbImage, right: RgbImage) -> Self {
        Self { left, right }
    }

    pub fn width(&self) -> u32 {
        self.left.width()
    }

    pub fn height(&self) -> u32 {
        self.left.height()
    }
}

impl DisparityMap {
    pub fn new(width: usize, height: usize) -> Self {
        DisparityMap {
            data: GrayImage::new(width as u32, height as u32),
            min_disp: None,
            max_disp: None
        }
    }

    pub fn width(&self) -> usize {
        self.data.width() as usize
    }

    pub fn height(&self) -> usize {
        self.data.height() as usize
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data.get_pixel(x as u32, y as u32)[0]
    }

    /// Set the disparity at `(x, y)`, widening the observed range to include it.
    pub fn put(&mut self, x: usize, y: usize, val: u8) {
        self.data.put_pixel(x as u32, y as u32, image::Luma([val]));

        self.min_disp = Some(self.min_disp.map_or(val, |d| d.min(val)));
        self.max_disp = Some(self.max_disp.map_or(val, |d| d.max(val)));
    }

    /// Raw disparities as a greyscale image.
    pub fn to_luma(&self) -> GrayImage {
        self.data.clone()
    }

    /// Converts the image to a normalised GrayImage.
    ///
    /// Stretches the observed disparity range onto `0..=255`. If the range is empty or was never
    /// set the function is equivalent to `.to_luma()`.
    pub fn to_luma_normalised(&self) -> GrayImage {
        match (self.min_disp, self.max_disp) {
            (Some(min), Some(max)) if max > min => {
                imageproc::contrast::stretch_contrast(&self.data, min, max)
            }
            _ => self.to_luma()
        }
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_tracks_range() {
        let mut map = DisparityMap::new(4, 3);
        assert_eq!(map.min_disp, None);

        map.put(1, 1, 7);
        map.put(2, 1, 3);
        map.put(3, 2, 5);

        assert_eq!(map.min_disp, Some(3));
        assert_eq!(map.max_disp, Some(7));
        assert_eq!(map.get(1, 1), 7);
        assert_eq!(map.get(0, 0), 0);
    }

    #[test]
    fn normalised_spans_full_range() {
        let mut map = DisparityMap::new(3, 1);
        map.put(0, 0, 2);
        map.put(1, 0, 6);

        let img = map.to_luma_normalised();
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn flat_map_is_unchanged() {
        let mut map = DisparityMap::new(2, 2);
        map.put(0, 0, 4);

        assert_eq!(map.to_luma_normalised(), map.to_luma());
    }
}
