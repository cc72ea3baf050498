use image::RgbImage;
use ndarray::Array2;

use crate::tracks::BBox;

/// Crops narrower or shorter than this are too small to cluster
const MIN_CROP_SIDE: u32 = 2;

/// Represents a pixel region of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropArea {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropArea {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top half of a player bbox (the jersey), clipped to the frame.
    ///
    /// Returns `None` when the clipped region is too small to hold a
    /// background and a jersey color.
    pub fn jersey(bbox: &BBox, frame_width: u32, frame_height: u32) -> Option<Self> {
        let x1 = bbox.x1.max(0.0) as u32;
        let y1 = bbox.y1.max(0.0) as u32;
        let x2 = (bbox.x2.max(0.0) as u32).min(frame_width);
        let y2 = (bbox.y2.max(0.0) as u32).min(frame_height);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        let width = x2 - x1;
        let height = (bbox.height().max(0.0) as u32 / 2).min(y2 - y1);
        if width < MIN_CROP_SIDE || height < MIN_CROP_SIDE {
            return None;
        }
        Some(Self::new(x1, y1, width, height))
    }

    /// Row-major indices of the four corner pixels
    pub fn corner_indices(&self) -> [usize; 4] {
        let (w, h) = (self.width as usize, self.height as usize);
        [0, w - 1, (h - 1) * w, h * w - 1]
    }
}

/// Pixels of `area` as an `(n, 3)` RGB matrix in row-major order
pub fn crop_pixels(frame: &RgbImage, area: CropArea) -> Array2<f32> {
    let cropped = image::imageops::crop_imm(frame, area.x, area.y, area.width, area.height).to_image();
    let n = (cropped.width() * cropped.height()) as usize;
    let mut pixels = Array2::zeros((n, 3));
    for (i, px) in cropped.pixels().enumerate() {
        for c in 0..3 {
            pixels[[i, c]] = px.0[c] as f32;
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_jersey_is_top_half() {
        let area = CropArea::jersey(&BBox::new(10.0, 20.0, 30.0, 60.0), 100, 100).unwrap();
        assert_eq!(area, CropArea::new(10, 20, 20, 20));
    }

    #[test]
    fn test_jersey_is_clipped_to_frame() {
        let area = CropArea::jersey(&BBox::new(-5.0, 90.0, 8.0, 130.0), 100, 100).unwrap();
        assert_eq!(area, CropArea::new(0, 90, 8, 10));
    }

    #[test]
    fn test_tiny_or_outside_boxes_are_rejected() {
        assert!(CropArea::jersey(&BBox::new(10.0, 10.0, 11.0, 40.0), 100, 100).is_none());
        assert!(CropArea::jersey(&BBox::new(10.0, 10.0, 30.0, 12.0), 100, 100).is_none());
        assert!(CropArea::jersey(&BBox::new(150.0, 10.0, 180.0, 40.0), 100, 100).is_none());
    }

    #[test]
    fn test_crop_pixels_shape_and_order() {
        let mut frame = RgbImage::from_pixel(6, 6, Rgb([0, 0, 0]));
        frame.put_pixel(2, 1, Rgb([255, 0, 0]));
        let area = CropArea::new(1, 1, 3, 2);
        let pixels = crop_pixels(&frame, area);
        assert_eq!(pixels.dim(), (6, 3));
        // (2,1) is the second pixel of the first crop row
        assert_eq!(pixels[[1, 0]], 255.0);
        assert_eq!(area.corner_indices(), [0, 2, 3, 5]);
    }
}
