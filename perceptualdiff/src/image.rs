//! Float image plane used for all intermediate channels.
//!
//! The engine works on single-channel f32 planes: the scaled luminance
//! channel that feeds the pyramid, the a*/b* chroma channels, and every
//! pyramid level. Rows are padded to a 16-float boundary so the SIMD
//! convolution never straddles an allocation edge.

/// Single-channel floating point image with an aligned row stride.
#[derive(Debug, Clone)]
pub struct ImageF {
    data: Vec<f32>,
    width: usize,
    height: usize,
    stride: usize, // pixels per row, >= width
}

impl ImageF {
    /// Creates a new image filled with zeros.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let stride = (width + 15) & !15;
        Self {
            data: vec![0.0; stride * height],
            width,
            height,
            stride,
        }
    }

    /// Image width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns a reference to a row, padding excluded.
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Returns a mutable reference to a row, padding excluded.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Gets a pixel value.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.stride + x]
    }

    /// Sets a pixel value.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.stride + x] = value;
    }

    /// Checks if two images have the same dimensions.
    #[must_use]
    pub fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Copies pixel data from another image of the same dimensions.
    ///
    /// # Panics
    /// Panics if dimensions don't match.
    pub fn copy_from(&mut self, other: &Self) {
        assert!(self.same_size(other));
        for y in 0..self.height {
            self.row_mut(y).copy_from_slice(other.row(y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let img = ImageF::new(5, 3);
        for y in 0..3 {
            assert!(img.row(y).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_row_excludes_padding() {
        let img = ImageF::new(5, 3);
        assert_eq!(img.row(0).len(), 5);
        assert_eq!(img.row(2).len(), 5);
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut img = ImageF::new(17, 4);
        img.set(16, 3, 2.5);
        assert_eq!(img.get(16, 3), 2.5);
        assert_eq!(img.get(0, 0), 0.0);
    }

    #[test]
    fn test_copy_from() {
        let mut a = ImageF::new(4, 4);
        let mut b = ImageF::new(4, 4);
        b.set(2, 1, 7.0);
        a.copy_from(&b);
        assert_eq!(a.get(2, 1), 7.0);
    }
}
