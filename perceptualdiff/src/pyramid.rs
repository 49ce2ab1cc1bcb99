//! Successively blurred image pyramid.
//!
//! Each level is a full-resolution copy of the luminance image, blurred one
//! more time than the previous level with a fixed separable 5-tap kernel.
//! There is no downsampling; the metric reads adjacent levels to measure
//! local contrast at increasing spatial scales.
//!
//! The convolution runs as two transposed horizontal passes so the vertical
//! pass is cache-friendly, with an f32x8 SIMD inner loop for interior
//! pixels and scalar handling for the reflected borders.

use wide::f32x8;

use crate::image::ImageF;

/// Number of pyramid levels.
pub const MAX_PYR_LEVELS: usize = 8;

/// Separable blur kernel; each 1-D half sums to 1.
const KERNEL: [f32; 5] = [0.05, 0.25, 0.4, 0.25, 0.05];

const HALF: usize = KERNEL.len() / 2;

/// Reflects an out-of-range index back into `0..n`.
///
/// Offsets below zero mirror around the first pixel (`-i`), offsets past
/// the end mirror around the last (`2*(n-1) - i`). The reflection is
/// anchored one pixel past the edge, not a mirrored copy of the edge pixel
/// itself; boundary-pixel results depend on this exact rule. The final
/// clamp only engages for degenerate images (n <= 2), where the pure
/// formula would still be out of range.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i >= n {
        i = 2 * (n - 1) - i;
    }
    i.clamp(0, n - 1) as usize
}

/// Convolves each row of `input` with the 5-tap kernel, writing the result
/// transposed into `output` (`output` must be `height x width`).
fn convolve_transpose(input: &ImageF, output: &mut ImageF) {
    let width = input.width();
    let height = input.height();
    debug_assert_eq!(output.width(), height);
    debug_assert_eq!(output.height(), width);

    let border1 = if width <= HALF { width } else { HALF };
    let border2 = if width > HALF { width - HALF } else { 0 };

    for y in 0..height {
        let row_in = input.row(y);

        // Left border, reflected taps
        for x in 0..border1 {
            let mut sum = 0.0;
            for (j, &k) in KERNEL.iter().enumerate() {
                let nx = reflect(x as isize + j as isize - HALF as isize, width);
                sum += k * row_in[nx];
            }
            output.set(y, x, sum);
        }

        // Interior, no bounds handling needed
        if border2 > border1 {
            convolve_row_interior(row_in, y, border1, border2, output);
        }

        // Right border
        for x in border2..width {
            let mut sum = 0.0;
            for (j, &k) in KERNEL.iter().enumerate() {
                let nx = reflect(x as isize + j as isize - HALF as isize, width);
                sum += k * row_in[nx];
            }
            output.set(y, x, sum);
        }
    }
}

/// SIMD interior convolution for one row, 8 x-positions at a time.
#[multiversion::multiversion(targets(
    "x86_64+avx2+fma",
    "x86_64+sse4.1",
    "aarch64+neon",
))]
#[inline]
fn convolve_row_interior(
    row_in: &[f32],
    y: usize,
    border1: usize,
    border2: usize,
    output: &mut ImageF,
) {
    let interior = border2 - border1;
    let simd_chunks = interior / 8;

    for chunk in 0..simd_chunks {
        let x = border1 + chunk * 8;
        let d = x - HALF;
        let mut sum = f32x8::splat(0.0);
        for (j, &k) in KERNEL.iter().enumerate() {
            let arr: [f32; 8] = row_in[d + j..d + j + 8].try_into().unwrap();
            sum += f32x8::from(arr) * f32x8::splat(k);
        }
        let results: [f32; 8] = sum.into();
        for (i, &val) in results.iter().enumerate() {
            // transposed write
            output.set(y, x + i, val);
        }
    }

    // Scalar tail
    for x in (border1 + simd_chunks * 8)..border2 {
        let d = x - HALF;
        let mut sum = 0.0;
        for (j, &k) in KERNEL.iter().enumerate() {
            sum += k * row_in[d + j];
        }
        output.set(y, x, sum);
    }
}

/// Pyramid of progressively blurred full-resolution luminance images.
///
/// Level 0 is an exact copy of the input; level `i` is the 5x5 blur of
/// level `i - 1`. Immutable once built.
pub struct LaplacianPyramid {
    levels: Vec<ImageF>,
    width: usize,
    height: usize,
}

impl LaplacianPyramid {
    /// Builds all [`MAX_PYR_LEVELS`] levels from a luminance image.
    #[must_use]
    pub fn build(image: &ImageF) -> Self {
        let width = image.width();
        let height = image.height();

        let mut levels = Vec::with_capacity(MAX_PYR_LEVELS);
        let mut level0 = ImageF::new(width, height);
        level0.copy_from(image);
        levels.push(level0);

        // Scratch plane for the transposed intermediate
        let mut transposed = ImageF::new(height, width);
        for i in 1..MAX_PYR_LEVELS {
            let mut blurred = ImageF::new(width, height);
            convolve_transpose(&levels[i - 1], &mut transposed);
            convolve_transpose(&transposed, &mut blurred);
            levels.push(blurred);
        }

        Self {
            levels,
            width,
            height,
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

    /// Returns one pyramid level as an image plane.
    #[inline]
    #[must_use]
    pub fn level(&self, level: usize) -> &ImageF {
        &self.levels[level]
    }

    /// Reads a single value, clamping `level` into the valid range.
    ///
    /// The historical C implementation clamped to `MAX_PYR_LEVELS`, one
    /// past the last valid index; internal callers always pass in-range
    /// levels, so clamping to the last level changes no results.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, level: usize) -> f32 {
        let level = level.min(MAX_PYR_LEVELS - 1);
        self.levels[level].get(x, y)
    }
}
