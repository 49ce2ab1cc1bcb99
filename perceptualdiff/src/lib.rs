//! # perceptualdiff
//!
//! A perceptually-based image comparison oracle for visual regression
//! testing, implementing Yee's metric ("A perceptual metric for production
//! testing", Journal of Graphics Tools 9(4), 2004).
//!
//! Two equally-sized images are "perceptually indistinguishable" when the
//! number of pixels at which a model of human vision can tell them apart
//! falls below a caller-supplied threshold. The model accounts for:
//!
//! - Adaptation luminance (via a multi-resolution blur pyramid)
//! - Contrast sensitivity as a function of spatial frequency (Barten 1989)
//! - Visual masking by nearby high-contrast content (Daly 1993)
//! - Threshold of visibility vs. intensity (Ward Larson 1997)
//! - Chromatic differences in CIE L\*a\*b\*
//!
//! Input pixels are packed 32-bit premultiplied ARGB (the cairo
//! image-surface layout), carried in an [`ImgRef`] so buffers with row
//! strides wider than the image compare correctly.
//!
//! ## Example
//!
//! ```rust
//! use perceptualdiff::{compare, CompareParams, Img};
//!
//! let pixels = vec![0xFF80_8080u32; 16 * 16];
//! let img = Img::new(pixels, 16, 16);
//!
//! let status = compare(img.as_ref(), img.as_ref(), &CompareParams::default());
//! assert!(status.passed());
//! println!("{status}");
//! ```
//!
//! A comparison is a pure function of its inputs: no state survives the
//! call, and concurrent comparisons over different buffers are independent.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Constants keep the exact literal forms of the published fits
#![allow(clippy::unreadable_literal)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

pub mod color;
mod diff;
pub mod image;
pub mod metric;
pub mod pyramid;

// Re-export the input buffer types for convenience
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::RGB8;

/// Comparison parameters.
///
/// Use the builder pattern to construct:
/// ```rust
/// use perceptualdiff::CompareParams;
///
/// let params = CompareParams::new()
///     .with_gamma(2.2)
///     .with_luminance(100.0)     // white point in cd/m^2
///     .with_field_of_view(45.0)  // degrees of visual field
///     .with_threshold_pixels(100);
/// ```
#[derive(Debug, Clone)]
pub struct CompareParams {
    gamma: f32,
    luminance: f32,
    field_of_view: f32,
    threshold_pixels: u32,
}

impl Default for CompareParams {
    fn default() -> Self {
        Self {
            gamma: 2.2,
            luminance: 100.0,
            field_of_view: 45.0,
            threshold_pixels: 100,
        }
    }
}

impl CompareParams {
    /// Creates parameters with the defaults: gamma 2.2, 100 cd/m^2,
    /// 45 degree field of view, 100-pixel threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display gamma used to expand the 8-bit channel values.
    #[must_use]
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the white-point luminance of the display in cd/m^2.
    #[must_use]
    pub fn with_luminance(mut self, luminance: f32) -> Self {
        self.luminance = luminance;
        self
    }

    /// Sets the observer's field of view in degrees.
    #[must_use]
    pub fn with_field_of_view(mut self, field_of_view: f32) -> Self {
        self.field_of_view = field_of_view;
        self
    }

    /// Sets the number of visibly different pixels at or above which the
    /// comparison fails.
    #[must_use]
    pub fn with_threshold_pixels(mut self, threshold_pixels: u32) -> Self {
        self.threshold_pixels = threshold_pixels;
        self
    }

    /// Returns the display gamma.
    #[must_use]
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Returns the white-point luminance in cd/m^2.
    #[must_use]
    pub fn luminance(&self) -> f32 {
        self.luminance
    }

    /// Returns the field of view in degrees.
    #[must_use]
    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    /// Returns the failing-pixel threshold.
    #[must_use]
    pub fn threshold_pixels(&self) -> u32 {
        self.threshold_pixels
    }
}

/// Outcome of one comparison.
///
/// Dimension mismatch is an ordinary FAIL outcome rather than an error:
/// the comparison is an oracle, and "these cannot be the same image" is a
/// valid answer for it to give.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareStatus {
    /// The images have different dimensions; the metric never ran.
    DimensionMismatch,
    /// Every pixel is bitwise identical; the metric never ran.
    BinaryIdentical,
    /// The failing-pixel count came in under the threshold.
    PerceptuallyIndistinguishable {
        /// Number of visibly different pixels.
        failed_pixels: u32,
    },
    /// The failing-pixel count reached the threshold.
    VisiblyDifferent {
        /// Number of visibly different pixels.
        failed_pixels: u32,
    },
}

impl CompareStatus {
    /// Whether the comparison passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(
            self,
            Self::BinaryIdentical | Self::PerceptuallyIndistinguishable { .. }
        )
    }

    /// Number of visibly different pixels.
    ///
    /// Zero for outcomes where the metric never ran.
    #[must_use]
    pub fn failed_pixels(&self) -> u32 {
        match self {
            Self::DimensionMismatch | Self::BinaryIdentical => 0,
            Self::PerceptuallyIndistinguishable { failed_pixels }
            | Self::VisiblyDifferent { failed_pixels } => *failed_pixels,
        }
    }
}

impl std::fmt::Display for CompareStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DimensionMismatch => write!(f, "FAIL: Image dimensions do not match"),
            Self::BinaryIdentical => write!(f, "PASS: Images are binary identical"),
            Self::PerceptuallyIndistinguishable { .. } => {
                write!(f, "PASS: Images are perceptually indistinguishable")
            }
            Self::VisiblyDifferent { failed_pixels } => {
                write!(
                    f,
                    "FAIL: Images are visibly different\n{failed_pixels} pixels are different"
                )
            }
        }
    }
}

/// Compares two packed-ARGB images under a model of human vision.
///
/// Pixels are 32-bit premultiplied ARGB. The two buffers may have
/// different row strides but must have identical width and height;
/// mismatched dimensions produce [`CompareStatus::DimensionMismatch`].
///
/// Bitwise-identical images short-circuit to
/// [`CompareStatus::BinaryIdentical`] without running the metric.
///
/// # Example
/// ```rust
/// use perceptualdiff::{compare, CompareParams, Img};
///
/// let a = Img::new(vec![0xFF00_0000u32; 64], 8, 8);
/// let mut pixels = vec![0xFF00_0000u32; 64];
/// pixels[0] = 0xFFFF_FFFF;
/// let b = Img::new(pixels, 8, 8);
///
/// let status = compare(a.as_ref(), b.as_ref(), &CompareParams::default());
/// println!("{status}: {} pixels differ", status.failed_pixels());
/// ```
#[must_use]
pub fn compare(
    img_a: ImgRef<'_, u32>,
    img_b: ImgRef<'_, u32>,
    params: &CompareParams,
) -> CompareStatus {
    diff::compare_images(img_a, img_b, params)
}
