//! Comparison driver.
//!
//! Orchestrates one comparison: dimension check, bitwise fast path, then
//! the full perceptual path (color conversion, pyramids, metric) and the
//! threshold verdict. Nothing is retained between calls; all planes and
//! pyramids are scratch state owned by this function.

use imgref::ImgRef;

use crate::color::convert_image;
use crate::metric::visibly_different_pixels;
use crate::pyramid::LaplacianPyramid;
use crate::{CompareParams, CompareStatus};

pub(crate) fn compare_images(
    img_a: ImgRef<'_, u32>,
    img_b: ImgRef<'_, u32>,
    params: &CompareParams,
) -> CompareStatus {
    if img_a.width() != img_b.width() || img_a.height() != img_b.height() {
        return CompareStatus::DimensionMismatch;
    }

    // Bitwise fast path: identical pixels need no perceptual model. Rows
    // are compared through the stride-aware views, so differing strides
    // still compare only visible pixels.
    if img_a.rows().zip(img_b.rows()).all(|(ra, rb)| ra == rb) {
        return CompareStatus::BinaryIdentical;
    }

    let a = convert_image(img_a, params.gamma(), params.luminance());
    let b = convert_image(img_b, params.gamma(), params.luminance());

    let la = LaplacianPyramid::build(&a.lum);
    let lb = LaplacianPyramid::build(&b.lum);

    let failed_pixels = visibly_different_pixels(&la, &lb, &a, &b, params.field_of_view());

    if failed_pixels < params.threshold_pixels() {
        CompareStatus::PerceptuallyIndistinguishable { failed_pixels }
    } else {
        CompareStatus::VisiblyDifferent { failed_pixels }
    }
}
