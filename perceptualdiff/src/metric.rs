//! Yee's perceptually-based image difference metric.
//!
//! From "A perceptual metric for production testing", Journal of Graphics
//! Tools 9(4), 2004. Per pixel, local contrast between adjacent pyramid
//! levels is weighted by a contrast sensitivity function and a visual
//! masking term to produce a threshold-elevation factor; a pixel fails when
//! its luminance difference exceeds the elevated threshold of visibility,
//! or when the chroma difference exceeds the same factor.
//!
//! Every pixel's decision is independent once the pyramids and the
//! adaptation level are fixed, so the scan runs as a row-parallel
//! map-reduce over failure counts.

use rayon::prelude::*;

use crate::color::PerceptualChannels;
use crate::pyramid::{LaplacianPyramid, MAX_PYR_LEVELS};

/// Below this many pixels the row scan stays sequential.
const PARALLEL_THRESHOLD: usize = 1 << 14;

/// Floor applied to contrast denominators, contrast sums, and adaptation
/// luminance so the metric never divides by zero or takes log10(0).
const MIN_DENOMINATOR: f32 = 1e-5;

/// Threshold of visibility in cd/m^2 for a given adaptation luminance.
///
/// TVI means Threshold vs Intensity; this fit is from Ward Larson,
/// Siggraph 1997.
pub fn tvi(adaptation_luminance: f32) -> f32 {
    let log_a = adaptation_luminance.log10();

    let r = if log_a < -3.94 {
        -2.86
    } else if log_a < -1.44 {
        (0.405 * log_a + 1.6).powf(2.18) - 2.86
    } else if log_a < -0.0184 {
        log_a - 0.395
    } else if log_a < 1.9 {
        (0.249 * log_a + 0.65).powf(2.7) - 0.72
    } else {
        log_a - 1.255
    };

    10.0f32.powf(r)
}

/// Contrast sensitivity function (Barten, SPIE 1989) for a spatial
/// frequency in cycles per degree and an adaptation luminance.
pub fn csf(cpd: f32, lum: f32) -> f32 {
    let a = 440.0 * (1.0 + 0.7 / lum).powf(-0.2);
    let b = 0.3 * (1.0 + 100.0 / lum).powf(0.15);

    a * cpd * (-b * cpd).exp() * (1.0 + 0.06 * (b * cpd).exp()).sqrt()
}

/// Visual masking function (Daly 1993).
pub fn mask(contrast: f32) -> f32 {
    let a = (392.498 * contrast).powf(0.7);
    let b = (0.0153 * a).powf(4.0);
    (1.0 + b).powf(0.25)
}

/// Counts the pixels at which the two images are visibly different.
///
/// Both pyramids must be built from the same-sized luminance planes as the
/// chroma channels; `field_of_view` is the horizontal field of view of the
/// observer in degrees.
pub fn visibly_different_pixels(
    la: &LaplacianPyramid,
    lb: &LaplacianPyramid,
    a: &PerceptualChannels,
    b: &PerceptualChannels,
    field_of_view: f32,
) -> u32 {
    let width = la.width();
    let height = la.height();

    let num_one_degree_pixels =
        (2.0 * (f64::from(field_of_view) * 0.5 * std::f64::consts::PI / 180.0).tan() * 180.0
            / std::f64::consts::PI) as f32;
    let pixels_per_degree = width as f32 / num_one_degree_pixels;

    // The level whose spatial extent reaches roughly one degree of visual
    // field; used uniformly as the adaptation reference for every pixel.
    let mut num_pixels = 1.0f32;
    let mut adaptation_level = 0;
    for i in 0..MAX_PYR_LEVELS {
        adaptation_level = i;
        if num_pixels > num_one_degree_pixels {
            break;
        }
        num_pixels *= 2.0;
    }

    let mut cpd = [0.0f32; MAX_PYR_LEVELS];
    cpd[0] = 0.5 * pixels_per_degree;
    for i in 1..MAX_PYR_LEVELS {
        cpd[i] = 0.5 * cpd[i - 1];
    }

    let csf_max = csf(3.248, 100.0);
    let mut f_freq = [0.0f32; MAX_PYR_LEVELS - 2];
    for i in 0..MAX_PYR_LEVELS - 2 {
        f_freq[i] = csf_max / csf(cpd[i], 100.0);
    }

    let row_failed = |y: usize| -> u32 {
        let rows_la: [&[f32]; MAX_PYR_LEVELS] = std::array::from_fn(|i| la.level(i).row(y));
        let rows_lb: [&[f32]; MAX_PYR_LEVELS] = std::array::from_fn(|i| lb.level(i).row(y));
        let a_ca = a.chroma_a.row(y);
        let a_cb = a.chroma_b.row(y);
        let b_ca = b.chroma_a.row(y);
        let b_cb = b.chroma_b.row(y);

        let mut failed = 0u32;
        for x in 0..width {
            let mut contrast = [0.0f32; MAX_PYR_LEVELS - 2];
            let mut sum_contrast = 0.0f32;
            for i in 0..MAX_PYR_LEVELS - 2 {
                let n1 = (rows_la[i][x] - rows_la[i + 1][x]).abs();
                let n2 = (rows_lb[i][x] - rows_lb[i + 1][x]).abs();
                let numerator = n1.max(n2);
                let denominator = rows_la[i + 2][x]
                    .abs()
                    .max(rows_lb[i + 2][x].abs())
                    .max(MIN_DENOMINATOR);
                contrast[i] = numerator / denominator;
                sum_contrast += contrast[i];
            }
            sum_contrast = sum_contrast.max(MIN_DENOMINATOR);

            let adapt = (0.5 * (rows_la[adaptation_level][x] + rows_lb[adaptation_level][x]))
                .max(MIN_DENOMINATOR);

            let mut f_mask = [0.0f32; MAX_PYR_LEVELS - 2];
            for i in 0..MAX_PYR_LEVELS - 2 {
                f_mask[i] = mask(contrast[i] * csf(cpd[i], adapt));
            }

            let mut factor = 0.0f32;
            for i in 0..MAX_PYR_LEVELS - 2 {
                factor += contrast[i] * f_freq[i] * f_mask[i] / sum_contrast;
            }
            let factor = factor.clamp(1.0, 10.0);

            let delta = (rows_la[0][x] - rows_lb[0][x]).abs();
            let mut pass = true;
            // pure luminance test
            if delta > factor * tvi(adapt) {
                pass = false;
            } else {
                // CIE delta E test with modifications; the color difference
                // is ramped down to a constant floor in scotopic regions
                let mut color_scale = 1.0f32;
                if adapt < 10.0 {
                    color_scale = 1.0 - (10.0 - color_scale) / 10.0;
                    color_scale *= color_scale;
                }
                let da = a_ca[x] - b_ca[x];
                let db = a_cb[x] - b_cb[x];
                let delta_e = (da * da + db * db) * color_scale;
                if delta_e > factor {
                    pass = false;
                }
            }
            if !pass {
                failed += 1;
            }
        }
        failed
    };

    if width * height >= PARALLEL_THRESHOLD {
        (0..height).into_par_iter().map(row_failed).sum()
    } else {
        (0..height).map(row_failed).sum()
    }
}
