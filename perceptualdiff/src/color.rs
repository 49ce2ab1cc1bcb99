//! Color conversion: packed ARGB to the perceptual channels the metric
//! consumes.
//!
//! Pixels arrive as premultiplied ARGB (the cairo image-surface layout).
//! Each pixel is un-premultiplied, gamma-expanded, converted through
//! Adobe RGB (1998) / D65 to CIE XYZ, and from there to L*a*b*. The metric
//! keeps three planes per image: luminance (Y scaled to cd/m^2) and the
//! a*/b* chroma channels.

use imgref::ImgRef;
use rgb::RGB8;

use crate::image::ImageF;

/// Adobe RGB (1998) to XYZ, D65 reference white.
/// Matrix coefficients from <http://www.brucelindbloom.com/>.
const ADOBE_RGB_TO_XYZ: [f32; 9] = [
    0.576700, 0.185556, 0.188212, // X row
    0.297361, 0.627355, 0.0752847, // Y row
    0.0270328, 0.0706879, 0.991248, // Z row
];

/// CIE L*a*b* transfer-function constants.
const LAB_EPSILON: f32 = 216.0 / 24389.0;
const LAB_KAPPA: f32 = 24389.0 / 27.0;

/// Converts gamma-expanded RGB to CIE XYZ.
#[inline]
#[must_use]
pub const fn rgb_to_xyz(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let m = &ADOBE_RGB_TO_XYZ;
    (
        r * m[0] + g * m[1] + b * m[2],
        r * m[3] + g * m[4] + b * m[5],
        r * m[6] + g * m[7] + b * m[8],
    )
}

/// Reference white tristimulus, the conversion of RGB (1, 1, 1).
const REFERENCE_WHITE: (f32, f32, f32) = rgb_to_xyz(1.0, 1.0, 1.0);

/// Converts CIE XYZ to L*a*b* relative to the Adobe RGB reference white.
#[inline]
#[must_use]
pub fn xyz_to_lab(x: f32, y: f32, z: f32) -> (f32, f32, f32) {
    let (xw, yw, zw) = REFERENCE_WHITE;
    let r = [x / xw, y / yw, z / zw];
    let mut f = [0.0f32; 3];
    for (fi, &ri) in f.iter_mut().zip(r.iter()) {
        *fi = if ri > LAB_EPSILON {
            ri.cbrt()
        } else {
            (LAB_KAPPA * ri + 16.0) / 116.0
        };
    }
    (
        116.0 * f[1] - 16.0,
        500.0 * (f[0] - f[1]),
        200.0 * (f[1] - f[2]),
    )
}

/// Recovers straight (non-premultiplied) RGB from a packed premultiplied
/// ARGB pixel.
///
/// The rounding matches cairo's premultiplication: each channel is
/// `(raw * 255 + alpha / 2) / alpha`, and fully transparent pixels decode
/// to black. Skipping this step would silently corrupt every downstream
/// value for translucent input.
#[inline]
#[must_use]
pub fn unpremultiply(pixel: u32) -> RGB8 {
    let alpha = (pixel >> 24) & 0xff;
    if alpha == 0 {
        return RGB8::new(0, 0, 0);
    }
    let un = |raw: u32| ((raw * 255 + alpha / 2) / alpha) as u8;
    RGB8::new(
        un((pixel >> 16) & 0xff),
        un((pixel >> 8) & 0xff),
        un(pixel & 0xff),
    )
}

/// Per-image perceptual planes: physical luminance plus a*/b* chroma.
pub struct PerceptualChannels {
    /// Y tristimulus scaled by the target luminance (cd/m^2).
    pub lum: ImageF,
    /// L*a*b* a* channel.
    pub chroma_a: ImageF,
    /// L*a*b* b* channel.
    pub chroma_b: ImageF,
}

/// Converts a packed-ARGB image into perceptual channel planes.
///
/// `gamma` expands each un-premultiplied channel (`(raw/255)^gamma`) before
/// the color matrix; `luminance` scales the Y channel to cd/m^2.
#[must_use]
pub fn convert_image(img: ImgRef<'_, u32>, gamma: f32, luminance: f32) -> PerceptualChannels {
    let (width, height) = (img.width(), img.height());
    let mut lum = ImageF::new(width, height);
    let mut chroma_a = ImageF::new(width, height);
    let mut chroma_b = ImageF::new(width, height);

    for (y, src_row) in img.rows().enumerate() {
        let lum_row = lum.row_mut(y);
        for (x, &pixel) in src_row.iter().enumerate() {
            let px = unpremultiply(pixel);
            let r = (f32::from(px.r) / 255.0).powf(gamma);
            let g = (f32::from(px.g) / 255.0).powf(gamma);
            let b = (f32::from(px.b) / 255.0).powf(gamma);

            let (cx, cy, cz) = rgb_to_xyz(r, g, b);
            let (_l, ca, cb) = xyz_to_lab(cx, cy, cz);
            lum_row[x] = cy * luminance;
            chroma_a.set(x, y, ca);
            chroma_b.set(x, y, cb);
        }
    }

    PerceptualChannels {
        lum,
        chroma_a,
        chroma_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgref::Img;

    #[test]
    fn test_white_maps_to_reference_white() {
        let (x, y, z) = rgb_to_xyz(1.0, 1.0, 1.0);
        assert!((x - REFERENCE_WHITE.0).abs() < 1e-7);
        assert!((y - REFERENCE_WHITE.1).abs() < 1e-7);
        assert!((z - REFERENCE_WHITE.2).abs() < 1e-7);
        // Y for white is the sum of the matrix's middle row
        assert!((y - 1.0000007).abs() < 1e-5);
    }

    #[test]
    fn test_lab_of_white() {
        let (x, y, z) = rgb_to_xyz(1.0, 1.0, 1.0);
        let (l, a, b) = xyz_to_lab(x, y, z);
        assert!((l - 100.0).abs() < 1e-3, "L* of white should be 100, got {l}");
        assert!(a.abs() < 1e-3);
        assert!(b.abs() < 1e-3);
    }

    #[test]
    fn test_lab_of_black() {
        let (l, a, b) = xyz_to_lab(0.0, 0.0, 0.0);
        assert!(l.abs() < 1e-5);
        assert!(a.abs() < 1e-5);
        assert!(b.abs() < 1e-5);
    }

    #[test]
    fn test_lab_transfer_continuity_at_epsilon() {
        // Both branches of the piecewise transfer function must agree at
        // the epsilon breakpoint.
        let cube_root = LAB_EPSILON.cbrt();
        let linear = (LAB_KAPPA * LAB_EPSILON + 16.0) / 116.0;
        assert!((cube_root - linear).abs() < 1e-5);
    }

    #[test]
    fn test_unpremultiply_opaque() {
        let px = unpremultiply(0xFF80_4020);
        assert_eq!(px, RGB8::new(0x80, 0x40, 0x20));
    }

    #[test]
    fn test_unpremultiply_transparent_is_black() {
        assert_eq!(unpremultiply(0x00FF_FFFF), RGB8::new(0, 0, 0));
    }

    #[test]
    fn test_unpremultiply_half_alpha() {
        // 0x80 alpha with premultiplied channel 0x40 recovers ~0x7F
        let px = unpremultiply(0x8040_0000);
        assert_eq!(px.r, ((0x40 * 255 + 0x40) / 0x80) as u8);
    }

    #[test]
    fn test_convert_image_luminance_scale() {
        // Opaque white at gamma 2.2 keeps Y at the reference value, so the
        // luminance plane is Y_white * 100.
        let pixels = vec![0xFFFF_FFFFu32; 4];
        let img = Img::new(pixels, 2, 2);
        let channels = convert_image(img.as_ref(), 2.2, 100.0);
        assert!((channels.lum.get(0, 0) - 100.00007).abs() < 1e-2);
        assert!(channels.chroma_a.get(1, 1).abs() < 1e-3);
        assert!(channels.chroma_b.get(1, 1).abs() < 1e-3);
    }

    #[test]
    fn test_convert_image_respects_stride() {
        // 2x2 image carried in a buffer with stride 4; the stride pixels
        // are poison values that must never be read.
        let buf = vec![
            0xFF00_0000u32,
            0xFFFF_FFFF,
            0xDEAD_BEEF,
            0xDEAD_BEEF,
            0xFFFF_FFFF,
            0xFF00_0000,
            0xDEAD_BEEF,
            0xDEAD_BEEF,
        ];
        let img = Img::new_stride(buf, 2, 2, 4);
        let channels = convert_image(img.as_ref(), 2.2, 100.0);
        assert!(channels.lum.get(0, 0).abs() < 1e-5);
        assert!((channels.lum.get(1, 0) - 100.00007).abs() < 1e-2);
        assert!((channels.lum.get(0, 1) - 100.00007).abs() < 1e-2);
        assert!(channels.lum.get(1, 1).abs() < 1e-5);
    }
}
