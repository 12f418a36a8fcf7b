//! Perceptual color difference (CIEDE2000).
//!
//! Colors are converted from 8-bit sRGB into CIELAB under the D65 white point,
//! and then compared using the full CIEDE2000 formula with all parametric weighting factors
//! (`kL`, `kC`, `kH`) set to `1`.
//!
//! CIEDE2000 is not a metric in the mathematical sense (it does not satisfy the triangle inequality),
//! but it is symmetric and the difference of a color with itself is always `0`.

// Referenced paper:
// Sharma, G., Wu, W. & Dalal, E.N. The CIEDE2000 color-difference formula: Implementation notes,
// supplementary test data, and mathematical observations.
// Color Research & Application, vol. 30, no. 1, 21–30, 2005.
// https://doi.org/10.1002/col.20070

use palette::{white_point::D65, IntoColor, Lab, LinSrgb, Srgb};
use std::f64::consts::PI;

/// `25^7`, used by the chroma compensation terms.
const POW25_7: f64 = 6_103_515_625.0;

/// Converts an 8-bit sRGB color into CIELAB (D65).
///
/// The sRGB transfer function is removed first, then the linear color is
/// converted through CIE XYZ into CIELAB.
#[must_use]
pub fn srgb_to_lab(color: Srgb<u8>) -> Lab<D65, f64> {
    let linear: LinSrgb<f64> = color.into_format::<f64>().into_linear();
    linear.into_color()
}

/// Returns the hue angle in degrees within `0.0..360.0` for the given `a` and `b` components.
fn hue_angle(a: f64, b: f64) -> f64 {
    if a == 0.0 && b == 0.0 {
        0.0
    } else {
        let h = b.atan2(a).to_degrees();
        if h < 0.0 {
            h + 360.0
        } else {
            h
        }
    }
}

/// Computes the CIEDE2000 color difference (ΔE00) between two CIELAB colors.
///
/// # Examples
/// ```
/// # use huegrade::difference::ciede2000;
/// # use palette::Lab;
/// let a = Lab::new(50.0, 2.6772, -79.7751);
/// let b = Lab::new(50.0, 0.0, -82.7485);
/// assert!((ciede2000(a, b) - 2.0425).abs() < 1e-4);
/// ```
#[must_use]
#[allow(clippy::similar_names)]
pub fn ciede2000(lab1: Lab<D65, f64>, lab2: Lab<D65, f64>) -> f64 {
    let Lab { l: l1, a: a1, b: b1, .. } = lab1;
    let Lab { l: l2, a: a2, b: b2, .. } = lab2;

    // a' is stretched for low chroma colors to compensate for the non-uniformity of CIELAB near neutral
    let c_ab_mean = (a1.hypot(b1) + a2.hypot(b2)) / 2.0;
    let c_ab_mean7 = c_ab_mean.powi(7);
    let g = 0.5 * (1.0 - (c_ab_mean7 / (c_ab_mean7 + POW25_7)).sqrt());

    let a1_prime = (1.0 + g) * a1;
    let a2_prime = (1.0 + g) * a2;

    let c1_prime = a1_prime.hypot(b1);
    let c2_prime = a2_prime.hypot(b2);
    let c_product = c1_prime * c2_prime;

    let h1_prime = hue_angle(a1_prime, b1);
    let h2_prime = hue_angle(a2_prime, b2);

    let delta_l_prime = l2 - l1;
    let delta_c_prime = c2_prime - c1_prime;

    let delta_h_prime = if c_product == 0.0 {
        0.0
    } else {
        let dh = h2_prime - h1_prime;
        if dh > 180.0 {
            dh - 360.0
        } else if dh < -180.0 {
            dh + 360.0
        } else {
            dh
        }
    };

    let delta_big_h_prime = 2.0 * c_product.sqrt() * (delta_h_prime.to_radians() / 2.0).sin();

    let l_prime_mean = (l1 + l2) / 2.0;
    let c_prime_mean = (c1_prime + c2_prime) / 2.0;

    let h_prime_mean = if c_product == 0.0 {
        h1_prime + h2_prime
    } else {
        let sum = h1_prime + h2_prime;
        if (h1_prime - h2_prime).abs() <= 180.0 {
            sum / 2.0
        } else if sum < 360.0 {
            (sum + 360.0) / 2.0
        } else {
            (sum - 360.0) / 2.0
        }
    };

    let t = 1.0 - 0.17 * (h_prime_mean - 30.0).to_radians().cos()
        + 0.24 * (2.0 * h_prime_mean).to_radians().cos()
        + 0.32 * (3.0 * h_prime_mean + 6.0).to_radians().cos()
        - 0.20 * (4.0 * h_prime_mean - 63.0).to_radians().cos();

    let l_offset2 = (l_prime_mean - 50.0).powi(2);
    let s_l = 1.0 + (0.015 * l_offset2) / (20.0 + l_offset2).sqrt();
    let s_c = 1.0 + 0.045 * c_prime_mean;
    let s_h = 1.0 + 0.015 * c_prime_mean * t;

    // rotation term for the blue region
    let delta_theta = 30.0 * (-((h_prime_mean - 275.0) / 25.0).powi(2)).exp();
    let c_prime_mean7 = c_prime_mean.powi(7);
    let r_c = 2.0 * (c_prime_mean7 / (c_prime_mean7 + POW25_7)).sqrt();
    let r_t = -(2.0 * delta_theta * PI / 180.0).sin() * r_c;

    let lightness = delta_l_prime / s_l;
    let chroma = delta_c_prime / s_c;
    let hue = delta_big_h_prime / s_h;

    (lightness * lightness + chroma * chroma + hue * hue + r_t * chroma * hue).sqrt()
}

/// Computes the perceptual difference between two 8-bit sRGB colors.
///
/// The returned value is non-negative, is `0.0` for identical colors,
/// and is symmetric in its arguments.
#[must_use]
pub fn perceptual_distance(a: Srgb<u8>, b: Srgb<u8>) -> f64 {
    ciede2000(srgb_to_lab(a), srgb_to_lab(b))
}

/// Squared euclidean distance between two 8-bit colors in raw channel space.
///
/// This is the cheap metric used while training k-means.
#[must_use]
pub fn squared_euclidean_distance(x: [u8; 3], y: [u8; 3]) -> u32 {
    let mut dist = 0;
    for c in 0..3 {
        let d = u32::from(x[c].abs_diff(y[c]));
        dist += d * d;
    }
    dist
}
