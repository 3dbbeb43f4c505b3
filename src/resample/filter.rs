//! Reconstruction filter contract and the canonical kernel set.
//!
//! Kernels are pure functions of the sample offset. Every kernel is symmetric
//! and zero outside `[-radius, radius]`, which the weight table relies on.

use std::f32::consts::PI;

/// A separable reconstruction filter.
///
/// Implementations must be pure and thread-safe: the same filter object is
/// evaluated from every worker while the weight tables are built.
pub trait ResampleFilter: Send + Sync {
    /// Support half-width; offsets outside `[-radius, radius]` weigh zero.
    fn sampling_radius(&self) -> f32;

    /// Kernel value at real offset `x`.
    fn apply(&self, x: f32) -> f32;
}

/// Lanczos kernel with a=2
/// Smaller window than Lanczos3, less ringing but also less sharp.
#[inline]
pub fn lanczos2(x: f32) -> f32 {
    if x.abs() < 1e-8 {
        1.0
    } else if x.abs() >= 2.0 {
        0.0
    } else {
        let pi_x = PI * x;
        let pi_x_2 = pi_x / 2.0;
        (pi_x.sin() / pi_x) * (pi_x_2.sin() / pi_x_2)
    }
}

/// Lanczos kernel with a=3
#[inline]
pub fn lanczos3(x: f32) -> f32 {
    if x.abs() < 1e-8 {
        1.0
    } else if x.abs() >= 3.0 {
        0.0
    } else {
        let pi_x = PI * x;
        let pi_x_3 = pi_x / 3.0;
        (pi_x.sin() / pi_x) * (pi_x_3.sin() / pi_x_3)
    }
}

/// Mitchell-Netravali kernel with B=C=1/3
/// This setting minimizes both blur and ringing artifacts.
/// Support is [-2, 2], overshoot is typically <1%
#[inline]
pub fn mitchell(x: f32) -> f32 {
    let x = x.abs();
    if x >= 2.0 {
        0.0
    } else if x >= 1.0 {
        // (-B - 6C)|x|³ + (6B + 30C)|x|² + (-12B - 48C)|x| + (8B + 24C)
        // With B=C=1/3: -7/3 x³ + 12x² - 20x + 32/3, divided by 6
        (-7.0 / 18.0) * x * x * x + 2.0 * x * x - (10.0 / 3.0) * x + 16.0 / 9.0
    } else {
        // (12 - 9B - 6C)|x|³ + (-18 + 12B + 6C)|x|² + (6 - 2B)
        // With B=C=1/3: 7x³ - 12x² + 16/3, divided by 6
        (7.0 / 6.0) * x * x * x - 2.0 * x * x + 8.0 / 9.0
    }
}

/// Catmull-Rom spline kernel (B=0, C=0.5)
/// Sharper than Mitchell, less ringing than Lanczos.
/// This is an interpolating spline (passes through original sample points).
/// Support is [-2, 2]
#[inline]
pub fn catmull_rom(x: f32) -> f32 {
    let x = x.abs();
    if x >= 2.0 {
        0.0
    } else if x >= 1.0 {
        -0.5 * x * x * x + 2.5 * x * x - 4.0 * x + 2.0
    } else {
        1.5 * x * x * x - 2.5 * x * x + 1.0
    }
}

/// Cubic B-spline kernel (B=1, C=0)
/// Very smooth, never rings, noticeably blurs. Support is [-2, 2]
#[inline]
pub fn bspline(x: f32) -> f32 {
    let x = x.abs();
    if x >= 2.0 {
        0.0
    } else if x >= 1.0 {
        let t = 2.0 - x;
        t * t * t / 6.0
    } else {
        0.5 * x * x * x - x * x + 2.0 / 3.0
    }
}

/// Triangle (tent) kernel, equivalent to bilinear interpolation
#[inline]
pub fn triangle(x: f32) -> f32 {
    let x = x.abs();
    if x < 1.0 {
        1.0 - x
    } else {
        0.0
    }
}

/// Hermite cubic kernel. Support is [-1, 1]
#[inline]
pub fn hermite(x: f32) -> f32 {
    let x = x.abs();
    if x >= 1.0 {
        0.0
    } else {
        2.0 * x * x * x - 3.0 * x * x + 1.0
    }
}

/// Bell (quadratic spline) kernel. Support is [-1.5, 1.5]
#[inline]
pub fn bell(x: f32) -> f32 {
    let x = x.abs();
    if x < 0.5 {
        0.75 - x * x
    } else if x < 1.5 {
        let t = x - 1.5;
        0.5 * t * t
    } else {
        0.0
    }
}

/// Box filter (rectangular window)
/// Returns 1.0 for |x| <= 0.5, 0.0 otherwise.
#[inline]
pub fn box_filter(x: f32) -> f32 {
    if x.abs() <= 0.5 {
        1.0
    } else {
        0.0
    }
}

/// Lanczos3 - good balance of sharpness and ringing. The default filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lanczos3;

impl ResampleFilter for Lanczos3 {
    fn sampling_radius(&self) -> f32 {
        3.0
    }

    fn apply(&self, x: f32) -> f32 {
        lanczos3(x)
    }
}

/// Lanczos2 - good sharpness with less ringing than Lanczos3
#[derive(Debug, Clone, Copy, Default)]
pub struct Lanczos2;

impl ResampleFilter for Lanczos2 {
    fn sampling_radius(&self) -> f32 {
        2.0
    }

    fn apply(&self, x: f32) -> f32 {
        lanczos2(x)
    }
}

/// Mitchell-Netravali (B=C=1/3) - soft, minimal ringing
#[derive(Debug, Clone, Copy, Default)]
pub struct Mitchell;

impl ResampleFilter for Mitchell {
    fn sampling_radius(&self) -> f32 {
        2.0
    }

    fn apply(&self, x: f32) -> f32 {
        mitchell(x)
    }
}

/// Catmull-Rom (B=0, C=0.5) - sharp interpolating spline, low ringing
#[derive(Debug, Clone, Copy, Default)]
pub struct CatmullRom;

impl ResampleFilter for CatmullRom {
    fn sampling_radius(&self) -> f32 {
        2.0
    }

    fn apply(&self, x: f32) -> f32 {
        catmull_rom(x)
    }
}

/// Cubic B-spline - very smooth, never rings
#[derive(Debug, Clone, Copy, Default)]
pub struct BSpline;

impl ResampleFilter for BSpline {
    fn sampling_radius(&self) -> f32 {
        2.0
    }

    fn apply(&self, x: f32) -> f32 {
        bspline(x)
    }
}

/// Triangle (tent) - bilinear interpolation
#[derive(Debug, Clone, Copy, Default)]
pub struct Triangle;

impl ResampleFilter for Triangle {
    fn sampling_radius(&self) -> f32 {
        1.0
    }

    fn apply(&self, x: f32) -> f32 {
        triangle(x)
    }
}

/// Hermite cubic - fast, slightly soft
#[derive(Debug, Clone, Copy, Default)]
pub struct Hermite;

impl ResampleFilter for Hermite {
    fn sampling_radius(&self) -> f32 {
        1.0
    }

    fn apply(&self, x: f32) -> f32 {
        hermite(x)
    }
}

/// Bell (quadratic spline) - soft
#[derive(Debug, Clone, Copy, Default)]
pub struct Bell;

impl ResampleFilter for Bell {
    fn sampling_radius(&self) -> f32 {
        1.5
    }

    fn apply(&self, x: f32) -> f32 {
        bell(x)
    }
}

/// Box - point sampling on upscale, ordinary average on downscale
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxFilter;

impl ResampleFilter for BoxFilter {
    fn sampling_radius(&self) -> f32 {
        0.5
    }

    fn apply(&self, x: f32) -> f32 {
        box_filter(x)
    }
}
