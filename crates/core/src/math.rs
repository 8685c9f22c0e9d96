//! Deterministic math functions for cross-platform consistency.
//!
//! Hardware implementations of trig functions can differ between
//! architectures (x86 vs ARM vs WASM). Placement yaw and visibility scores
//! feed ground-truth labels, so everything that touches an angle goes through
//! these software implementations and produces identical results everywhere.

use std::f32::consts::PI;

/// Deterministic atan for a single value.
///
/// Folds the argument into [0, 2 - sqrt(3)] with the reciprocal and 30 degree
/// identities before evaluating the odd polynomial, which keeps the error
/// under 1e-5 degrees across the whole range.
#[inline]
fn atan_det(x: f32) -> f32 {
    const SQRT_3: f32 = 1.732_050_8;
    const TAN_PI_12: f32 = 2.0 - SQRT_3;

    let sign = x.signum();
    let x = x.abs();

    // atan(x) = PI/2 - atan(1/x)
    let inverted = x > 1.0;
    let z = if inverted { 1.0 / x } else { x };

    // atan(z) = PI/6 + atan((z*sqrt(3) - 1) / (sqrt(3) + z))
    let (z, offset) = if z > TAN_PI_12 {
        ((z * SQRT_3 - 1.0) / (SQRT_3 + z), PI / 6.0)
    } else {
        (z, 0.0)
    };

    let z2 = z * z;
    let a1 = -0.333331346;
    let a2 = 0.199900893;
    let a3 = -0.142006844;
    let a4 = 0.106347479;
    let a5 = -0.074890330;
    let a6 = 0.042972115;
    let a7 = -0.016045005;

    let series =
        z * (1.0 + z2 * (a1 + z2 * (a2 + z2 * (a3 + z2 * (a4 + z2 * (a5 + z2 * (a6 + z2 * a7)))))));
    let angle = offset + series;

    sign * if inverted { PI / 2.0 - angle } else { angle }
}

/// Deterministic atan2.
/// Returns angle in radians in range [-PI, PI], within f32 rounding of
/// `f32::atan2` (about 1e-6 rad).
#[inline]
pub fn atan2_det(y: f32, x: f32) -> f32 {
    if x == 0.0 && y == 0.0 {
        return 0.0;
    }
    if x == 0.0 {
        return if y > 0.0 { PI / 2.0 } else { -PI / 2.0 };
    }
    if y == 0.0 {
        return if x > 0.0 { 0.0 } else { PI };
    }

    let atan_val = atan_det(y / x);

    if x > 0.0 {
        atan_val
    } else if y >= 0.0 {
        atan_val + PI
    } else {
        atan_val - PI
    }
}

/// Deterministic sine using Bhaskara I's approximation (accurate to ~0.001).
#[inline]
pub fn sin_det(x: f32) -> f32 {
    let x = wrap_two_pi(x);

    let (x, sign) = if x > PI { (x - PI, -1.0) } else { (x, 1.0) };

    let numerator = 16.0 * x * (PI - x);
    let denominator = 5.0 * PI * PI - 4.0 * x * (PI - x);

    sign * numerator / denominator
}

/// Deterministic cosine.
#[inline]
pub fn cos_det(x: f32) -> f32 {
    sin_det(x + PI / 2.0)
}

/// Wrap angle to [0, 2π).
#[inline]
fn wrap_two_pi(x: f32) -> f32 {
    const TWO_PI: f32 = 2.0 * PI;
    let wrapped = x.rem_euclid(TWO_PI);
    if wrapped >= TWO_PI {
        0.0
    } else {
        wrapped
    }
}

/// Deterministic square root using Newton-Raphson iteration.
#[inline]
pub fn sqrt_det(x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }

    // Initial guess using the inverse-sqrt bit trick
    let i = 0x5f375a86 - (x.to_bits() >> 1);
    let mut guess = 1.0 / f32::from_bits(i);

    guess = 0.5 * (guess + x / guess);
    guess = 0.5 * (guess + x / guess);
    guess = 0.5 * (guess + x / guess);

    guess
}

/// Deterministic ground-plane length.
#[inline]
pub fn length_det(x: f32, y: f32) -> f32 {
    sqrt_det(x * x + y * y)
}

/// Normalize a yaw in degrees into [-180, 180).
#[inline]
pub fn normalize_yaw_degrees(yaw: f32) -> f32 {
    let wrapped = (yaw + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 180.0 {
        -180.0
    } else {
        wrapped
    }
}

/// Yaw in degrees of a ground-plane direction, measured from +X toward +Y.
#[inline]
pub fn yaw_of_direction(x: f32, y: f32) -> f32 {
    atan2_det(y, x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atan2_quadrants() {
        let eps = 0.01;

        let a1 = atan2_det(1.0, 1.0);
        assert!((a1 - PI / 4.0).abs() < eps, "Q1: got {}", a1);

        let a2 = atan2_det(1.0, -1.0);
        assert!((a2 - 3.0 * PI / 4.0).abs() < eps, "Q2: got {}", a2);

        let a3 = atan2_det(-1.0, -1.0);
        assert!((a3 - (-3.0 * PI / 4.0)).abs() < eps, "Q3: got {}", a3);

        let a4 = atan2_det(-1.0, 1.0);
        assert!((a4 - (-PI / 4.0)).abs() < eps, "Q4: got {}", a4);
    }

    #[test]
    fn test_sin_cos_det() {
        let eps = 0.01;

        assert!(sin_det(0.0).abs() < eps);
        assert!((sin_det(PI / 2.0) - 1.0).abs() < eps);
        assert!(sin_det(PI).abs() < eps);
        assert!((sin_det(-PI / 2.0) + 1.0).abs() < eps);

        assert!((cos_det(0.0) - 1.0).abs() < eps);
        assert!(cos_det(PI / 2.0).abs() < eps);
        assert!((cos_det(PI) + 1.0).abs() < eps);
    }

    #[test]
    fn test_sqrt_det() {
        let eps = 0.001;

        assert!((sqrt_det(4.0) - 2.0).abs() < eps);
        assert!((sqrt_det(2.0) - 1.414).abs() < eps);
        assert!((sqrt_det(0.25) - 0.5).abs() < eps);
        assert_eq!(sqrt_det(0.0), 0.0);
        assert!((length_det(300.0, 400.0) - 500.0).abs() < 0.1);
    }

    #[test]
    fn test_normalize_yaw() {
        assert_eq!(normalize_yaw_degrees(0.0), 0.0);
        assert_eq!(normalize_yaw_degrees(180.0), -180.0);
        assert_eq!(normalize_yaw_degrees(-180.0), -180.0);
        assert!((normalize_yaw_degrees(270.0) - (-90.0)).abs() < 1e-4);
        assert!((normalize_yaw_degrees(-190.0) - 170.0).abs() < 1e-4);
        assert!((normalize_yaw_degrees(725.0) - 5.0).abs() < 1e-3);

        for i in -2000..2000 {
            let yaw = normalize_yaw_degrees(i as f32 * 0.37);
            assert!((-180.0..180.0).contains(&yaw), "{yaw}");
        }
    }

    #[test]
    fn test_yaw_of_direction() {
        assert!(yaw_of_direction(1.0, 0.0).abs() < 0.05);
        assert!((yaw_of_direction(0.0, 1.0) - 90.0).abs() < 0.05);
        assert!((yaw_of_direction(-1.0, -1.0) + 135.0).abs() < 0.05);
    }

    #[test]
    fn test_atan2_error_bound() {
        let mut worst = 0.0f32;
        for i in -1800..1800 {
            let angle = (i as f32 * 0.1).to_radians();
            let (y, x) = (angle.sin(), angle.cos());
            let error = (atan2_det(y, x) - y.atan2(x)).abs();
            // -180 and 180 are the same direction
            let error = error.min((error - 2.0 * PI).abs());
            worst = worst.max(error);
        }
        assert!(worst.to_degrees() < 0.001, "worst error {} deg", worst.to_degrees());
    }

    #[test]
    fn test_determinism() {
        let run = || -> Vec<f32> {
            (0..100)
                .map(|i| {
                    let x = i as f32 * 0.1;
                    atan2_det(sin_det(x), cos_det(x))
                })
                .collect()
        };
        assert_eq!(run(), run());
    }
}
