//! Numeric helpers for the render path.
//!
//! Everything here is branch-light, allocation-free and safe to call per
//! sample.

/// Smallest magnitude kept by [`flush_denormal`].
///
/// Values below this are inaudible and would otherwise decay into the
/// subnormal range, where many CPUs fall off a performance cliff.
pub const DENORMAL_THRESHOLD: f32 = 1e-20;

/// Flush values near zero to exactly zero.
///
/// Applied to filter registers after every sample so a decaying tail
/// never lingers in the subnormal range.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < DENORMAL_THRESHOLD { 0.0 } else { x }
}

/// Relative difference between two positive control values.
///
/// Returns `|a - b| / max(|b|, f32::MIN_POSITIVE)`, used by the kernel to
/// decide whether a smoothed parameter moved far enough to justify a
/// coefficient recompute.
#[inline]
pub fn relative_delta(a: f32, b: f32) -> f32 {
    (a - b).abs() / b.abs().max(f32::MIN_POSITIVE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1.0), 1.0);
        assert_eq!(flush_denormal(-0.5), -0.5);
        assert_eq!(flush_denormal(1e-10), 1e-10);

        assert_eq!(flush_denormal(1e-21), 0.0);
        assert_eq!(flush_denormal(-1e-21), 0.0);
        assert_eq!(flush_denormal(1e-38), 0.0);
        assert_eq!(flush_denormal(0.0), 0.0);
    }

    #[test]
    fn test_relative_delta() {
        assert_eq!(relative_delta(1000.0, 1000.0), 0.0);
        assert!((relative_delta(1010.0, 1000.0) - 0.01).abs() < 1e-6);
        // Zero reference does not divide by zero.
        assert!(relative_delta(1.0, 0.0).is_finite());
    }
}
