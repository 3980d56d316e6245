//! Resonant low-pass biquad: coefficient design and per-channel state.
//!
//! Coefficient calculation uses the RBJ Audio EQ Cookbook low-pass formula.
//! The recurrence
//!
//! ```text
//! y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
//!                - a1*y[n-1] - a2*y[n-2]
//! ```
//!
//! is evaluated in transposed direct form II, which needs only two state
//! registers per channel ([`ChannelState`]).

use libm::{cos, sin};

use crate::math::flush_denormal;

/// Lowest cutoff the calculator will design for, in Hz.
pub const MIN_CUTOFF_HZ: f32 = 10.0;

/// Highest cutoff as a fraction of the sample rate (just under Nyquist).
pub const MAX_CUTOFF_RATIO: f32 = 0.499;

/// Lowest resonance (Q) the calculator accepts.
pub const MIN_RESONANCE: f32 = 0.1;

/// Highest resonance (Q) the calculator accepts.
pub const MAX_RESONANCE: f32 = 20.0;

/// Normalized biquad coefficients (a0 divided out).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    /// Feedforward coefficient for x[n]
    pub b0: f32,
    /// Feedforward coefficient for x[n-1]
    pub b1: f32,
    /// Feedforward coefficient for x[n-2]
    pub b2: f32,
    /// Feedback coefficient for y[n-1]
    pub a1: f32,
    /// Feedback coefficient for y[n-2]
    pub a2: f32,
}

impl Coefficients {
    /// Identity filter: `y[n] = x[n]`.
    pub const PASSTHROUGH: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Whether both poles lie strictly inside the unit circle.
    ///
    /// Jury conditions for `1 + a1 z^-1 + a2 z^-2`: `|a2| < 1` and
    /// `|a1| < 1 + a2`.
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }

    /// Magnitude of the frequency response at `freq_hz`.
    ///
    /// Evaluates `|H(e^jw)|` in f64 so it can be used as a reference for
    /// measured responses.
    pub fn magnitude_at(&self, freq_hz: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * core::f64::consts::PI * f64::from(freq_hz) / f64::from(sample_rate);
        let (c1, s1) = (cos(w), sin(w));
        let (c2, s2) = (cos(2.0 * w), sin(2.0 * w));

        let (b0, b1, b2) = (f64::from(self.b0), f64::from(self.b1), f64::from(self.b2));
        let (a1, a2) = (f64::from(self.a1), f64::from(self.a2));

        // e^-jw = cos w - j sin w
        let num_re = b0 + b1 * c1 + b2 * c2;
        let num_im = -(b1 * s1 + b2 * s2);
        let den_re = 1.0 + a1 * c1 + a2 * c2;
        let den_im = -(a1 * s1 + a2 * s2);

        let num = libm::sqrt(num_re * num_re + num_im * num_im);
        let den = libm::sqrt(den_re * den_re + den_im * den_im);
        (num / den) as f32
    }
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::PASSTHROUGH
    }
}

/// Clamp a cutoff into `[MIN_CUTOFF_HZ, sample_rate * MAX_CUTOFF_RATIO]`.
///
/// Non-finite input maps to the nearest bound (NaN to the upper bound, which
/// is the least destructive choice for a low-pass).
#[inline]
pub fn clamp_cutoff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let max = (sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF_HZ);
    if cutoff_hz.is_nan() {
        return max;
    }
    cutoff_hz.clamp(MIN_CUTOFF_HZ, max)
}

/// Clamp a resonance into `[MIN_RESONANCE, MAX_RESONANCE]`.
#[inline]
pub fn clamp_resonance(resonance: f32) -> f32 {
    if resonance.is_nan() {
        return MIN_RESONANCE;
    }
    resonance.clamp(MIN_RESONANCE, MAX_RESONANCE)
}

/// Calculates resonant low-pass coefficients using the RBJ cookbook formula.
///
/// Out-of-range input is clamped rather than rejected, so the result is
/// always a stable filter. The design runs in f64 and uses
/// `1 - cos w = 2 sin^2(w/2)` so low cutoffs keep their precision before
/// the result is rounded to f32.
///
/// # Arguments
///
/// * `cutoff_hz` - Cutoff frequency in Hz
/// * `resonance` - Q factor (0.707 is Butterworth, higher values peak)
/// * `sample_rate` - Sample rate in Hz
pub fn lowpass_coefficients(cutoff_hz: f32, resonance: f32, sample_rate: f32) -> Coefficients {
    let cutoff = f64::from(clamp_cutoff(cutoff_hz, sample_rate));
    let q = f64::from(clamp_resonance(resonance));

    let omega = 2.0 * core::f64::consts::PI * cutoff / f64::from(sample_rate);
    let half_sin = sin(omega / 2.0);
    let one_minus_cos = 2.0 * half_sin * half_sin;
    let alpha = sin(omega) / (2.0 * q);

    let b0 = one_minus_cos / 2.0;
    let b1 = one_minus_cos;
    let b2 = one_minus_cos / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos(omega);
    let a2 = 1.0 - alpha;

    Coefficients {
        b0: (b0 / a0) as f32,
        b1: (b1 / a0) as f32,
        b2: (b2 / a0) as f32,
        a1: (a1 / a0) as f32,
        a2: (a2 / a0) as f32,
    }
}

/// Delay-line history for one audio channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelState {
    z1: f32,
    z2: f32,
}

impl ChannelState {
    /// Zeroed state.
    pub const fn new() -> Self {
        Self { z1: 0.0, z2: 0.0 }
    }

    /// Processes a single sample (transposed direct form II).
    ///
    /// If the output or either register becomes non-finite the state is
    /// zeroed and `0.0` is returned; the filter recovers on the next sample.
    #[inline]
    pub fn process(&mut self, c: &Coefficients, input: f32) -> f32 {
        let output = c.b0 * input + self.z1;
        let z1 = c.b1 * input - c.a1 * output + self.z2;
        let z2 = c.b2 * input - c.a2 * output;

        if !(output.is_finite() && z1.is_finite() && z2.is_finite()) {
            self.clear();
            return 0.0;
        }

        self.z1 = flush_denormal(z1);
        self.z2 = flush_denormal(z2);
        output
    }

    /// Clears the delay registers.
    pub fn clear(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Whether both registers are exactly zero.
    pub fn is_clear(&self) -> bool {
        self.z1 == 0.0 && self.z2 == 0.0
    }

    /// Register values `(z1, z2)`.
    pub fn registers(&self) -> (f32, f32) {
        (self.z1, self.z2)
    }
}
