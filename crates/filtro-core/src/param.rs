//! Parameter handling with smoothing for zipper-free changes.
//!
//! Filter controls are written from a control thread (UI, automation, preset
//! recall) and read from the real-time render thread. The two halves are
//! split accordingly:
//!
//! - [`AtomicParam`] holds the *target* value. It is shared through an `Arc`,
//!   written with [`AtomicParam::set_target`] from any thread, and never
//!   blocks: the f32 is stored as its bit pattern in an `AtomicU32`.
//! - [`SmoothedParam`] is owned by the render kernel. It latches the target
//!   once per render block ([`SmoothedParam::latch_target`]) and then moves
//!   its *current* value one step towards it per sample, so a write landing
//!   mid-block is only heard from the next block on.
//!
//! ## Smoothing Methods
//!
//! - **Exponential (one-pole lowpass)**: Natural decay, default for cutoff and
//!   resonance
//! - **Linear**: Constant rate of change, reaches the target in exactly the
//!   configured time
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use filtro_core::{AtomicParam, SmoothedParam};
//!
//! let cutoff = Arc::new(AtomicParam::new(1000.0, 12.0, 20000.0));
//! let mut smoothed = SmoothedParam::with_config(Arc::clone(&cutoff), 48000.0, 20.0);
//!
//! // Control thread
//! cutoff.set_target(5000.0);
//!
//! // Render thread, once per block ...
//! smoothed.latch_target();
//! // ... then once per sample
//! for _ in 0..480 {
//!     let hz = smoothed.advance();
//!     assert!(hz >= 1000.0 && hz <= 5000.0);
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use libm::expf;

/// Default smoothing time constant for filter controls, in milliseconds.
pub const DEFAULT_SMOOTHING_MS: f32 = 20.0;

/// Relative distance below which an exponential ramp snaps onto its target.
///
/// A one-pole ramp in f32 stalls once `coeff * (target - current)` rounds to
/// zero, roughly `|target| * 5e-5` for a 20 ms ramp at 44.1 kHz. Snapping a
/// little above that floor lets the ramp actually finish.
const SETTLE_RELATIVE: f32 = 1e-4;

/// Lock-free parameter target shared between control and render threads.
///
/// Out-of-range writes are clamped to `[min, max]` before being stored, so a
/// reader always observes a valid value. NaN writes are ignored.
#[derive(Debug)]
pub struct AtomicParam {
    bits: AtomicU32,
    min: f32,
    max: f32,
}

impl AtomicParam {
    /// Create a target with an initial value and a valid range.
    ///
    /// The initial value is clamped into the range.
    pub fn new(initial: f32, min: f32, max: f32) -> Self {
        debug_assert!(min <= max, "AtomicParam range is inverted");
        let initial = if initial.is_nan() { min } else { initial.clamp(min, max) };
        Self {
            bits: AtomicU32::new(initial.to_bits()),
            min,
            max,
        }
    }

    /// Store a new target. Callable from any thread.
    #[inline]
    pub fn set_target(&self, value: f32) {
        if value.is_nan() {
            return;
        }
        let clamped = value.clamp(self.min, self.max);
        self.bits.store(clamped.to_bits(), Ordering::Release);
    }

    /// Read the current target. Callable from any thread.
    #[inline]
    pub fn target(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Lower bound of the valid range.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound of the valid range.
    pub fn max(&self) -> f32 {
        self.max
    }
}

/// Ramp shape used by [`SmoothedParam`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Smoothing {
    /// One-pole lowpass towards the target; the smoothing time is the time
    /// constant (63.2% of the way).
    #[default]
    Exponential,
    /// Constant-rate ramp that lands on the target after exactly the
    /// smoothing time. A new target restarts the ramp from the current value.
    Linear,
}

/// Render-side half of a parameter: the smoothed current value.
///
/// Call [`latch_target`](Self::latch_target) at each block boundary and
/// [`advance`](Self::advance) once per sample from the render thread. Neither
/// blocks nor allocates.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Shared target written by the control thread
    target: Arc<AtomicParam>,
    /// Target loaded at the last block boundary
    latched: f32,
    /// Current smoothed value
    current: f32,
    /// Ramp shape
    smoothing: Smoothing,
    /// One-pole coefficient (0 = frozen, 1 = instant)
    coeff: f32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Smoothing time in milliseconds
    smoothing_time_ms: f32,
    /// Target the active linear ramp is heading to
    ramp_target: f32,
    /// Linear increment per sample
    increment: f32,
    /// Linear samples left until the ramp lands
    samples_remaining: u32,
}

impl SmoothedParam {
    /// Create a smoothed parameter starting at the shared target.
    ///
    /// Smoothing is disabled (instant changes) until a sample rate and
    /// smoothing time are configured.
    pub fn new(target: Arc<AtomicParam>) -> Self {
        let initial = target.target();
        Self {
            target,
            latched: initial,
            current: initial,
            smoothing: Smoothing::Exponential,
            coeff: 1.0,
            sample_rate: 44100.0,
            smoothing_time_ms: 0.0,
            ramp_target: initial,
            increment: 0.0,
            samples_remaining: 0,
        }
    }

    /// Create a smoothed parameter with full configuration.
    pub fn with_config(target: Arc<AtomicParam>, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(target);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Select the ramp shape. Any ramp in flight finishes instantly.
    pub fn set_smoothing(&mut self, smoothing: Smoothing) {
        self.smoothing = smoothing;
        self.snap_to_target();
    }

    /// Current ramp shape.
    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// Update sample rate and recalculate the smoothing coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Set smoothing time in milliseconds. `0.0` means instant.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms.max(0.0);
        self.recalculate_coeff();
    }

    /// Smoothing time in milliseconds.
    pub fn smoothing_time_ms(&self) -> f32 {
        self.smoothing_time_ms
    }

    /// Load the shared target for the coming block and return it.
    ///
    /// Writes made after this call are ignored by [`advance`](Self::advance)
    /// until the next latch.
    #[inline]
    pub fn latch_target(&mut self) -> f32 {
        self.latched = self.target.target();
        self.latched
    }

    /// Get the next smoothed value (advances by one sample towards the
    /// latched target).
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let target = self.latched;
        match self.smoothing {
            Smoothing::Exponential => {
                // y[n] = y[n-1] + coeff * (target - y[n-1])
                self.current += self.coeff * (target - self.current);
                if (target - self.current).abs() <= SETTLE_RELATIVE * target.abs().max(1e-3) {
                    self.current = target;
                }
            }
            Smoothing::Linear => {
                if target != self.ramp_target {
                    self.start_ramp(target);
                }
                if self.samples_remaining > 0 {
                    self.current += self.increment;
                    self.samples_remaining -= 1;
                    if self.samples_remaining == 0 {
                        self.current = self.ramp_target;
                    }
                }
            }
        }
        self.current
    }

    /// Current smoothed value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Latest value written to the shared target; may not be latched yet.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target.target()
    }

    /// The target the ramp is heading to.
    #[inline]
    pub fn latched_target(&self) -> f32 {
        self.latched
    }

    /// Shared target handle.
    pub fn handle(&self) -> &Arc<AtomicParam> {
        &self.target
    }

    /// Whether the current value has reached the latched target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.current == self.latched
    }

    /// Latch the shared target and jump to it immediately.
    pub fn snap_to_target(&mut self) {
        let target = self.latch_target();
        self.current = target;
        self.ramp_target = target;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    fn start_ramp(&mut self, target: f32) {
        self.ramp_target = target;
        let samples = (self.smoothing_time_ms / 1000.0 * self.sample_rate).round() as u32;
        if samples == 0 {
            self.current = target;
            self.increment = 0.0;
            self.samples_remaining = 0;
        } else {
            self.increment = (target - self.current) / samples as f32;
            self.samples_remaining = samples;
        }
    }

    /// Recalculate the one-pole coefficient.
    ///
    /// `coeff = 1 - exp(-1 / (tau * sample_rate))` with `tau` the smoothing
    /// time in seconds; after 5 tau the ramp is within 0.7% of the target.
    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}
