//! Real-time render kernel for the resonant low-pass filter.
//!
//! [`FilterKernel`] owns the per-channel [`ChannelState`], the render-side
//! [`SmoothedParam`]s and the current [`Coefficients`]. Control threads talk
//! to it only through the shared [`FilterParams`] (atomic targets and the
//! bypass flag).
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --allocate--> ResourcesAllocated --render--> Rendering
//!       ^                            ^                          |
//!       |                            +---------- reset ---------+
//!       +------------------- deallocate (from any) -------------+
//! ```
//!
//! Allocation and deallocation take `&mut self`, so they can never overlap a
//! render call on the same kernel; the host is responsible for not calling
//! them from the render thread.
//!
//! ## Coefficient cadence
//!
//! Coefficients are recomputed inside the per-frame loop only when a smoothed
//! control moved by more than [`RECOMPUTE_THRESHOLD`] (relative) since the
//! last design. While both smoothers are settled the design is reused, so a
//! static filter costs one biquad per channel per frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::biquad::{ChannelState, Coefficients, lowpass_coefficients};
use crate::block::AudioBlock;
use crate::error::{ConfigurationError, RenderError};
use crate::math::relative_delta;
use crate::param::{AtomicParam, DEFAULT_SMOOTHING_MS, SmoothedParam, Smoothing};
use crate::param_info::{ParamDescriptor, ParamId};

/// Relative change in a smoothed control that triggers a coefficient
/// recompute.
pub const RECOMPUTE_THRESHOLD: f32 = 1e-5;

/// The filter's automatable controls.
///
/// Discriminants are the stable parameter ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterParam {
    /// Cutoff frequency in Hz.
    Cutoff = 0,
    /// Resonance (Q).
    Resonance = 1,
}

impl FilterParam {
    /// Every control, in index order.
    pub const ALL: [FilterParam; 2] = [FilterParam::Cutoff, FilterParam::Resonance];

    /// Zero-based index, equal to the stable id.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable numeric id.
    pub const fn id(self) -> ParamId {
        ParamId(self as u32)
    }

    /// Look up a control by index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Look up a control by stable id.
    pub fn from_id(id: ParamId) -> Option<Self> {
        Self::from_index(id.0 as usize)
    }

    /// Look up a control by its string id (`"cutoff"`, `"resonance"`).
    pub fn from_string_id(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.descriptor().string_id == key)
    }

    /// Display, range and id metadata.
    ///
    /// | Id | Name | Range | Default |
    /// |----|------|-------|---------|
    /// | 0 | Cutoff | 12–20000 Hz | 1000 |
    /// | 1 | Resonance | 0.1–20 | 0.707 |
    pub fn descriptor(self) -> ParamDescriptor {
        match self {
            FilterParam::Cutoff => {
                ParamDescriptor::frequency_hz("Cutoff", "Cutoff", 12.0, 20000.0, 1000.0)
                    .with_id(self.id(), "cutoff")
            }
            FilterParam::Resonance => {
                ParamDescriptor::dimensionless("Resonance", "Reso", 0.1, 20.0, 0.707)
                    .with_id(self.id(), "resonance")
            }
        }
    }
}

/// Control-side handle to a kernel's parameters.
///
/// Cheap to share (`Arc`) and safe to use from any thread: every field is
/// atomic. This is the only state shared with the render thread.
#[derive(Debug)]
pub struct FilterParams {
    cutoff: Arc<AtomicParam>,
    resonance: Arc<AtomicParam>,
    bypassed: AtomicBool,
}

impl FilterParams {
    /// Parameters at their descriptor defaults.
    pub fn new() -> Self {
        let make = |p: FilterParam| {
            let d = p.descriptor();
            Arc::new(AtomicParam::new(d.default, d.min, d.max))
        };
        Self {
            cutoff: make(FilterParam::Cutoff),
            resonance: make(FilterParam::Resonance),
            bypassed: AtomicBool::new(false),
        }
    }

    /// Set a control's target (clamped to its range).
    pub fn set(&self, param: FilterParam, value: f32) {
        self.target(param).set_target(value);
    }

    /// A control's current target.
    pub fn get(&self, param: FilterParam) -> f32 {
        self.target(param).target()
    }

    /// The shared target for a control.
    pub fn target(&self, param: FilterParam) -> &Arc<AtomicParam> {
        match param {
            FilterParam::Cutoff => &self.cutoff,
            FilterParam::Resonance => &self.resonance,
        }
    }

    /// Bypass processing (output = input).
    pub fn set_bypassed(&self, bypassed: bool) {
        self.bypassed.store(bypassed, Ordering::Release);
    }

    /// Whether processing is bypassed.
    pub fn is_bypassed(&self) -> bool {
        self.bypassed.load(Ordering::Acquire)
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a [`FilterKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelState {
    /// No channel state; render calls fail.
    Uninitialized,
    /// Channel state allocated, nothing rendered since allocation or reset.
    ResourcesAllocated,
    /// At least one block rendered.
    Rendering,
}

/// Render-resource request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSetup {
    /// Input bus channel count.
    pub input_channels: usize,
    /// Output bus channel count. Must equal `input_channels`.
    pub output_channels: usize,
    /// Largest block the host will ask for.
    pub max_frames: usize,
    /// Sample rate in Hz.
    pub sample_rate: f32,
}

impl RenderSetup {
    /// Same channel count in and out.
    pub fn symmetric(channels: usize, max_frames: usize, sample_rate: f32) -> Self {
        Self {
            input_channels: channels,
            output_channels: channels,
            max_frames,
            sample_rate,
        }
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.input_channels != self.output_channels {
            return Err(ConfigurationError::ChannelMismatch {
                input: self.input_channels,
                output: self.output_channels,
            });
        }
        if self.input_channels == 0 {
            return Err(ConfigurationError::NoChannels);
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigurationError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_frames == 0 {
            return Err(ConfigurationError::InvalidMaxFrames);
        }
        Ok(())
    }
}

/// Resonant low-pass render kernel.
///
/// Pure buffers-in/buffers-out; knows nothing about host buffer formats.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use filtro_core::{FilterKernel, FilterParam, FilterParams, RenderSetup};
///
/// let params = Arc::new(FilterParams::new());
/// let mut kernel = FilterKernel::new(Arc::clone(&params));
/// kernel.allocate_render_resources(RenderSetup::symmetric(2, 512, 48000.0))?;
///
/// params.set(FilterParam::Cutoff, 800.0);
///
/// let mut left = vec![0.25f32; 512];
/// let mut right = vec![0.25f32; 512];
/// let mut buffers: [&mut [f32]; 2] = [&mut left, &mut right];
/// kernel.render_in_place(&mut buffers, 512)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct FilterKernel {
    params: Arc<FilterParams>,
    cutoff: SmoothedParam,
    resonance: SmoothedParam,
    coefficients: Coefficients,
    /// Control values the current coefficients were designed for
    designed_cutoff: f32,
    designed_resonance: f32,
    channels: Vec<ChannelState>,
    /// Bypass flag seen by the previous block
    was_bypassed: bool,
    sample_rate: f32,
    max_frames: usize,
    state: KernelState,
}

impl FilterKernel {
    /// Create an unallocated kernel driven by `params`.
    ///
    /// Controls are smoothed exponentially with a
    /// [`DEFAULT_SMOOTHING_MS`] time constant.
    pub fn new(params: Arc<FilterParams>) -> Self {
        let sample_rate = 44100.0;
        let cutoff = SmoothedParam::with_config(
            Arc::clone(params.target(FilterParam::Cutoff)),
            sample_rate,
            DEFAULT_SMOOTHING_MS,
        );
        let resonance = SmoothedParam::with_config(
            Arc::clone(params.target(FilterParam::Resonance)),
            sample_rate,
            DEFAULT_SMOOTHING_MS,
        );
        let mut kernel = Self {
            params,
            cutoff,
            resonance,
            coefficients: Coefficients::PASSTHROUGH,
            designed_cutoff: 0.0,
            designed_resonance: 0.0,
            channels: Vec::new(),
            was_bypassed: false,
            sample_rate,
            max_frames: 0,
            state: KernelState::Uninitialized,
        };
        kernel.redesign();
        kernel
    }

    /// Builder form of [`set_smoothing`](Self::set_smoothing).
    pub fn with_smoothing(mut self, smoothing: Smoothing, time_ms: f32) -> Self {
        self.set_smoothing(smoothing, time_ms);
        self
    }

    /// Select ramp shape and time for both controls. Control context only.
    pub fn set_smoothing(&mut self, smoothing: Smoothing, time_ms: f32) {
        for param in [&mut self.cutoff, &mut self.resonance] {
            param.set_smoothing(smoothing);
            param.set_smoothing_time_ms(time_ms);
        }
        self.redesign();
    }

    /// Shared parameter handle.
    pub fn params(&self) -> &Arc<FilterParams> {
        &self.params
    }

    /// Lifecycle state.
    pub fn state(&self) -> KernelState {
        self.state
    }

    /// Whether channel state is allocated.
    pub fn is_allocated(&self) -> bool {
        self.state != KernelState::Uninitialized
    }

    /// Allocated channel count (0 when unallocated).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Allocated maximum block size (0 when unallocated).
    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Sample rate of the current allocation.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Coefficients currently in use.
    pub fn coefficients(&self) -> Coefficients {
        self.coefficients
    }

    /// Smoothed `(cutoff, resonance)` the render loop is currently at.
    pub fn smoothed_values(&self) -> (f32, f32) {
        (self.cutoff.get(), self.resonance.get())
    }

    /// Channel state, one entry per allocated channel.
    pub fn channel_states(&self) -> &[ChannelState] {
        &self.channels
    }

    /// Allocate channel state for a render configuration.
    ///
    /// Valid from any state; reallocation discards existing channel state.
    /// On error nothing stays allocated.
    pub fn allocate_render_resources(
        &mut self,
        setup: RenderSetup,
    ) -> Result<(), ConfigurationError> {
        if let Err(err) = setup.validate() {
            self.release();
            #[cfg(feature = "tracing")]
            tracing::warn!("allocate_render_resources rejected: {err}");
            return Err(err);
        }

        self.channels.clear();
        self.channels.resize(setup.output_channels, ChannelState::new());
        self.was_bypassed = self.params.is_bypassed();
        self.max_frames = setup.max_frames;
        self.sample_rate = setup.sample_rate;
        self.cutoff.set_sample_rate(setup.sample_rate);
        self.resonance.set_sample_rate(setup.sample_rate);
        self.cutoff.snap_to_target();
        self.resonance.snap_to_target();
        self.redesign();
        self.state = KernelState::ResourcesAllocated;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            channels = setup.output_channels,
            max_frames = setup.max_frames,
            sample_rate = setup.sample_rate,
            "filter kernel allocated"
        );
        Ok(())
    }

    /// Release channel state. Idempotent.
    pub fn deallocate_render_resources(&mut self) {
        if self.state == KernelState::Uninitialized {
            return;
        }
        self.release();
        #[cfg(feature = "tracing")]
        tracing::debug!("filter kernel deallocated");
    }

    /// Zero all channel state and jump the controls to their targets.
    ///
    /// Used on transport restarts and host flushes.
    pub fn reset(&mut self) {
        for state in &mut self.channels {
            state.clear();
        }
        self.was_bypassed = self.params.is_bypassed();
        self.cutoff.snap_to_target();
        self.resonance.snap_to_target();
        self.redesign();
        if self.state == KernelState::Rendering {
            self.state = KernelState::ResourcesAllocated;
        }
    }

    /// Render `input` into `output`.
    ///
    /// Produces bit-identical results to [`render_in_place`](Self::render_in_place)
    /// over a copy of `input`. Buffers may be longer than `frames`; only the
    /// first `frames` samples are read and written.
    pub fn render<I, O>(
        &mut self,
        input: &[I],
        output: &mut [O],
        frames: usize,
    ) -> Result<(), RenderError>
    where
        I: AsRef<[f32]>,
        O: AsMut<[f32]>,
    {
        self.validate_render(input.len(), frames)?;
        for (channel, buf) in input.iter().enumerate() {
            let len = buf.as_ref().len();
            if len < frames {
                return Err(RenderError::BufferTooShort {
                    channel,
                    len,
                    frames,
                });
            }
        }
        let mut block = AudioBlock::new(output, frames)?;
        self.validate_render(block.channel_count(), frames)?;

        for (index, src) in input.iter().enumerate() {
            if let Some(dst) = block.channel_mut(index) {
                dst.copy_from_slice(&src.as_ref()[..frames]);
            }
        }
        self.process(&mut block);
        Ok(())
    }

    /// Render in place: each buffer is both input and output.
    pub fn render_in_place<B: AsMut<[f32]>>(
        &mut self,
        buffers: &mut [B],
        frames: usize,
    ) -> Result<(), RenderError> {
        self.validate_render(buffers.len(), frames)?;
        let mut block = AudioBlock::new(buffers, frames)?;
        self.process(&mut block);
        Ok(())
    }

    /// Render a pre-validated block in place.
    pub fn render_block<B: AsMut<[f32]>>(
        &mut self,
        block: &mut AudioBlock<'_, B>,
    ) -> Result<(), RenderError> {
        self.validate_render(block.channel_count(), block.frames())?;
        self.process(block);
        Ok(())
    }

    /// Check a render request without touching any samples.
    ///
    /// Host adapters call this before translating buffers so a rejected
    /// request leaves caller memory untouched.
    pub fn validate_render(&self, channels: usize, frames: usize) -> Result<(), RenderError> {
        if self.state == KernelState::Uninitialized {
            return Err(RenderError::NotAllocated);
        }
        if channels != self.channels.len() {
            return Err(RenderError::ChannelCountMismatch {
                expected: self.channels.len(),
                actual: channels,
            });
        }
        if frames > self.max_frames {
            return Err(RenderError::TooManyFrames {
                frames,
                max: self.max_frames,
            });
        }
        Ok(())
    }

    /// Per-sample loop. No allocation, no locks, no logging.
    ///
    /// Control targets and the bypass flag are read once, at the top of the
    /// block; writes landing mid-block apply from the next block.
    fn process<B: AsMut<[f32]>>(&mut self, block: &mut AudioBlock<'_, B>) {
        self.state = KernelState::Rendering;
        self.cutoff.latch_target();
        self.resonance.latch_target();
        let bypassed = self.params.is_bypassed();
        if bypassed != self.was_bypassed {
            // History from before the switch no longer matches the input.
            for state in &mut self.channels {
                state.clear();
            }
            self.was_bypassed = bypassed;
        }
        let frames = block.frames();
        let buffers = block.channels_mut();

        for frame in 0..frames {
            let cutoff = self.cutoff.advance();
            let resonance = self.resonance.advance();
            if relative_delta(cutoff, self.designed_cutoff) > RECOMPUTE_THRESHOLD
                || relative_delta(resonance, self.designed_resonance) > RECOMPUTE_THRESHOLD
            {
                self.coefficients = lowpass_coefficients(cutoff, resonance, self.sample_rate);
                self.designed_cutoff = cutoff;
                self.designed_resonance = resonance;
            }

            if bypassed {
                continue;
            }

            for (buf, state) in buffers.iter_mut().zip(self.channels.iter_mut()) {
                let sample = &mut buf.as_mut()[frame];
                *sample = if sample.is_finite() {
                    state.process(&self.coefficients, *sample)
                } else {
                    state.clear();
                    0.0
                };
            }
        }
    }

    /// Design coefficients for the current smoothed values.
    fn redesign(&mut self) {
        let cutoff = self.cutoff.get();
        let resonance = self.resonance.get();
        self.coefficients = lowpass_coefficients(cutoff, resonance, self.sample_rate);
        self.designed_cutoff = cutoff;
        self.designed_resonance = resonance;
    }

    fn release(&mut self) {
        self.channels = Vec::new();
        self.max_frames = 0;
        self.state = KernelState::Uninitialized;
    }
}
