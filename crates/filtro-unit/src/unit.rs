//! The host-facing filter unit.
//!
//! [`FilterUnit`] owns the render side (kernel and bus adapter) and a
//! [`UnitShared`] handle for the control side. Hosts call the resource and
//! render methods from their audio setup and render threads; parameter,
//! state, preset and view calls may come from any control thread, either
//! through the unit or through a cloned [`UnitShared`].

use std::sync::Arc;

use filtro_core::{
    FilterKernel, FilterParam, ParamDescriptor, ParameterInfo, RenderError, Smoothing,
};

use crate::bus::{AudioFormat, BusDirection, BusFormatAdapter, HostBufferList};
use crate::error::{FormatError, UnitError};
use crate::presets::{CurrentPreset, FactoryPreset, UserPreset};
use crate::shared::{ParameterState, UnitShared};
use crate::view::{self, ViewConfiguration, ViewListener};

/// Default largest block the host may render.
pub const DEFAULT_MAXIMUM_FRAMES: usize = 512;

/// Resonant low-pass audio unit.
///
/// # Example
///
/// ```rust
/// use filtro_core::FilterParam;
/// use filtro_unit::{AudioFormat, FilterUnit, HostBufferList};
///
/// let mut unit = FilterUnit::with_format(AudioFormat::planar(48000.0, 1));
/// unit.set_parameter(FilterParam::Cutoff, 500.0);
/// unit.allocate_render_resources()?;
///
/// let mut samples = vec![0.5f32; 256];
/// let mut channels: [&mut [f32]; 1] = [&mut samples];
/// unit.render(
///     &mut HostBufferList::Planar(&mut channels),
///     &mut HostBufferList::Empty,
///     256,
/// )?;
/// assert_eq!(unit.parameter_display_string(FilterParam::Cutoff), "500 Hz");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct FilterUnit {
    shared: UnitShared,
    kernel: FilterKernel,
    adapter: BusFormatAdapter,
    maximum_frames_to_render: usize,
}

impl FilterUnit {
    /// Unit with 44.1 kHz stereo planar buses.
    pub fn new() -> Self {
        Self::with_format(AudioFormat::default())
    }

    /// Unit with `format` on both buses.
    pub fn with_format(format: AudioFormat) -> Self {
        Self::with_shared(UnitShared::new(None), format)
    }

    /// Unit driven by an existing shared handle (for example one carrying a
    /// host notification callback).
    pub fn with_shared(shared: UnitShared, format: AudioFormat) -> Self {
        let kernel = FilterKernel::new(Arc::clone(shared.params()));
        Self {
            shared,
            kernel,
            adapter: BusFormatAdapter::new(format),
            maximum_frames_to_render: DEFAULT_MAXIMUM_FRAMES,
        }
    }

    /// Control-side handle, cloneable across threads.
    pub fn shared(&self) -> &UnitShared {
        &self.shared
    }

    /// Render kernel (read-only, for inspection).
    pub fn kernel(&self) -> &FilterKernel {
        &self.kernel
    }

    // ── Render resources ───────────────────────────────────────────────────

    /// Validate bus formats and allocate render resources.
    pub fn allocate_render_resources(&mut self) -> Result<(), UnitError> {
        match self
            .adapter
            .allocate(&mut self.kernel, self.maximum_frames_to_render)
        {
            Ok(()) => {
                let format = self.adapter.format(BusDirection::Output);
                tracing::info!(
                    channels = format.channel_count,
                    sample_rate = format.sample_rate,
                    max_frames = self.maximum_frames_to_render,
                    "render resources allocated"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!("render resource allocation failed: {err}");
                Err(err)
            }
        }
    }

    /// Release render resources. Idempotent.
    pub fn deallocate_render_resources(&mut self) {
        if self.kernel.is_allocated() {
            tracing::info!("render resources deallocated");
        }
        self.adapter.deallocate(&mut self.kernel);
    }

    /// Whether render resources are allocated.
    pub fn render_resources_allocated(&self) -> bool {
        self.kernel.is_allocated()
    }

    /// Clear filter history (transport restart, host flush).
    pub fn reset(&mut self) {
        self.kernel.reset();
    }

    /// Render one block. Real-time safe.
    ///
    /// Pass [`HostBufferList::Empty`] as `output` to render in place.
    pub fn render(
        &mut self,
        input: &mut HostBufferList<'_, '_>,
        output: &mut HostBufferList<'_, '_>,
        frames: usize,
    ) -> Result<(), RenderError> {
        self.adapter.render(&mut self.kernel, input, output, frames)
    }

    /// Largest block the host may render.
    pub fn maximum_frames_to_render(&self) -> usize {
        self.maximum_frames_to_render
    }

    /// Change the largest block size.
    ///
    /// Ignored while render resources are allocated; the value applies at
    /// the next allocation.
    pub fn set_maximum_frames_to_render(&mut self, frames: usize) {
        if self.render_resources_allocated() {
            tracing::debug!(frames, "maximum frames change ignored while allocated");
            return;
        }
        self.maximum_frames_to_render = frames;
    }

    /// The unit can render into its input buffers.
    pub fn can_process_in_place(&self) -> bool {
        true
    }

    /// Bus format in one direction.
    pub fn bus_format(&self, direction: BusDirection) -> AudioFormat {
        self.adapter.format(direction)
    }

    /// Change a bus format. Refused while render resources are allocated.
    pub fn set_bus_format(
        &mut self,
        direction: BusDirection,
        format: AudioFormat,
    ) -> Result<(), FormatError> {
        if self.render_resources_allocated() {
            return Err(FormatError::BusFormatLocked);
        }
        self.adapter.set_format(direction, format);
        Ok(())
    }

    /// Select ramp shape and time for parameter smoothing.
    pub fn set_smoothing(&mut self, smoothing: Smoothing, time_ms: f32) {
        self.kernel.set_smoothing(smoothing, time_ms);
    }

    /// Bypass processing (output = input).
    pub fn set_bypass(&self, bypassed: bool) {
        self.shared.set_bypassed(bypassed);
    }

    /// Whether processing is bypassed.
    pub fn bypass(&self) -> bool {
        self.shared.is_bypassed()
    }

    // ── Parameters ──────────────────────────────────────────────────────────

    /// Set a parameter target, clamped to its range.
    pub fn set_parameter(&self, param: FilterParam, value: f32) {
        self.shared.set_parameter(param, value);
    }

    /// Current target of a parameter.
    pub fn parameter(&self, param: FilterParam) -> f32 {
        self.shared.parameter(param)
    }

    /// Display string for a parameter's current value.
    pub fn parameter_display_string(&self, param: FilterParam) -> String {
        self.shared.parameter_display_string(param)
    }

    /// Parse display text for a parameter.
    pub fn parse_parameter(&self, param: FilterParam, text: &str) -> Option<f32> {
        self.shared.parse_parameter(param, text)
    }

    // ── State & presets ─────────────────────────────────────────────────────

    /// Snapshot of every parameter, keyed by string id.
    pub fn get_state(&self) -> ParameterState {
        self.shared.get_state()
    }

    /// Restore a snapshot. Unknown keys are ignored; values are clamped.
    pub fn set_state(&self, state: &ParameterState) {
        self.shared.set_state(state);
    }

    /// Built-in presets.
    pub fn factory_presets(&self) -> &'static [FactoryPreset] {
        self.shared.factory_presets()
    }

    /// The preset most recently applied.
    pub fn current_preset(&self) -> Option<CurrentPreset> {
        self.shared.current_preset()
    }

    /// Apply factory preset `number`.
    pub fn set_current_preset(&self, number: usize) -> Option<FactoryPreset> {
        self.shared.set_current_preset(number)
    }

    /// Capture the current values as a user preset.
    pub fn user_preset(&self, name: &str) -> UserPreset {
        self.shared.user_preset(name)
    }

    /// Apply a user preset.
    pub fn apply_user_preset(&self, preset: &UserPreset) {
        self.shared.apply_user_preset(preset);
    }

    /// User presets are supported.
    pub fn supports_user_presets(&self) -> bool {
        self.shared.supports_user_presets()
    }

    // ── View ────────────────────────────────────────────────────────────────

    /// Whether an editor of this size can be shown.
    pub fn supports_view_size(&self, width: f64, height: f64) -> bool {
        view::supports_view_size(width, height)
    }

    /// Indices of supported entries in `available`.
    pub fn supported_view_configurations(&self, available: &[ViewConfiguration]) -> Vec<usize> {
        view::supported_view_configurations(available)
    }

    /// Forward the host's chosen configuration to the view listener.
    pub fn select_view_configuration(&self, config: ViewConfiguration) -> bool {
        self.shared.select_view_configuration(config)
    }

    /// Register the receiver for view selections.
    pub fn set_view_listener(&self, listener: Box<dyn ViewListener>) {
        self.shared.set_view_listener(listener);
    }
}

impl Default for FilterUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterInfo for FilterUnit {
    fn param_count(&self) -> usize {
        self.shared.param_count()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        self.shared.descriptor(index).copied()
    }

    fn get_param(&self, index: usize) -> f32 {
        self.shared.get_value(index).unwrap_or(0.0)
    }

    fn set_param(&mut self, index: usize, value: f32) {
        self.shared.set_value(index, value);
    }
}
