//! Thread-safe shared state for the filter unit.
//!
//! `UnitShared` lives for the lifetime of the unit and is reachable from every
//! control thread (parameters, state, presets, view negotiation) while the
//! render side reads the same parameter targets through the kernel. Values
//! cross to the render thread only through the lock-free targets in
//! [`FilterParams`]; everything behind the mutex is control-only.

use std::collections::BTreeMap;
use std::sync::Arc;

use filtro_core::{FilterParam, FilterParams, ParamDescriptor};
use parking_lot::Mutex;

use crate::presets::{CurrentPreset, FACTORY_PRESETS, FactoryPreset, UserPreset, factory_preset};
use crate::view::{ViewConfiguration, ViewListener};

/// Parameter snapshot keyed by string id (`"cutoff"`, `"resonance"`).
pub type ParameterState = BTreeMap<String, f32>;

/// Control-only state. Never locked from the render thread.
#[derive(Default)]
struct ControlState {
    current_preset: Option<CurrentPreset>,
    view_listener: Option<Box<dyn ViewListener>>,
}

/// Inner storage, behind an `Arc` so `UnitShared` clones cheaply into
/// editor or host closures.
struct UnitSharedData {
    params: Arc<FilterParams>,
    descriptors: [ParamDescriptor; 2],
    control: Mutex<ControlState>,
    /// Called after control-side parameter changes (preset, state restore,
    /// direct writes) so the host can refresh its view of the values.
    host_notify: Option<Box<dyn Fn() + Send + Sync>>,
}

/// Shared state accessible from all control threads.
#[derive(Clone)]
pub struct UnitShared {
    inner: Arc<UnitSharedData>,
}

impl std::fmt::Debug for UnitShared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitShared")
            .field("params", &self.inner.params)
            .field("current_preset", &self.current_preset())
            .finish_non_exhaustive()
    }
}

impl UnitShared {
    /// Create shared state with parameters at their defaults.
    ///
    /// `host_notify` is invoked after every control-side parameter change.
    /// Pass `None` for standalone or test use.
    pub fn new(host_notify: Option<Box<dyn Fn() + Send + Sync>>) -> Self {
        Self {
            inner: Arc::new(UnitSharedData {
                params: Arc::new(FilterParams::new()),
                descriptors: FilterParam::ALL.map(FilterParam::descriptor),
                control: Mutex::new(ControlState::default()),
                host_notify,
            }),
        }
    }

    /// Atomic parameter block shared with the render kernel.
    pub fn params(&self) -> &Arc<FilterParams> {
        &self.inner.params
    }

    /// Number of parameters.
    pub fn param_count(&self) -> usize {
        self.inner.descriptors.len()
    }

    /// Get parameter descriptor by index.
    pub fn descriptor(&self, index: usize) -> Option<&ParamDescriptor> {
        self.inner.descriptors.get(index)
    }

    /// All parameter descriptors.
    pub fn descriptors(&self) -> &[ParamDescriptor] {
        &self.inner.descriptors
    }

    /// Find parameter index by stable `ParamId`.
    pub fn index_by_id(&self, id: u32) -> Option<usize> {
        self.inner.descriptors.iter().position(|d| d.id.0 == id)
    }

    /// Read a parameter target by index (lock-free).
    pub fn get_value(&self, index: usize) -> Option<f32> {
        FilterParam::from_index(index).map(|p| self.parameter(p))
    }

    /// Write a parameter target by index (lock-free). Clamps to the range;
    /// out-of-range indices are ignored.
    pub fn set_value(&self, index: usize, value: f32) {
        if let Some(param) = FilterParam::from_index(index) {
            self.set_parameter(param, value);
        }
    }

    /// Current target of `param`.
    pub fn parameter(&self, param: FilterParam) -> f32 {
        self.inner.params.get(param)
    }

    /// Set the target of `param`, clamped to its range.
    pub fn set_parameter(&self, param: FilterParam, value: f32) {
        self.inner.params.set(param, value);
        self.notify_host();
    }

    /// Display string for the current value (`"1000 Hz"`, `"0.71"`).
    pub fn parameter_display_string(&self, param: FilterParam) -> String {
        param.descriptor().format_value(self.parameter(param))
    }

    /// Parse display text for `param` into a clamped value.
    pub fn parse_parameter(&self, param: FilterParam, text: &str) -> Option<f32> {
        param.descriptor().parse_value(text)
    }

    /// Whether processing is bypassed.
    pub fn is_bypassed(&self) -> bool {
        self.inner.params.is_bypassed()
    }

    /// Set the bypass state.
    pub fn set_bypassed(&self, bypassed: bool) {
        self.inner.params.set_bypassed(bypassed);
    }

    /// Notify the host that control-side changes are pending.
    ///
    /// No-op if no callback is set.
    pub fn notify_host(&self) {
        if let Some(cb) = &self.inner.host_notify {
            cb();
        }
    }

    // ── State ───────────────────────────────────────────────────────────────

    /// Snapshot every parameter target, keyed by string id.
    pub fn get_state(&self) -> ParameterState {
        FilterParam::ALL
            .into_iter()
            .map(|p| (p.descriptor().string_id.to_owned(), self.parameter(p)))
            .collect()
    }

    /// Restore parameter targets from a snapshot.
    ///
    /// Unknown keys are ignored and values are clamped, so
    /// `set_state(&get_state())` is always a no-op.
    pub fn set_state(&self, state: &ParameterState) {
        for (key, &value) in state {
            if let Some(param) = FilterParam::from_string_id(key) {
                self.inner.params.set(param, value);
            }
        }
        self.notify_host();
    }

    /// Snapshot as JSON bytes.
    pub fn state_to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.get_state())
    }

    /// Restore from JSON bytes produced by [`state_to_json`](Self::state_to_json).
    pub fn state_from_json(&self, bytes: &[u8]) -> Result<(), serde_json::Error> {
        let state: ParameterState = serde_json::from_slice(bytes)?;
        self.set_state(&state);
        Ok(())
    }

    // ── Presets ─────────────────────────────────────────────────────────────

    /// Built-in presets.
    pub fn factory_presets(&self) -> &'static [FactoryPreset] {
        &FACTORY_PRESETS
    }

    /// The preset most recently applied, if any.
    pub fn current_preset(&self) -> Option<CurrentPreset> {
        self.inner.control.lock().current_preset.clone()
    }

    /// Apply factory preset `number`. Returns the preset, or `None` (and
    /// changes nothing) if no such preset exists.
    pub fn set_current_preset(&self, number: usize) -> Option<FactoryPreset> {
        let preset = *factory_preset(number)?;
        self.inner.params.set(FilterParam::Cutoff, preset.cutoff);
        self.inner.params.set(FilterParam::Resonance, preset.resonance);
        self.inner.control.lock().current_preset = Some(CurrentPreset::Factory(preset));
        tracing::debug!(number, name = preset.name, "factory preset applied");
        self.notify_host();
        Some(preset)
    }

    /// Capture the current values as a named user preset.
    pub fn user_preset(&self, name: &str) -> UserPreset {
        UserPreset {
            name: name.to_owned(),
            state: self.get_state(),
        }
    }

    /// Apply a user preset and make it current.
    pub fn apply_user_preset(&self, preset: &UserPreset) {
        self.set_state(&preset.state);
        self.inner.control.lock().current_preset = Some(CurrentPreset::User(preset.name.clone()));
        tracing::debug!(name = %preset.name, "user preset applied");
    }

    /// User presets are supported.
    pub fn supports_user_presets(&self) -> bool {
        true
    }

    // ── View ────────────────────────────────────────────────────────────────

    /// Register the receiver for host view selections, replacing any
    /// previous one.
    pub fn set_view_listener(&self, listener: Box<dyn ViewListener>) {
        self.inner.control.lock().view_listener = Some(listener);
    }

    /// Remove the view listener.
    pub fn clear_view_listener(&self) {
        self.inner.control.lock().view_listener = None;
    }

    /// Forward the host's chosen configuration to the listener.
    ///
    /// Returns `false` if no listener is registered. The listener runs
    /// without the control lock held, so it may call back into the unit.
    pub fn select_view_configuration(&self, config: ViewConfiguration) -> bool {
        tracing::debug!(
            width = config.width,
            height = config.height,
            "view configuration selected"
        );
        let Some(mut listener) = self.inner.control.lock().view_listener.take() else {
            return false;
        };
        listener.view_configuration_selected(config);

        let mut control = self.inner.control.lock();
        // Keep a listener registered during the callback.
        if control.view_listener.is_none() {
            control.view_listener = Some(listener);
        }
        true
    }
}

impl Default for UnitShared {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn shared_new_creates_all_params() {
        let shared = UnitShared::new(None);
        assert_eq!(shared.param_count(), 2);
        assert_eq!(shared.descriptor(0).unwrap().string_id, "cutoff");
        assert_eq!(shared.descriptor(1).unwrap().string_id, "resonance");
    }

    #[test]
    fn shared_defaults_match_descriptors() {
        let shared = UnitShared::new(None);
        for (i, desc) in shared.descriptors().iter().enumerate() {
            let val = shared.get_value(i).unwrap();
            assert_eq!(
                val, desc.default,
                "param {i} ({}) default mismatch: got {val}, expected {}",
                desc.name, desc.default
            );
        }
    }

    #[test]
    fn shared_set_value_clamps() {
        let shared = UnitShared::new(None);
        let desc = *shared.descriptor(0).unwrap();

        shared.set_value(0, desc.max + 100.0);
        assert_eq!(shared.get_value(0).unwrap(), desc.max);

        shared.set_value(0, desc.min - 100.0);
        assert_eq!(shared.get_value(0).unwrap(), desc.min);
    }

    #[test]
    fn shared_index_by_id_finds_params() {
        let shared = UnitShared::new(None);
        assert_eq!(shared.index_by_id(0), Some(0));
        assert_eq!(shared.index_by_id(1), Some(1));
        assert_eq!(shared.index_by_id(999), None);
    }

    #[test]
    fn shared_out_of_range_safe() {
        let shared = UnitShared::new(None);
        assert_eq!(shared.get_value(999), None);
        assert_eq!(shared.descriptor(999), None);
        // Should not panic.
        shared.set_value(999, 1.0);
    }

    #[test]
    fn display_strings() {
        let shared = UnitShared::new(None);
        assert_eq!(shared.parameter_display_string(FilterParam::Cutoff), "1000 Hz");
        assert_eq!(shared.parameter_display_string(FilterParam::Resonance), "0.71");
        assert_eq!(shared.parse_parameter(FilterParam::Cutoff, "2k"), Some(2000.0));
    }

    #[test]
    fn set_state_ignores_unknown_keys() {
        let shared = UnitShared::new(None);
        let mut state = ParameterState::new();
        state.insert("gain".to_owned(), 3.0);
        state.insert("resonance".to_owned(), 100.0);
        shared.set_state(&state);
        assert_eq!(shared.parameter(FilterParam::Resonance), 20.0);
        assert_eq!(shared.parameter(FilterParam::Cutoff), 1000.0);
    }

    #[test]
    fn factory_preset_applies_values() {
        let shared = UnitShared::new(None);
        let preset = shared.set_current_preset(2).unwrap();
        assert_eq!(preset.name, "Warm");
        assert_eq!(shared.parameter(FilterParam::Cutoff), 384.0);
        assert_eq!(shared.parameter(FilterParam::Resonance), 0.5);
        assert_eq!(shared.current_preset(), Some(CurrentPreset::Factory(preset)));

        assert!(shared.set_current_preset(7).is_none());
        assert_eq!(shared.current_preset().unwrap().name(), "Warm");
    }

    #[test]
    fn user_preset_roundtrip() {
        let shared = UnitShared::new(None);
        shared.set_parameter(FilterParam::Cutoff, 640.0);
        let preset = shared.user_preset("Muffled");

        shared.set_current_preset(1);
        shared.apply_user_preset(&preset);
        assert_eq!(shared.parameter(FilterParam::Cutoff), 640.0);
        assert_eq!(shared.current_preset().unwrap().name(), "Muffled");
    }

    #[test]
    fn host_notified_on_changes() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let shared = UnitShared::new(Some(Box::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })));
        shared.set_parameter(FilterParam::Cutoff, 500.0);
        shared.set_current_preset(0);
        shared.set_state(&shared.get_state());
        assert_eq!(count.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn view_selection_reaches_listener() {
        let shared = UnitShared::new(None);
        assert!(!shared.select_view_configuration(crate::view::COMPACT));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        shared.set_view_listener(Box::new(move |config: ViewConfiguration| {
            sink.lock().push(config);
        }));
        assert!(shared.select_view_configuration(crate::view::EXPANDED));
        assert_eq!(seen.lock().as_slice(), &[crate::view::EXPANDED]);

        shared.clear_view_listener();
        assert!(!shared.select_view_configuration(crate::view::COMPACT));
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn state_json_roundtrip() {
        let shared = UnitShared::new(None);
        shared.set_parameter(FilterParam::Cutoff, 12345.0);
        shared.set_parameter(FilterParam::Resonance, 7.5);
        let json = shared.state_to_json().unwrap();

        let restored = UnitShared::new(None);
        restored.state_from_json(&json).unwrap();
        assert_eq!(restored.get_state(), shared.get_state());
    }
}
