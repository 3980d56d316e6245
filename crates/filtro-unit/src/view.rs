//! View-configuration negotiation.
//!
//! The unit has two editor layouts: a compact strip (400×100) and an
//! expanded panel (800×500). Hosts offer a list of candidate sizes; the unit
//! accepts anything that fits inside the compact layout, anything that can
//! hold the expanded layout, and the 0×0 "host default" sentinel. Sizes in
//! between are rejected.
//!
//! When the host picks a configuration it is forwarded to whichever
//! [`ViewListener`] the editor registered with the unit.

/// A host-offered editor size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewConfiguration {
    /// Width in points.
    pub width: f64,
    /// Height in points.
    pub height: f64,
    /// Whether the host shows its own controller alongside the view.
    pub host_has_controller: bool,
}

impl ViewConfiguration {
    /// Configuration without a host controller.
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            host_has_controller: false,
        }
    }
}

/// Compact editor layout.
pub const COMPACT: ViewConfiguration = ViewConfiguration::new(400.0, 100.0);

/// Expanded editor layout.
pub const EXPANDED: ViewConfiguration = ViewConfiguration::new(800.0, 500.0);

/// Editor layout that should be shown for a selected configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewLayout {
    /// Cutoff and resonance sliders only.
    Compact,
    /// Full panel with the response curve.
    Expanded,
}

impl ViewLayout {
    /// Pick the layout for a host-selected configuration.
    ///
    /// The expanded layout is used whenever it fits; everything else
    /// falls back to the compact strip.
    pub fn for_configuration(config: &ViewConfiguration) -> Self {
        if config.width >= EXPANDED.width && config.height >= EXPANDED.height {
            ViewLayout::Expanded
        } else {
            ViewLayout::Compact
        }
    }
}

/// Whether the unit can present an editor at `width`×`height`.
pub fn supports_view_size(width: f64, height: f64) -> bool {
    let fits_compact = width <= COMPACT.width && height <= COMPACT.height;
    let holds_expanded = width >= EXPANDED.width && height >= EXPANDED.height;
    let host_default = width == 0.0 && height == 0.0;
    fits_compact || holds_expanded || host_default
}

/// Indices of the supported entries in `available`.
pub fn supported_view_configurations(available: &[ViewConfiguration]) -> Vec<usize> {
    available
        .iter()
        .enumerate()
        .filter(|(_, config)| supports_view_size(config.width, config.height))
        .map(|(index, _)| index)
        .collect()
}

/// Receives the configuration chosen by the host.
///
/// Registered by the editor through
/// [`UnitShared::set_view_listener`](crate::UnitShared::set_view_listener).
/// Called on the control thread that performed the selection.
pub trait ViewListener: Send {
    /// The host selected `config`.
    fn view_configuration_selected(&mut self, config: ViewConfiguration);
}

impl<F> ViewListener for F
where
    F: FnMut(ViewConfiguration) + Send,
{
    fn view_configuration_selected(&mut self, config: ViewConfiguration) {
        self(config);
    }
}
