//! Host-facing audio unit adapter for the filtro resonant low-pass filter.
//!
//! This crate wraps the [`filtro_core`] kernel in the surface an audio-unit
//! style host expects: bus format negotiation, buffer-list translation,
//! parameter control with display strings, state snapshots, presets and
//! editor size negotiation. It has no dependency on any particular plugin
//! SDK; a host binding only needs to forward its callbacks here.
//!
//! # Architecture
//!
//! | Host concept | filtro |
//! |--------------|--------|
//! | Input/output bus formats | [`AudioFormat`], [`BusFormatAdapter`] |
//! | Audio buffer list | [`HostBufferList`] |
//! | Render block | [`FilterUnit::render`] |
//! | Parameter tree | [`UnitShared`], [`filtro_core::ParamDescriptor`] |
//! | Full state / presets | [`ParameterState`], [`FactoryPreset`], [`UserPreset`] |
//! | View configurations | [`ViewConfiguration`], [`ViewListener`] |
//!
//! # Threads
//!
//! [`FilterUnit`] itself is driven by `&mut self` from the host's setup and
//! render threads. [`UnitShared`] is `Clone + Send + Sync` and can be handed
//! to editors and automation threads; it only touches the kernel through
//! lock-free parameter targets.

pub mod bus;
pub mod error;
pub mod presets;
pub mod shared;
pub mod unit;
pub mod view;

pub use bus::{AudioFormat, BusDirection, BusFormatAdapter, HostBufferList, SampleLayout};
pub use error::{FormatError, UnitError};
pub use presets::{CurrentPreset, FACTORY_PRESETS, FactoryPreset, UserPreset, factory_preset};
pub use shared::{ParameterState, UnitShared};
pub use unit::{DEFAULT_MAXIMUM_FRAMES, FilterUnit};
pub use view::{
    COMPACT, EXPANDED, ViewConfiguration, ViewLayout, ViewListener, supported_view_configurations,
    supports_view_size,
};
