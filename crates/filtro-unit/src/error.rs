//! Error types for the host-facing unit.

use filtro_core::ConfigurationError;
use thiserror::Error;

/// Bus format problems detected before render resources are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FormatError {
    /// Input and output buses carry different channel counts.
    #[error("input bus has {input} channels but output bus has {output}")]
    ChannelMismatch {
        /// Input bus channel count.
        input: usize,
        /// Output bus channel count.
        output: usize,
    },

    /// Input and output buses run at different sample rates.
    #[error("input bus runs at {input} Hz but output bus at {output} Hz")]
    SampleRateMismatch {
        /// Input bus sample rate.
        input: f32,
        /// Output bus sample rate.
        output: f32,
    },

    /// A bus has zero channels.
    #[error("bus format has no channels")]
    NoChannels,

    /// Bus formats cannot change while render resources are allocated.
    #[error("bus format cannot change while render resources are allocated")]
    BusFormatLocked,
}

/// Errors surfaced by [`FilterUnit`](crate::FilterUnit) control operations.
#[derive(Debug, Error)]
pub enum UnitError {
    /// Bus formats are incompatible.
    #[error("bus format error: {0}")]
    Format(#[from] FormatError),

    /// The kernel rejected the render configuration.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Serialized state or preset data could not be read or written.
    #[error("state serialization error: {0}")]
    State(#[from] serde_json::Error),
}
