//! Error types for render-resource allocation and rendering.

use thiserror::Error;

/// Errors raised while allocating render resources.
///
/// Fatal to that allocation attempt. The kernel is left without any channel
/// state and must be allocated again before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigurationError {
    /// Input and output channel counts differ; the kernel only renders
    /// N channels to N channels.
    #[error("input has {input} channels but output has {output}")]
    ChannelMismatch {
        /// Requested input channel count.
        input: usize,
        /// Requested output channel count.
        output: usize,
    },

    /// Zero channels requested.
    #[error("channel count must be at least 1")]
    NoChannels,

    /// Sample rate is zero, negative or not finite.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f32),

    /// Maximum block size is zero.
    #[error("maximum frames to render must be at least 1")]
    InvalidMaxFrames,
}

/// Contract violations detected at the start of a render call.
///
/// A correctly wired host never triggers these. They are checked before any
/// sample is touched, so the output buffers are left unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Render called before resources were allocated.
    #[error("render resources are not allocated")]
    NotAllocated,

    /// Buffer list has a different channel count than was allocated.
    #[error("expected {expected} channels, got {actual}")]
    ChannelCountMismatch {
        /// Allocated channel count.
        expected: usize,
        /// Channel count supplied to render.
        actual: usize,
    },

    /// Block is larger than the allocated maximum.
    #[error("{frames} frames exceeds the maximum of {max}")]
    TooManyFrames {
        /// Requested frame count.
        frames: usize,
        /// Allocated maximum.
        max: usize,
    },

    /// A channel buffer holds fewer samples than the frame count.
    #[error("channel {channel} holds {len} samples, need {frames}")]
    BufferTooShort {
        /// Offending channel index.
        channel: usize,
        /// Buffer length.
        len: usize,
        /// Requested frame count.
        frames: usize,
    },

    /// The host supplied no input buffers.
    #[error("no input buffers supplied")]
    NoInputBuffers,

    /// The buffer layout needs scratch space the current allocation lacks.
    #[error("buffer layout does not match the allocated bus format")]
    LayoutMismatch,
}
