//! Filtro Core - real-time resonant low-pass filter
//!
//! This crate holds everything that runs on the audio thread, plus the
//! lock-free parameter plumbing that feeds it from control threads.
//!
//! # Core Abstractions
//!
//! ## Render Kernel
//!
//! - [`FilterKernel`] - Allocate/render/reset lifecycle over N planar channels
//! - [`FilterParams`] - Shared atomic control targets and the bypass flag
//! - [`AudioBlock`] - Validated non-owning view over one block of channels
//!
//! ## Parameter Smoothing
//!
//! Zipper-free parameter changes for click-free automation:
//!
//! - [`AtomicParam`] - Lock-free, clamped target shared with control threads
//! - [`SmoothedParam`] - Render-side ramp (exponential or linear)
//!
//! ## Filter
//!
//! - [`lowpass_coefficients`] - RBJ cookbook low-pass design with range clamping
//! - [`Coefficients`] - Normalized biquad coefficients and response evaluation
//! - [`ChannelState`] - Transposed direct form II registers for one channel
//!
//! ## Metadata
//!
//! - [`ParamDescriptor`] / [`ParameterInfo`] - Ranges, ids, display formatting
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use filtro_core::{FilterKernel, FilterParam, FilterParams, RenderSetup};
//!
//! let params = Arc::new(FilterParams::new());
//! let mut kernel = FilterKernel::new(Arc::clone(&params));
//! kernel.allocate_render_resources(RenderSetup::symmetric(1, 256, 44100.0))?;
//!
//! // Any thread may move the targets; the kernel ramps towards them.
//! params.set(FilterParam::Cutoff, 2500.0);
//! params.set(FilterParam::Resonance, 5.0);
//!
//! let mut input = vec![vec![0.0f32; 256]];
//! input[0][0] = 1.0;
//! let mut output = vec![vec![0.0f32; 256]];
//! kernel.render(&input, &mut output, 256)?;
//! assert!(output[0].iter().all(|s| s.is_finite()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations, locks or logging in render paths
//! - **Always stable**: Out-of-range controls are clamped, never rejected
//! - **Self-healing**: Non-finite samples never persist in filter state

pub mod biquad;
pub mod block;
pub mod error;
pub mod kernel;
pub mod math;
pub mod param;
pub mod param_info;

// Re-export main types at crate root
pub use biquad::{
    ChannelState, Coefficients, MAX_CUTOFF_RATIO, MAX_RESONANCE, MIN_CUTOFF_HZ, MIN_RESONANCE,
    clamp_cutoff, clamp_resonance, lowpass_coefficients,
};
pub use block::AudioBlock;
pub use error::{ConfigurationError, RenderError};
pub use kernel::{
    FilterKernel, FilterParam, FilterParams, KernelState, RECOMPUTE_THRESHOLD, RenderSetup,
};
pub use math::{flush_denormal, relative_delta};
pub use param::{AtomicParam, DEFAULT_SMOOTHING_MS, SmoothedParam, Smoothing};
pub use param_info::{ParamDescriptor, ParamId, ParamScale, ParamUnit, ParameterInfo};
