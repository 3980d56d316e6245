//! Bus formats and host buffer translation.
//!
//! Hosts describe each bus with an [`AudioFormat`] and hand render calls a
//! [`HostBufferList`] per direction. [`BusFormatAdapter`] checks that the two
//! buses agree before allocation and turns whatever layout the host passes
//! into the planar views the kernel renders.
//!
//! | Input | Output | Path |
//! |-------|--------|------|
//! | planar | planar | kernel out-of-place render |
//! | planar | empty | kernel in-place render |
//! | interleaved | planar | deinterleave into output, render in place |
//! | interleaved | interleaved / empty | deinterleave into scratch, render, interleave |
//! | planar | interleaved | render into scratch, interleave |

use filtro_core::{FilterKernel, RenderError, RenderSetup};

use crate::error::{FormatError, UnitError};

/// Sample layout of a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleLayout {
    /// One buffer per channel (non-interleaved f32).
    #[default]
    Planar,
    /// One buffer, frame-major (`L R L R ...`).
    Interleaved,
}

/// Format of one bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Number of channels.
    pub channel_count: usize,
    /// Sample layout.
    pub layout: SampleLayout,
}

impl AudioFormat {
    /// Planar f32 format.
    pub const fn planar(sample_rate: f32, channel_count: usize) -> Self {
        Self {
            sample_rate,
            channel_count,
            layout: SampleLayout::Planar,
        }
    }

    /// Interleaved f32 format.
    pub const fn interleaved(sample_rate: f32, channel_count: usize) -> Self {
        Self {
            sample_rate,
            channel_count,
            layout: SampleLayout::Interleaved,
        }
    }
}

impl Default for AudioFormat {
    /// 44.1 kHz stereo planar.
    fn default() -> Self {
        Self::planar(44100.0, 2)
    }
}

/// Bus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusDirection {
    /// Host to unit.
    Input,
    /// Unit to host.
    Output,
}

/// Audio handed over by the host for one render call.
///
/// Borrowed for the duration of the call only.
#[derive(Debug)]
pub enum HostBufferList<'a, 'b> {
    /// No data. As the output list this means "render in place into the
    /// input buffers".
    Empty,
    /// One slice per channel.
    Planar(&'b mut [&'a mut [f32]]),
    /// All channels in one slice, frame-major.
    Interleaved(&'a mut [f32]),
}

/// Validates bus formats and translates host buffers for the kernel.
#[derive(Debug, Default)]
pub struct BusFormatAdapter {
    input: AudioFormat,
    output: AudioFormat,
    /// Planar working buffers for interleaved paths, `channels × max_frames`
    scratch: Vec<Vec<f32>>,
}

impl BusFormatAdapter {
    /// Adapter with the same format on both buses.
    pub fn new(format: AudioFormat) -> Self {
        Self {
            input: format,
            output: format,
            scratch: Vec::new(),
        }
    }

    /// Format of one bus.
    pub fn format(&self, direction: BusDirection) -> AudioFormat {
        match direction {
            BusDirection::Input => self.input,
            BusDirection::Output => self.output,
        }
    }

    /// Replace the format of one bus. Takes effect at the next allocation.
    pub fn set_format(&mut self, direction: BusDirection, format: AudioFormat) {
        match direction {
            BusDirection::Input => self.input = format,
            BusDirection::Output => self.output = format,
        }
    }

    /// Check that the buses can be rendered N channels to N channels.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.input.channel_count != self.output.channel_count {
            return Err(FormatError::ChannelMismatch {
                input: self.input.channel_count,
                output: self.output.channel_count,
            });
        }
        if self.output.channel_count == 0 {
            return Err(FormatError::NoChannels);
        }
        if self.input.sample_rate != self.output.sample_rate {
            return Err(FormatError::SampleRateMismatch {
                input: self.input.sample_rate,
                output: self.output.sample_rate,
            });
        }
        Ok(())
    }

    /// Whether either bus is interleaved.
    pub fn needs_scratch(&self) -> bool {
        self.input.layout == SampleLayout::Interleaved
            || self.output.layout == SampleLayout::Interleaved
    }

    /// Validate the buses and allocate the kernel (and scratch, for
    /// interleaved layouts).
    ///
    /// On any failure neither the kernel nor the adapter holds resources.
    pub fn allocate(
        &mut self,
        kernel: &mut FilterKernel,
        max_frames: usize,
    ) -> Result<(), UnitError> {
        if let Err(err) = self.validate() {
            self.deallocate(kernel);
            return Err(err.into());
        }
        let setup = RenderSetup {
            input_channels: self.input.channel_count,
            output_channels: self.output.channel_count,
            max_frames,
            sample_rate: self.output.sample_rate,
        };
        if let Err(err) = kernel.allocate_render_resources(setup) {
            self.scratch = Vec::new();
            return Err(err.into());
        }

        self.scratch = if self.needs_scratch() {
            vec![vec![0.0; max_frames]; self.output.channel_count]
        } else {
            Vec::new()
        };
        Ok(())
    }

    /// Release kernel and scratch resources.
    pub fn deallocate(&mut self, kernel: &mut FilterKernel) {
        kernel.deallocate_render_resources();
        self.scratch = Vec::new();
    }

    /// Render one host block.
    ///
    /// Every request check runs before any sample is written.
    pub fn render(
        &mut self,
        kernel: &mut FilterKernel,
        input: &mut HostBufferList<'_, '_>,
        output: &mut HostBufferList<'_, '_>,
        frames: usize,
    ) -> Result<(), RenderError> {
        let channels = kernel.channel_count();
        match (input, output) {
            (HostBufferList::Empty, _) => Err(RenderError::NoInputBuffers),

            (HostBufferList::Planar(input), HostBufferList::Planar(output)) => {
                kernel.render(&**input, &mut **output, frames)
            }

            (HostBufferList::Planar(buffers), HostBufferList::Empty) => {
                kernel.render_in_place(&mut **buffers, frames)
            }

            (HostBufferList::Interleaved(input), HostBufferList::Planar(output)) => {
                kernel.validate_render(output.len(), frames)?;
                check_interleaved(input, channels, frames)?;
                check_planar(output, frames)?;
                deinterleave(input, &mut **output, frames);
                kernel.render_in_place(&mut **output, frames)
            }

            (HostBufferList::Interleaved(input), HostBufferList::Empty) => {
                kernel.validate_render(channels, frames)?;
                check_interleaved(input, channels, frames)?;
                self.check_scratch(channels)?;
                deinterleave(input, &mut self.scratch, frames);
                kernel.render_in_place(&mut self.scratch, frames)?;
                interleave(&self.scratch, &mut **input, frames);
                Ok(())
            }

            (HostBufferList::Interleaved(input), HostBufferList::Interleaved(output)) => {
                kernel.validate_render(channels, frames)?;
                check_interleaved(input, channels, frames)?;
                check_interleaved(output, channels, frames)?;
                self.check_scratch(channels)?;
                deinterleave(input, &mut self.scratch, frames);
                kernel.render_in_place(&mut self.scratch, frames)?;
                interleave(&self.scratch, &mut **output, frames);
                Ok(())
            }

            (HostBufferList::Planar(input), HostBufferList::Interleaved(output)) => {
                kernel.validate_render(input.len(), frames)?;
                check_interleaved(output, channels, frames)?;
                self.check_scratch(channels)?;
                kernel.render(&**input, &mut self.scratch, frames)?;
                interleave(&self.scratch, &mut **output, frames);
                Ok(())
            }
        }
    }

    fn check_scratch(&self, channels: usize) -> Result<(), RenderError> {
        if self.scratch.len() == channels {
            Ok(())
        } else {
            Err(RenderError::LayoutMismatch)
        }
    }
}

fn check_interleaved(buffer: &[f32], channels: usize, frames: usize) -> Result<(), RenderError> {
    if buffer.len() < channels * frames {
        return Err(RenderError::BufferTooShort {
            channel: 0,
            len: buffer.len() / channels.max(1),
            frames,
        });
    }
    Ok(())
}

fn check_planar(buffers: &[&mut [f32]], frames: usize) -> Result<(), RenderError> {
    for (channel, buf) in buffers.iter().enumerate() {
        if buf.len() < frames {
            return Err(RenderError::BufferTooShort {
                channel,
                len: buf.len(),
                frames,
            });
        }
    }
    Ok(())
}

/// Split frame-major samples into per-channel buffers.
fn deinterleave<B: AsMut<[f32]>>(interleaved: &[f32], planar: &mut [B], frames: usize) {
    let channels = planar.len();
    for (ch, buf) in planar.iter_mut().enumerate() {
        let buf = buf.as_mut();
        for (frame, sample) in buf[..frames].iter_mut().enumerate() {
            *sample = interleaved[frame * channels + ch];
        }
    }
}

/// Merge per-channel buffers into frame-major samples.
fn interleave<B: AsRef<[f32]>>(planar: &[B], interleaved: &mut [f32], frames: usize) {
    let channels = planar.len();
    for (ch, buf) in planar.iter().enumerate() {
        for (frame, &sample) in buf.as_ref()[..frames].iter().enumerate() {
            interleaved[frame * channels + ch] = sample;
        }
    }
}
