//! Non-owning per-channel views for one render call.

use crate::error::RenderError;

/// Mutable, planar view of one block of audio.
///
/// Wraps the caller's channel buffers for the duration of a single render
/// call; the kernel never keeps it. Construction checks that every channel
/// holds at least `frames` samples, so the per-sample loop can index without
/// further checks.
///
/// `B` is anything that derefs to a sample slice: `Vec<f32>`, `&mut [f32]`,
/// or a host buffer type implementing `AsMut<[f32]>`.
#[derive(Debug)]
pub struct AudioBlock<'a, B> {
    channels: &'a mut [B],
    frames: usize,
}

impl<'a, B: AsMut<[f32]>> AudioBlock<'a, B> {
    /// Wrap `channels`, validating that each holds `frames` samples.
    pub fn new(channels: &'a mut [B], frames: usize) -> Result<Self, RenderError> {
        for (channel, buf) in channels.iter_mut().enumerate() {
            let len = buf.as_mut().len();
            if len < frames {
                return Err(RenderError::BufferTooShort {
                    channel,
                    len,
                    frames,
                });
            }
        }
        Ok(Self { channels, frames })
    }

    /// Number of frames in the block.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of channels in the block.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// The sample slice of one channel, trimmed to the block length.
    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        let frames = self.frames;
        self.channels
            .get_mut(index)
            .map(|buf| &mut buf.as_mut()[..frames])
    }

    /// All channel buffers. Each holds at least [`frames`](Self::frames)
    /// samples.
    pub(crate) fn channels_mut(&mut self) -> &mut [B] {
        self.channels
    }
}
