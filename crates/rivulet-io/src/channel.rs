//! Multi-channel source and sink traits, with in-memory implementations.

use rivulet_core::{Error as GraphError, SampleBuffer};

use crate::{Result, check_block};

/// A producer of multi-channel audio, delivered split by channel.
///
/// Each call to [`read`](ChannelSource::read) returns one buffer per channel,
/// all of the same length. Fewer frames than requested means the source is
/// about to end; `None` means it has ended.
pub trait ChannelSource {
    /// Number of channels in every block.
    fn channels(&self) -> usize;

    /// Sample rate in Hz.
    fn sample_rate(&self) -> f64;

    /// Reads up to `frames` frames.
    fn read(&mut self, frames: usize) -> Result<Option<Vec<SampleBuffer>>>;
}

/// A consumer of split-by-channel audio.
pub trait ChannelSink {
    /// Number of channels every write must supply.
    fn channels(&self) -> usize;

    /// Writes one block and returns the number of frames written.
    ///
    /// A block with the wrong number of channels fails with
    /// `ChannelCountMismatch`; channels of unequal length fail with
    /// `BufferSizeMismatch`.
    fn write(&mut self, block: &[SampleBuffer]) -> Result<usize>;

    /// Pushes buffered output to its destination.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Plays back a set of in-memory channels once.
#[derive(Debug, Clone)]
pub struct MemorySource {
    channels: Vec<SampleBuffer>,
    sample_rate: f64,
    position: usize,
}

impl MemorySource {
    /// Creates a source from per-channel buffers of equal length.
    pub fn new(channels: Vec<SampleBuffer>, sample_rate: f64) -> Result<Self> {
        let count = channels.len();
        check_block(count, &channels)?;
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(GraphError::InvalidSampleRate(sample_rate).into());
        }
        Ok(Self {
            channels,
            sample_rate,
            position: 0,
        })
    }

    /// Frames not yet read.
    pub fn remaining(&self) -> usize {
        self.channels
            .first()
            .map_or(0, |c| c.len() - self.position)
    }
}

impl ChannelSource for MemorySource {
    fn channels(&self) -> usize {
        self.channels.len()
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn read(&mut self, frames: usize) -> Result<Option<Vec<SampleBuffer>>> {
        let n = frames.min(self.remaining());
        if n == 0 {
            return Ok(None);
        }
        let range = self.position..self.position + n;
        self.position += n;
        Ok(Some(
            self.channels.iter().map(|c| c.slice(range.clone())).collect(),
        ))
    }
}

/// Collects every block written to it.
#[derive(Debug, Clone)]
pub struct MemorySink {
    channels: Vec<SampleBuffer>,
}

impl MemorySink {
    /// Creates an empty sink expecting `channels` channels.
    pub fn new(channels: usize) -> Self {
        Self {
            channels: (0..channels).map(|_| SampleBuffer::default()).collect(),
        }
    }

    /// Everything written to channel `index` so far.
    pub fn channel(&self, index: usize) -> Option<&SampleBuffer> {
        self.channels.get(index)
    }

    /// Frames written so far.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, SampleBuffer::len)
    }

    /// Consumes the sink, returning the collected channels.
    pub fn into_channels(self) -> Vec<SampleBuffer> {
        self.channels
    }
}

impl ChannelSink for MemorySink {
    fn channels(&self) -> usize {
        self.channels.len()
    }

    fn write(&mut self, block: &[SampleBuffer]) -> Result<usize> {
        let frames = check_block(self.channels.len(), block)?;
        for (dst, src) in self.channels.iter_mut().zip(block) {
            dst.extend_from(src);
        }
        Ok(frames)
    }
}
