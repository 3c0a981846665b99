//! Multi-channel I/O for the rivulet signal graph.
//!
//! This crate provides:
//!
//! - **Channel traits**: [`ChannelSource`] and [`ChannelSink`] move blocks of
//!   same-length per-channel buffers in and out of a graph
//! - **WAV files**: [`WavSource`] and [`WavSink`] (via `hound`)
//! - **Memory**: [`MemorySource`] and [`MemorySink`] for tests and offline work
//! - **Graph glue**: [`split_channels`] turns a source into one node per
//!   channel, and [`render`] pulls output nodes into a sink block by block
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rivulet_core::{Mixer, SignalGraph};
//! use rivulet_io::{WavSink, WavSource, WavSpec, render, split_channels};
//!
//! let mut graph = SignalGraph::new();
//! let input = WavSource::open("input.wav")?;
//! let channels = split_channels(&mut graph, input, 1024)?;
//!
//! let mut mix = Mixer::new();
//! for channel in channels {
//!     mix = mix.with_input(channel, 0.5f32);
//! }
//! let mono = graph.add(mix);
//! let mono = graph.add_resample(mono, 44100.0, None)?;
//!
//! let spec = WavSpec { channels: 1, sample_rate: 44100, bits_per_sample: 16 };
//! let mut sink = WavSink::create("output.wav", spec)?;
//! render(&mut graph, &[mono], &mut sink, 512)?;
//! sink.finalize()?;
//! # Ok::<(), rivulet_io::Error>(())
//! ```

mod channel;
mod render;
mod split;
mod wav;

pub use channel::{ChannelSink, ChannelSource, MemorySink, MemorySource};
pub use render::render;
pub use split::split_channels;
pub use wav::{WavSink, WavSource, WavSpec};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Graph or buffer error, including channel count and length mismatches.
    #[error(transparent)]
    Graph(#[from] rivulet_core::Error),

    /// The file's sample format cannot be represented.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Checks that `buffers` has one entry per channel and that all entries have
/// the same length, which is returned.
pub(crate) fn check_block(channels: usize, buffers: &[rivulet_core::SampleBuffer]) -> Result<usize> {
    if buffers.len() != channels {
        return Err(rivulet_core::Error::ChannelCountMismatch {
            expected: channels,
            actual: buffers.len(),
        }
        .into());
    }
    let frames = buffers.first().map_or(0, rivulet_core::SampleBuffer::len);
    if let Some(bad) = buffers.iter().find(|b| b.len() != frames) {
        return Err(rivulet_core::Error::BufferSizeMismatch {
            expected: frames,
            actual: bad.len(),
        }
        .into());
    }
    Ok(frames)
}
