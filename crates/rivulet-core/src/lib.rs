//! Rivulet Core - pull-based audio signal graph
//!
//! Nodes produce blocks of samples on demand. Pulling from the root of a graph
//! recursively pulls from everything upstream, one block at a time, on the
//! calling thread.
//!
//! # Core Abstractions
//!
//! ## Samples
//!
//! - [`SampleBuffer`] - A block of real or complex, single or double precision samples
//! - [`SampleKind`] - The four numeric kinds and their one-way promotion
//! - [`Scalar`] - A single constant of any kind, for gains and constant terms
//!
//! ## Storage
//!
//! - [`CircularBuffer`] - Ring buffer with single- or multi-reader access
//!
//! ## Graph
//!
//! - [`SignalGraph`] - Node arena, pull driver, and cycle-safe traversal
//! - [`Node`] - The sampling contract every node implements
//! - [`NodeHandle`] - Move-only right to pull from one node
//!
//! ## Nodes
//!
//! - [`Branch`] - One consumer's view of a tee'd node ([`SignalGraph::tee`])
//! - [`BufferAdapter`] - Re-chunks an upstream's fixed blocks to any request size
//! - [`Resample`] - Sample-rate conversion, streaming sinc/polynomial or linear reference
//! - [`Mixer`] - Weighted sum of inputs plus a constant
//! - [`Multiplier`] - Product of inputs and a constant
//! - [`ConstantSource`], [`BufferSource`] - Leaf sources
//!
//! # End of Stream
//!
//! A pull returns a full block, a short block (the end is near), or `None`
//! (exhausted, forever). Combinators end when an input ends, truncate once on
//! a short input, and treat a second short input as
//! [`Error::DesyncTruncation`].
//!
//! # Example
//!
//! ```rust
//! use rivulet_core::{BufferSource, Mixer, ResampleMode, SignalGraph};
//!
//! let mut graph = SignalGraph::new();
//! let voice = graph.add(BufferSource::new(vec![0.5f32; 1000]));
//! let mut taps = graph.tee(voice, 2).unwrap();
//! let dry = taps.remove(0);
//! let wet = graph
//!     .add_resample(taps.remove(0), 48000.0, Some(ResampleMode::Reference))
//!     .unwrap();
//! let mix = graph.add(Mixer::new().with_input(dry, 0.5f32).with_input(wet, 0.5f32));
//!
//! let block = graph.sample(&mix, 256).unwrap().unwrap();
//! assert_eq!(block.len(), 256);
//! ```
//!
//! # Features
//!
//! - `tracing` - debug-level events for graph changes, upstream pulls, and truncation
//! - `serde` - `Serialize`/`Deserialize` for [`GraphSettings`] and [`ResampleMode`]

pub mod adapter;
mod arithmetic;
pub mod error;
pub mod graph;
pub mod mixer;
pub mod multiplier;
pub mod resample;
pub mod ring_buffer;
pub mod sample;
pub mod settings;
pub mod source;
pub mod tee;

// Re-export main types at crate root
pub use adapter::BufferAdapter;
pub use error::{Error, Result};
pub use graph::{Node, NodeHandle, NodeId, PullContext, Reservation, SignalGraph};
pub use mixer::Mixer;
pub use multiplier::Multiplier;
pub use resample::{Resample, ResampleMode, ResampleRatio};
pub use ring_buffer::{CircularBuffer, ReaderHandle, ReaderMode};
pub use sample::{Complex32, Complex64, Sample, SampleBuffer, SampleKind, Scalar};
pub use settings::{DEFAULT_SAMPLE_RATE, GraphSettings};
pub use source::{BufferSource, ConstantSource};
pub use tee::Branch;
