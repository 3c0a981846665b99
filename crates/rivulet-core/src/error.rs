//! Error types for buffer, graph, and resampling operations.
//!
//! Every variant is fatal to the call that produced it. The only non-error
//! end-of-stream signal in the node protocol is an absent (`None`) result.

use crate::graph::NodeId;
use crate::ring_buffer::ReaderMode;

/// Errors raised by ring buffers, nodes, and the signal graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A write would exceed the ring buffer's free space, or pass a reader.
    #[error("buffer overflow: tried to write {requested} samples with only {available} available")]
    BufferOverflow {
        /// Number of samples the caller tried to write.
        requested: usize,
        /// Number of samples that could be written without losing data.
        available: usize,
    },

    /// A read asked for more samples than the reader can see.
    #[error("buffer underflow: tried to read {requested} samples with only {available} buffered")]
    BufferUnderflow {
        /// Number of samples the caller tried to read.
        requested: usize,
        /// Number of samples buffered for this reader.
        available: usize,
    },

    /// Single-reader and multi-reader access were mixed on one ring buffer.
    #[error("ring buffer is locked to {locked} mode; {attempted} access is not allowed")]
    ReaderMode {
        /// The mode fixed by the buffer's first use.
        locked: ReaderMode,
        /// The mode the rejected call needed.
        attempted: ReaderMode,
    },

    /// A reader was created with a delay reaching past retained content.
    #[error("reader delay of {delay} samples exceeds the {retained} samples still retained")]
    ReaderDelay {
        /// Requested delay.
        delay: usize,
        /// Samples written and still held by the buffer.
        retained: usize,
    },

    /// A reader handle does not belong to this buffer or was released.
    #[error("unknown ring buffer reader {0}")]
    UnknownReader(usize),

    /// A ring buffer capacity of zero, or a shrinking resize.
    #[error("invalid ring buffer capacity {requested} (must hold at least {minimum} samples)")]
    InvalidCapacity {
        /// Requested capacity.
        requested: usize,
        /// Smallest capacity that keeps all buffered data.
        minimum: usize,
    },

    /// A resample ratio outside [1/256, 256], non-finite, or NaN.
    #[error("resample ratio {0} must be a finite value within [1/256, 256]")]
    InvalidRatio(f64),

    /// A sample rate that is non-positive or non-finite.
    #[error("invalid sample rate {0} (must be positive and finite)")]
    InvalidSampleRate(f64),

    /// A chunk or block size of zero where a positive size is needed.
    #[error("invalid chunk size {0} (must be at least 1)")]
    InvalidChunkSize(usize),

    /// Multi-channel operands disagree on channel count.
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelCountMismatch {
        /// Channel count the receiver was configured for.
        expected: usize,
        /// Channel count that was supplied.
        actual: usize,
    },

    /// Multi-channel operands disagree on buffer length.
    #[error("buffer size mismatch: expected {expected} samples, got {actual}")]
    BufferSizeMismatch {
        /// Length of the first channel (or the expected length).
        expected: usize,
        /// Length of the offending channel.
        actual: usize,
    },

    /// A combinator saw a second inconsistent short read after truncating once.
    #[error("node {node} received desynchronized short reads after already truncating once")]
    DesyncTruncation {
        /// The combinator node that detected the desync.
        node: NodeId,
    },

    /// The node does not exist in this graph, or its slot was never filled.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The node was pulled while it was already producing a block.
    #[error("node {0} was pulled again while producing a block (feedback without delay)")]
    ReentrantPull(NodeId),

    /// A reservation was filled twice.
    #[error("node {0} has already been filled")]
    AlreadyFilled(NodeId),

    /// A node reading from outside the graph (a file or device) failed.
    #[error("node {node} failed to read its source: {source}")]
    Source {
        /// The node whose external source failed.
        node: NodeId,
        /// The underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The streaming resampler could not be constructed.
    #[error("failed to construct resampler: {0}")]
    ResamplerConstruction(#[from] rubato::ResamplerConstructionError),

    /// The streaming resampler failed while processing.
    #[error("resampler processing failed: {0}")]
    Resample(#[from] rubato::ResampleError),
}

/// Convenience result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns `rate` if it is a usable sample rate.
pub(crate) fn check_sample_rate(rate: f64) -> Result<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(Error::InvalidSampleRate(rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_display() {
        let err = Error::BufferOverflow {
            requested: 9,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "buffer overflow: tried to write 9 samples with only 2 available"
        );
    }

    #[test]
    fn reader_mode_display_names_both_modes() {
        let err = Error::ReaderMode {
            locked: ReaderMode::Single,
            attempted: ReaderMode::Multi,
        };
        let msg = err.to_string();
        assert!(msg.contains("single-reader"), "got: {msg}");
        assert!(msg.contains("multi-reader"), "got: {msg}");
    }

    #[test]
    fn sample_rate_check() {
        assert_eq!(check_sample_rate(48000.0).unwrap(), 48000.0);
        assert!(matches!(
            check_sample_rate(0.0),
            Err(Error::InvalidSampleRate(_))
        ));
        assert!(matches!(
            check_sample_rate(-1.0),
            Err(Error::InvalidSampleRate(_))
        ));
        assert!(matches!(
            check_sample_rate(f64::NAN),
            Err(Error::InvalidSampleRate(_))
        ));
        assert!(matches!(
            check_sample_rate(f64::INFINITY),
            Err(Error::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn source_failure_keeps_cause() {
        use std::error::Error as _;

        let cause = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated file");
        let err = Error::Source {
            node: NodeId(3),
            source: Box::new(cause),
        };
        assert!(err.to_string().contains("truncated file"));
        assert!(err.source().is_some());
    }
}
