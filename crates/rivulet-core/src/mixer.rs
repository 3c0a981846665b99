//! Weighted sum of inputs.

use crate::arithmetic::{Combiner, Op};
use crate::error::Result;
use crate::graph::{Node, NodeHandle, NodeId, PullContext};
use crate::sample::{SampleBuffer, Scalar};

/// Outputs `constant + Σ gainᵢ · inputᵢ`.
///
/// With `stop_early` (the default) an absent input ends the mix, and the first
/// short input truncates it once. An input that is short again on a later
/// call is [`Error::DesyncTruncation`](crate::Error::DesyncTruncation).
/// Without it, short inputs are padded with zeros.
///
/// ```rust
/// use rivulet_core::{ConstantSource, Mixer, SignalGraph};
///
/// let mut graph = SignalGraph::new();
/// let a = graph.add(ConstantSource::new(1.0f32));
/// let b = graph.add(ConstantSource::new(4.0f32));
/// let mix = graph.add(
///     Mixer::new()
///         .with_constant(0.5f32)
///         .with_input(a, 2.0f32)
///         .with_input(b, -0.25f32),
/// );
/// let out = graph.sample(&mix, 2).unwrap().unwrap();
/// assert_eq!(out.as_f32().unwrap(), &[1.5, 1.5]);
/// ```
#[derive(Debug)]
pub struct Mixer {
    inner: Combiner,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    /// Creates an empty mixer with a constant of zero.
    pub fn new() -> Self {
        Self {
            inner: Combiner::new(Op::Sum, Scalar::F32(0.0)),
        }
    }

    /// Adds an input scaled by `gain`.
    pub fn with_input(mut self, input: NodeHandle, gain: impl Into<Scalar>) -> Self {
        self.inner.push(input, gain.into());
        self
    }

    /// Sets the constant term.
    pub fn with_constant(mut self, constant: impl Into<Scalar>) -> Self {
        self.inner.set_constant(constant.into());
        self
    }

    /// Chooses between truncating (`true`) and zero-padding (`false`) on
    /// short inputs.
    pub fn stop_early(mut self, stop_early: bool) -> Self {
        self.inner.set_stop_early(stop_early);
        self
    }

    /// Replaces the gain of input `index` (in the order inputs were added),
    /// returning the previous gain, or `None` if there is no such input.
    pub fn set_gain(&mut self, index: usize, gain: impl Into<Scalar>) -> Option<Scalar> {
        self.inner.set_gain(index, gain.into())
    }

    /// Gain of input `index`.
    pub fn gain(&self, index: usize) -> Option<Scalar> {
        self.inner.gain(index)
    }

    /// Replaces the constant term.
    pub fn set_constant(&mut self, constant: impl Into<Scalar>) {
        self.inner.set_constant(constant.into());
    }

    /// Whether short inputs truncate the mix.
    pub fn is_stop_early(&self) -> bool {
        self.inner.stop_early()
    }

    /// The constant term.
    pub fn constant(&self) -> Scalar {
        self.inner.constant()
    }

    /// Number of inputs.
    pub fn input_count(&self) -> usize {
        self.inner.len()
    }
}

impl Node for Mixer {
    fn sample(&mut self, ctx: &mut PullContext<'_>, count: usize) -> Result<Option<SampleBuffer>> {
        self.inner.sample(ctx, count)
    }

    fn sources(&self) -> Vec<NodeId> {
        self.inner.sources()
    }

    fn name(&self) -> &'static str {
        "mixer"
    }
}
