//! Product of inputs.

use crate::arithmetic::{Combiner, Op};
use crate::error::Result;
use crate::graph::{Node, NodeHandle, NodeId, PullContext};
use crate::sample::{SampleBuffer, Scalar};

/// Outputs `constant · Πᵢ inputᵢ`.
///
/// With `stop_early(false)`, short inputs are padded with ones.
#[derive(Debug)]
pub struct Multiplier {
    inner: Combiner,
}

impl Default for Multiplier {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiplier {
    /// Creates an empty multiplier with a constant of one.
    pub fn new() -> Self {
        Self {
            inner: Combiner::new(Op::Product, Scalar::F32(1.0)),
        }
    }

    /// Adds a factor.
    pub fn with_input(mut self, input: NodeHandle) -> Self {
        self.inner.push(input, Scalar::F32(1.0));
        self
    }

    /// Sets the constant factor.
    pub fn with_constant(mut self, constant: impl Into<Scalar>) -> Self {
        self.inner.set_constant(constant.into());
        self
    }

    /// Chooses between truncating (`true`) and one-padding (`false`) on short
    /// inputs.
    pub fn stop_early(mut self, stop_early: bool) -> Self {
        self.inner.set_stop_early(stop_early);
        self
    }

    /// Replaces the constant factor.
    pub fn set_constant(&mut self, constant: impl Into<Scalar>) {
        self.inner.set_constant(constant.into());
    }

    /// Whether short inputs truncate the product.
    pub fn is_stop_early(&self) -> bool {
        self.inner.stop_early()
    }

    /// The constant factor.
    pub fn constant(&self) -> Scalar {
        self.inner.constant()
    }

    /// Number of inputs.
    pub fn input_count(&self) -> usize {
        self.inner.len()
    }
}

impl Node for Multiplier {
    fn sample(&mut self, ctx: &mut PullContext<'_>, count: usize) -> Result<Option<SampleBuffer>> {
        self.inner.sample(ctx, count)
    }

    fn sources(&self) -> Vec<NodeId> {
        self.inner.sources()
    }

    fn name(&self) -> &'static str {
        "multiplier"
    }
}
