//! Leaf nodes: constant and pre-rendered sources.

use crate::error::Result;
use crate::graph::{Node, NodeId, PullContext};
use crate::sample::{SampleBuffer, Scalar};

/// Endless stream of one value.
#[derive(Clone, Debug)]
pub struct ConstantSource {
    value: Scalar,
}

impl ConstantSource {
    /// Creates a source emitting `value` forever, in `value`'s kind.
    pub fn new(value: impl Into<Scalar>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The emitted value.
    pub fn value(&self) -> Scalar {
        self.value
    }
}

impl Node for ConstantSource {
    fn sample(&mut self, _ctx: &mut PullContext<'_>, count: usize) -> Result<Option<SampleBuffer>> {
        let value = self.value.to_c64();
        Ok(Some(SampleBuffer::from_c64_iter(
            self.value.kind(),
            core::iter::repeat_n(value, count),
        )))
    }

    fn sources(&self) -> Vec<NodeId> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        "constant"
    }
}

/// Plays a buffer once.
///
/// Returns full blocks while enough samples remain, then one short block with
/// the rest, then `None`.
#[derive(Clone, Debug)]
pub struct BufferSource {
    data: SampleBuffer,
    position: usize,
}

impl BufferSource {
    /// Creates a source that plays `data` from the start.
    pub fn new(data: impl Into<SampleBuffer>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }

    /// Samples not yet played.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl Node for BufferSource {
    fn sample(&mut self, _ctx: &mut PullContext<'_>, count: usize) -> Result<Option<SampleBuffer>> {
        let n = count.min(self.remaining());
        if n == 0 {
            return Ok(None);
        }
        let block = self.data.slice(self.position..self.position + n);
        self.position += n;
        Ok(Some(block))
    }

    fn sources(&self) -> Vec<NodeId> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        "buffer"
    }
}
