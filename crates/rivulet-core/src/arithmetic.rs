//! Shared pull-and-combine logic for [`Mixer`](crate::Mixer) and
//! [`Multiplier`](crate::Multiplier).
//!
//! Every call pulls `count` from every input. How unequal lengths are handled
//! depends on `stop_early`:
//!
//! - `true` (default): if any input is absent the result is absent. If every
//!   input is full the result is full. Otherwise the result is truncated to
//!   the shortest input, once. A later call where some input is short but not
//!   absent fails with [`Error::DesyncTruncation`].
//! - `false`: short and absent inputs are padded with the operation's
//!   identity up to the longest input. The result is absent only when every
//!   input is absent.
//!
//! The output kind is the join of every input block's kind, every gain's kind
//! and the constant's kind, worked out again on every call.

use crate::error::{Error, Result};
use crate::graph::{NodeHandle, NodeId, PullContext};
use crate::sample::{Complex64, SampleBuffer, Scalar};

/// How inputs fold into the running value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    Sum,
    Product,
}

impl Op {
    /// Value standing in for a missing input sample.
    fn pad(self) -> Complex64 {
        match self {
            Self::Sum => Complex64::new(0.0, 0.0),
            Self::Product => Complex64::new(1.0, 0.0),
        }
    }

    #[inline]
    fn apply(self, acc: &mut Complex64, value: Complex64) {
        match self {
            Self::Sum => *acc += value,
            Self::Product => *acc *= value,
        }
    }
}

/// Weighted inputs plus a constant term.
#[derive(Debug)]
pub(crate) struct Combiner {
    op: Op,
    inputs: Vec<(NodeHandle, Scalar)>,
    constant: Scalar,
    stop_early: bool,
    truncated: bool,
}

impl Combiner {
    pub(crate) fn new(op: Op, constant: Scalar) -> Self {
        Self {
            op,
            inputs: Vec::new(),
            constant,
            stop_early: true,
            truncated: false,
        }
    }

    pub(crate) fn push(&mut self, input: NodeHandle, gain: Scalar) {
        self.inputs.push((input, gain));
    }

    /// Replaces the gain of input `index`, returning the old one.
    pub(crate) fn set_gain(&mut self, index: usize, gain: Scalar) -> Option<Scalar> {
        self.inputs
            .get_mut(index)
            .map(|(_, g)| core::mem::replace(g, gain))
    }

    pub(crate) fn gain(&self, index: usize) -> Option<Scalar> {
        self.inputs.get(index).map(|(_, g)| *g)
    }

    pub(crate) fn set_constant(&mut self, constant: Scalar) {
        self.constant = constant;
    }

    pub(crate) fn set_stop_early(&mut self, stop_early: bool) {
        self.stop_early = stop_early;
    }

    pub(crate) fn stop_early(&self) -> bool {
        self.stop_early
    }

    pub(crate) fn constant(&self) -> Scalar {
        self.constant
    }

    pub(crate) fn len(&self) -> usize {
        self.inputs.len()
    }

    pub(crate) fn sources(&self) -> Vec<NodeId> {
        self.inputs.iter().map(|(h, _)| h.id()).collect()
    }

    /// Output length for this call, or `None` for end of stream.
    fn output_len(
        &mut self,
        node: NodeId,
        count: usize,
        blocks: &[Option<SampleBuffer>],
    ) -> Result<Option<usize>> {
        if blocks.is_empty() {
            return Ok(Some(count));
        }
        if blocks.iter().all(Option::is_none)
            || (self.stop_early && blocks.iter().any(Option::is_none))
        {
            return Ok(None);
        }
        let lengths = blocks.iter().map(|b| b.as_ref().map_or(0, SampleBuffer::len));
        let shortest = lengths.clone().min().unwrap_or(count);
        let longest = lengths.max().unwrap_or(count);

        if !self.stop_early {
            return Ok(Some(longest));
        }
        if shortest == count {
            return Ok(Some(count));
        }
        if self.truncated {
            return Err(Error::DesyncTruncation { node });
        }
        self.truncated = true;
        #[cfg(feature = "tracing")]
        tracing::debug!("combine_truncate: {node} truncated from {count} to {shortest}");
        Ok(Some(shortest))
    }

    pub(crate) fn sample(
        &mut self,
        ctx: &mut PullContext<'_>,
        count: usize,
    ) -> Result<Option<SampleBuffer>> {
        let mut blocks = Vec::with_capacity(self.inputs.len());
        for (input, _) in &self.inputs {
            blocks.push(ctx.pull(input, count)?);
        }

        let Some(len) = self.output_len(ctx.node_id(), count, &blocks)? else {
            return Ok(None);
        };

        let kind = blocks
            .iter()
            .flatten()
            .map(SampleBuffer::kind)
            .chain(self.inputs.iter().map(|(_, gain)| gain.kind()))
            .fold(self.constant.kind(), |acc, k| acc.join(k));

        let mut acc = vec![self.constant.to_c64(); len];
        for ((_, gain), block) in self.inputs.iter().zip(&blocks) {
            let gain = gain.to_c64();
            let values = block.as_ref().map(SampleBuffer::to_c64_vec).unwrap_or_default();
            for (i, out) in acc.iter_mut().enumerate() {
                let v = values.get(i).map_or(self.op.pad(), |&v| v * gain);
                self.op.apply(out, v);
            }
        }
        Ok(Some(SampleBuffer::from_c64_iter(kind, acc)))
    }
}
