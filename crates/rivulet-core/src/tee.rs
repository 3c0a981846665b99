//! Fan-out of one node to several independent consumers.
//!
//! All branches of a tee read from one shared multi-reader
//! [`CircularBuffer`], each through its own [`ReaderHandle`]. A branch that
//! needs more than it has buffered pulls exactly its shortfall from upstream
//! once; the other branches then find those samples already buffered. Every
//! branch therefore sees the same stream, exactly once, whatever block sizes
//! and cadence each consumer uses.
//!
//! There is no per-branch adapter. The shared ring holds everything between
//! the fastest and the slowest branch. If a pull would overwrite samples a
//! lagging branch has not read, the error is raised on the branch doing the
//! pull, not on the lagging one: that call fails with
//! [`Error::BufferOverflow`], no upstream pull happens, and nothing is lost.
//! The lagging branch keeps reading normally, and once it catches up the
//! failed pull can be retried. A branch that is never read therefore stalls
//! the others once the ring is full.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::graph::{Node, NodeHandle, NodeId, PullContext, SignalGraph};
use crate::ring_buffer::{CircularBuffer, ReaderHandle};
use crate::sample::SampleBuffer;

struct TeeCore {
    upstream: NodeHandle,
    ring: CircularBuffer,
    ended: bool,
}

/// One consumer's view of a tee'd node.
pub struct Branch {
    core: Rc<RefCell<TeeCore>>,
    reader: ReaderHandle,
    upstream: NodeId,
}

impl Branch {
    /// Position of this branch among its siblings.
    pub fn index(&self) -> usize {
        self.reader.index()
    }
}

impl Node for Branch {
    fn sample(&mut self, ctx: &mut PullContext<'_>, count: usize) -> Result<Option<SampleBuffer>> {
        let mut core = self
            .core
            .try_borrow_mut()
            .map_err(|_| Error::ReentrantPull(ctx.node_id()))?;
        let TeeCore {
            upstream,
            ring,
            ended,
        } = &mut *core;

        let buffered = ring.reader_length(&self.reader)?;
        if buffered < count && !*ended {
            let shortfall = count - buffered;
            let available = ring.available()?;
            if shortfall > available {
                return Err(Error::BufferOverflow {
                    requested: shortfall,
                    available,
                });
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "tee_pull: branch {} pulls {shortfall} from {}",
                self.reader.index(),
                upstream.id()
            );
            match ctx.pull(upstream, shortfall)? {
                Some(block) => {
                    *ended = block.len() < shortfall;
                    ring.write(&block)?;
                }
                None => *ended = true,
            }
        }

        let n = count.min(ring.reader_length(&self.reader)?);
        if n == 0 {
            return Ok(None);
        }
        ring.read_reader(&self.reader, n).map(Some)
    }

    fn sources(&self) -> Vec<NodeId> {
        vec![self.upstream]
    }

    fn name(&self) -> &'static str {
        "branch"
    }
}

impl SignalGraph {
    /// Splits `upstream` into `branches` handles that each see its full
    /// stream, buffered in a ring of the configured tee capacity.
    pub fn tee(&mut self, upstream: NodeHandle, branches: usize) -> Result<Vec<NodeHandle>> {
        let capacity = self.settings().tee_capacity;
        self.tee_with_capacity(upstream, branches, capacity)
    }

    /// Like [`tee`](Self::tee) with an explicit ring capacity.
    pub fn tee_with_capacity(
        &mut self,
        upstream: NodeHandle,
        branches: usize,
        capacity: usize,
    ) -> Result<Vec<NodeHandle>> {
        let upstream_id = upstream.id();
        let mut ring = CircularBuffer::new_multi(capacity)?;
        let readers = (0..branches)
            .map(|_| ring.reader(0))
            .collect::<Result<Vec<_>>>()?;
        let core = Rc::new(RefCell::new(TeeCore {
            upstream,
            ring,
            ended: false,
        }));

        #[cfg(feature = "tracing")]
        tracing::debug!("tee_new: {upstream_id} into {branches} branches, capacity {capacity}");

        Ok(readers
            .into_iter()
            .map(|reader| {
                self.add(Branch {
                    core: Rc::clone(&core),
                    reader,
                    upstream: upstream_id,
                })
            })
            .collect())
    }
}
