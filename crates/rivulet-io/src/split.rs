//! One graph node per channel of a multi-channel source.

use std::cell::RefCell;
use std::rc::Rc;

use rivulet_core::{
    CircularBuffer, Error as GraphError, Node, NodeHandle, NodeId, PullContext, SampleBuffer,
    SignalGraph,
};

use crate::Result;
use crate::channel::ChannelSource;

struct SplitCore {
    source: Box<dyn ChannelSource>,
    chunk_size: usize,
    rings: Vec<CircularBuffer>,
    ended: bool,
}

impl SplitCore {
    /// Reads one chunk from the source into every channel's ring.
    fn fill(&mut self, node: NodeId) -> rivulet_core::Result<()> {
        let block = self.source.read(self.chunk_size).map_err(|err| {
            tracing::error!(%err, "split_read: source failed");
            GraphError::Source {
                node,
                source: Box::new(err),
            }
        })?;
        let Some(block) = block else {
            self.ended = true;
            return Ok(());
        };
        if block.len() != self.rings.len() {
            return Err(GraphError::ChannelCountMismatch {
                expected: self.rings.len(),
                actual: block.len(),
            });
        }
        let frames = block.first().map_or(0, SampleBuffer::len);
        self.ended = frames < self.chunk_size;
        tracing::debug!(frames, "split_read: chunk from source");

        for (ring, data) in self.rings.iter_mut().zip(&block) {
            if data.len() != frames {
                return Err(GraphError::BufferSizeMismatch {
                    expected: frames,
                    actual: data.len(),
                });
            }
            if ring.available()? < frames {
                let needed = (ring.length()? + frames).next_power_of_two();
                ring.grow(needed)?;
            }
            ring.write(data)?;
        }
        Ok(())
    }
}

/// One channel of a split source.
struct ChannelNode {
    core: Rc<RefCell<SplitCore>>,
    channel: usize,
}

impl Node for ChannelNode {
    fn sample(
        &mut self,
        ctx: &mut PullContext<'_>,
        count: usize,
    ) -> rivulet_core::Result<Option<SampleBuffer>> {
        let mut core = self
            .core
            .try_borrow_mut()
            .map_err(|_| GraphError::ReentrantPull(ctx.node_id()))?;

        while core.rings[self.channel].length()? < count && !core.ended {
            core.fill(ctx.node_id())?;
        }

        let ring = &mut core.rings[self.channel];
        let n = count.min(ring.length()?);
        if n == 0 {
            return Ok(None);
        }
        ring.read(n).map(Some)
    }

    fn sources(&self) -> Vec<NodeId> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Adds one node per channel of `source` to `graph`, running at the
/// source's sample rate.
///
/// The source is read `chunk_size` frames at a time. Every read feeds all
/// channels; each channel keeps what its consumer has not yet pulled in its
/// own growable ring, so channels may be consumed at different paces.
///
/// A failed source read surfaces from the pulling node as
/// [`Error::Source`](rivulet_core::Error::Source).
pub fn split_channels<S: ChannelSource + 'static>(
    graph: &mut SignalGraph,
    source: S,
    chunk_size: usize,
) -> Result<Vec<NodeHandle>> {
    if chunk_size == 0 {
        return Err(GraphError::InvalidChunkSize(chunk_size).into());
    }
    let channels = source.channels();
    let sample_rate = source.sample_rate();
    let rings = (0..channels)
        .map(|_| CircularBuffer::new(chunk_size * 2))
        .collect::<rivulet_core::Result<Vec<_>>>()?;
    let core = Rc::new(RefCell::new(SplitCore {
        source: Box::new(source),
        chunk_size,
        rings,
        ended: false,
    }));

    let handles = (0..channels)
        .map(|channel| {
            graph.add_with_rate(
                ChannelNode {
                    core: Rc::clone(&core),
                    channel,
                },
                sample_rate,
            )
        })
        .collect::<rivulet_core::Result<Vec<_>>>()?;
    tracing::debug!(channels, sample_rate, chunk_size, "split_new");
    Ok(handles)
}
