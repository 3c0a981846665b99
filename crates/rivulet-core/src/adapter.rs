//! Re-chunking between an upstream's natural block size and arbitrary
//! downstream requests.

use crate::error::{Error, Result};
use crate::graph::{Node, NodeHandle, NodeId, PullContext, SignalGraph};
use crate::ring_buffer::CircularBuffer;
use crate::sample::SampleBuffer;

/// Pulls fixed-size chunks from upstream and serves any request size.
///
/// Requests are served from the internal ring when it holds enough. Otherwise
/// the adapter pulls whole `upstream_chunk_size` chunks until it does, or
/// until upstream ends. Leftover samples wait for the next request. After
/// upstream ends the adapter drains what it holds, then reports end-of-stream
/// for good.
///
/// ```rust
/// use rivulet_core::{BufferAdapter, BufferSource, SignalGraph};
///
/// let mut graph = SignalGraph::new();
/// let src = graph.add(BufferSource::new(vec![0.0f32; 40]));
/// let adapter = graph.add(BufferAdapter::new(src, 13).unwrap());
/// assert_eq!(graph.sample(&adapter, 21).unwrap().unwrap().len(), 21);
/// ```
pub struct BufferAdapter {
    upstream: NodeHandle,
    chunk_size: usize,
    ring: CircularBuffer,
    ended: bool,
}

impl BufferAdapter {
    /// Wraps `upstream`, pulling `upstream_chunk_size` samples at a time.
    pub fn new(upstream: NodeHandle, upstream_chunk_size: usize) -> Result<Self> {
        if upstream_chunk_size == 0 {
            return Err(Error::InvalidChunkSize(0));
        }
        Ok(Self {
            upstream,
            chunk_size: upstream_chunk_size,
            ring: CircularBuffer::new(upstream_chunk_size * 2)?,
            ended: false,
        })
    }

    /// Size of each upstream pull.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Grows the ring so `extra` more samples fit.
    fn make_room(&mut self, extra: usize) -> Result<()> {
        if self.ring.available()? < extra {
            let needed = (self.ring.length()? + extra).next_power_of_two();
            self.ring.grow(needed)?;
        }
        Ok(())
    }
}

impl Node for BufferAdapter {
    fn sample(&mut self, ctx: &mut PullContext<'_>, count: usize) -> Result<Option<SampleBuffer>> {
        while self.ring.length()? < count && !self.ended {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "adapter_pull: {} samples from {}",
                self.chunk_size,
                self.upstream.id()
            );
            match ctx.pull(&self.upstream, self.chunk_size)? {
                Some(chunk) => {
                    self.ended = chunk.len() < self.chunk_size;
                    self.make_room(chunk.len())?;
                    self.ring.write(&chunk)?;
                }
                None => self.ended = true,
            }
        }

        let n = count.min(self.ring.length()?);
        if n == 0 {
            return Ok(None);
        }
        self.ring.read(n).map(Some)
    }

    fn sources(&self) -> Vec<NodeId> {
        vec![self.upstream.id()]
    }

    fn name(&self) -> &'static str {
        "adapter"
    }
}

impl SignalGraph {
    /// Adds a [`BufferAdapter`] over `upstream`, using the configured chunk
    /// size when `upstream_chunk_size` is `None`.
    pub fn add_adapter(
        &mut self,
        upstream: NodeHandle,
        upstream_chunk_size: Option<usize>,
    ) -> Result<NodeHandle> {
        let chunk = upstream_chunk_size.unwrap_or(self.settings().adapter_chunk_size);
        let adapter = BufferAdapter::new(upstream, chunk)?;
        Ok(self.add(adapter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BufferSource;

    #[test]
    fn drains_then_stays_absent() {
        let mut graph = SignalGraph::new();
        let src = graph.add(BufferSource::new(vec![1.0f32; 10]));
        let adapter = graph.add_adapter(src, Some(4)).unwrap();

        assert_eq!(graph.sample(&adapter, 7).unwrap().unwrap().len(), 7);
        assert_eq!(graph.sample(&adapter, 7).unwrap().unwrap().len(), 3);
        assert!(graph.sample(&adapter, 7).unwrap().is_none());
        assert!(graph.sample(&adapter, 1).unwrap().is_none());
    }

    #[test]
    fn large_request_grows_ring() {
        let mut graph = SignalGraph::new();
        let data: Vec<f64> = (0..100).map(f64::from).collect();
        let src = graph.add(BufferSource::new(data.clone()));
        let adapter = graph.add_adapter(src, Some(3)).unwrap();
        let out = graph.sample(&adapter, 50).unwrap().unwrap();
        assert_eq!(out.as_f64().unwrap(), &data[..50]);
        let rest = graph.sample(&adapter, 60).unwrap().unwrap();
        assert_eq!(rest.as_f64().unwrap(), &data[50..]);
    }

    #[test]
    fn zero_chunk_rejected() {
        let mut graph = SignalGraph::new();
        let src = graph.add(BufferSource::new(vec![0.0f32]));
        assert!(matches!(
            graph.add_adapter(src, Some(0)),
            Err(Error::InvalidChunkSize(0))
        ));
    }
}
