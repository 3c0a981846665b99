//! Block-by-block rendering of graph outputs into a sink.

use rivulet_core::{Error as GraphError, NodeHandle, SampleBuffer, SignalGraph};

use crate::Result;
use crate::channel::ChannelSink;

/// Pulls `block` samples at a time from every node in `outputs` and writes
/// them to `sink` as one channel each, until every output is absent.
///
/// Outputs must stay in lockstep: a block where some outputs are absent and
/// others are not, or where lengths differ, fails with
/// `BufferSizeMismatch`. Returns the number of frames written.
pub fn render<K: ChannelSink + ?Sized>(
    graph: &mut SignalGraph,
    outputs: &[NodeHandle],
    sink: &mut K,
    block: usize,
) -> Result<usize> {
    if block == 0 {
        return Err(GraphError::InvalidChunkSize(block).into());
    }
    if outputs.len() != sink.channels() {
        return Err(GraphError::ChannelCountMismatch {
            expected: sink.channels(),
            actual: outputs.len(),
        }
        .into());
    }

    let mut total = 0;
    loop {
        let pulled = outputs
            .iter()
            .map(|out| graph.sample(out, block))
            .collect::<rivulet_core::Result<Vec<Option<SampleBuffer>>>>()?;
        if pulled.iter().all(Option::is_none) {
            break;
        }
        let buffers = lockstep(pulled)?;
        total += sink.write(&buffers)?;
    }
    sink.flush()?;
    tracing::info!(frames = total, channels = outputs.len(), "render complete");
    Ok(total)
}

/// Unwraps one block per output, failing if some are absent or lengths differ.
fn lockstep(pulled: Vec<Option<SampleBuffer>>) -> rivulet_core::Result<Vec<SampleBuffer>> {
    let frames = pulled.iter().flatten().map(SampleBuffer::len).max().unwrap_or(0);
    pulled
        .into_iter()
        .map(|buffer| match buffer {
            Some(b) if b.len() == frames => Ok(b),
            other => Err(GraphError::BufferSizeMismatch {
                expected: frames,
                actual: other.map_or(0, |b| b.len()),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::channel::MemorySink;
    use rivulet_core::{BufferSource, ConstantSource, Mixer};

    #[test]
    fn renders_until_outputs_end() {
        let mut graph = SignalGraph::new();
        let a = graph.add(BufferSource::new(vec![1.0f32; 10]));
        let b = graph.add(BufferSource::new(vec![2.0f32; 10]));
        let mut sink = MemorySink::new(2);

        let frames = render(&mut graph, &[a, b], &mut sink, 4).unwrap();
        assert_eq!(frames, 10);
        assert_eq!(sink.channel(0).unwrap().as_f32().unwrap(), &[1.0; 10]);
        assert_eq!(sink.channel(1).unwrap().as_f32().unwrap(), &[2.0; 10]);
    }

    #[test]
    fn exact_multiple_ends_on_absent() {
        let mut graph = SignalGraph::new();
        let a = graph.add(BufferSource::new(vec![1.0f64; 8]));
        let mut sink = MemorySink::new(1);
        assert_eq!(render(&mut graph, &[a], &mut sink, 4).unwrap(), 8);
    }

    #[test]
    fn ragged_outputs_fail() {
        let mut graph = SignalGraph::new();
        let a = graph.add(BufferSource::new(vec![1.0f32; 6]));
        let b = graph.add(BufferSource::new(vec![1.0f32; 9]));
        let mut sink = MemorySink::new(2);
        assert!(matches!(
            render(&mut graph, &[a, b], &mut sink, 4),
            Err(Error::Graph(GraphError::BufferSizeMismatch {
                expected: 4,
                actual: 2
            }))
        ));
        assert_eq!(sink.frames(), 4);
    }

    #[test]
    fn absent_beside_present_fails() {
        let mut graph = SignalGraph::new();
        let a = graph.add(BufferSource::new(vec![1.0f32; 4]));
        let b = graph.add(ConstantSource::new(0.0f32));
        let mut sink = MemorySink::new(2);
        assert!(matches!(
            render(&mut graph, &[a, b], &mut sink, 4),
            Err(Error::Graph(GraphError::BufferSizeMismatch { actual: 0, .. }))
        ));
    }

    #[test]
    fn channel_count_must_match_sink() {
        let mut graph = SignalGraph::new();
        let a = graph.add(ConstantSource::new(0.0f32));
        let mut sink = MemorySink::new(2);
        assert!(matches!(
            render(&mut graph, &[a], &mut sink, 4),
            Err(Error::Graph(GraphError::ChannelCountMismatch {
                expected: 2,
                actual: 1
            }))
        ));
    }

    #[test]
    fn mixer_output_renders_to_truncated_length() {
        let mut graph = SignalGraph::new();
        let tone = graph.add(BufferSource::new(vec![0.5f32; 5]));
        let dc = graph.add(ConstantSource::new(0.25f32));
        let mix = graph.add(Mixer::new().with_input(tone, 1.0f32).with_input(dc, 1.0f32));
        let mut sink = MemorySink::new(1);

        assert_eq!(render(&mut graph, &[mix], &mut sink, 4).unwrap(), 5);
        assert_eq!(sink.channel(0).unwrap().as_f32().unwrap(), &[0.75; 5]);
    }

    #[test]
    fn short_block_is_followed_by_absent() {
        let mut graph = SignalGraph::new();
        let dc = graph.add(ConstantSource::new(1.0f32));
        let tone = graph.add(BufferSource::new(vec![1.0f32; 12]));
        let mix = graph.add(Mixer::new().with_input(dc, 1.0f32).with_input(tone, 1.0f32));
        let mix_id = mix.id();
        let mut sink = MemorySink::new(1);

        assert_eq!(render(&mut graph, &[mix], &mut sink, 5).unwrap(), 12);
        assert_eq!(sink.channel(0).unwrap().as_f32().unwrap(), &[2.0; 12]);
        assert!(graph.is_exhausted(mix_id).unwrap());
    }
}
