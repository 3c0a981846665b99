//! Sample-rate conversion as a graph node.
//!
//! [`Resample`] converts its upstream's stream by the ratio
//! `output_rate / upstream_rate`, which must lie in [1/256, 256]. It has two
//! paths:
//!
//! - **Fast** ([`ResampleMode::Best`] through [`ResampleMode::ZeroOrderHold`]):
//!   a streaming `rubato` fixed-output resampler. Its output delay is skipped,
//!   and at end of stream it is flushed with silence until exactly
//!   `round(total_input × ratio)` samples have been emitted.
//! - **Reference** ([`ResampleMode::Reference`]): plain linear interpolation,
//!   useful to check the fast path and for very short streams.
//!
//! Both keep their fractional phase across calls, so block boundaries are
//! invisible in the output. Complex input is converted as two real channels.
//!
//! A resampler is a rate boundary: setting a sample rate on it (or downstream
//! of it) changes only its output rate, and the ratio is recomputed from the
//! two rates on every pull. After a change, the final length is the output
//! produced so far plus the remaining input at the new ratio.

use rubato::{
    FastFixedOut, PolynomialDegree, Resampler as _, SincFixedOut, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use crate::error::{Error, Result, check_sample_rate};
use crate::graph::{Node, NodeHandle, NodeId, PullContext, SignalGraph};
use crate::ring_buffer::CircularBuffer;
use crate::sample::{Complex64, SampleBuffer, SampleKind};

/// Interpolation quality of a [`Resample`] node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ResampleMode {
    /// Windowed sinc with a long kernel.
    #[default]
    Best,
    /// Windowed sinc with a short kernel.
    Fastest,
    /// Cubic polynomial interpolation.
    Cubic,
    /// Linear polynomial interpolation (fast path).
    Linear,
    /// Nearest-sample hold.
    ZeroOrderHold,
    /// Built-in linear interpolation, independent of the streaming resampler.
    Reference,
}

/// A validated conversion ratio `output_rate / input_rate`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct ResampleRatio(f64);

impl ResampleRatio {
    /// Smallest supported ratio.
    pub const MIN: f64 = 1.0 / 256.0;
    /// Largest supported ratio.
    pub const MAX: f64 = 256.0;

    /// Checks that `ratio` is finite and within [`MIN`](Self::MIN), [`MAX`](Self::MAX).
    pub fn new(ratio: f64) -> Result<Self> {
        if ratio.is_finite() && (Self::MIN..=Self::MAX).contains(&ratio) {
            Ok(Self(ratio))
        } else {
            Err(Error::InvalidRatio(ratio))
        }
    }

    /// Ratio between two sample rates.
    pub fn between(input_rate: f64, output_rate: f64) -> Result<Self> {
        let input_rate = check_sample_rate(input_rate)?;
        let output_rate = check_sample_rate(output_rate)?;
        Self::new(output_rate / input_rate)
    }

    /// The ratio value.
    pub fn value(self) -> f64 {
        self.0
    }
}

/// Input frames the fast resampler may need relative to its nominal ratio.
const MAX_RELATIVE_RATIO: f64 = 2.0;

enum Engine {
    Sinc(Box<SincFixedOut<f64>>),
    Poly(FastFixedOut<f64>),
}

/// Runs `$body` with `$r` bound to whichever rubato resampler `$engine` holds.
macro_rules! with_engine {
    ($engine:expr, $r:ident => $body:expr) => {
        match $engine {
            Engine::Sinc($r) => $body,
            Engine::Poly($r) => $body,
        }
    };
}

impl Engine {
    /// Builds the streaming resampler for `mode`; `None` for the reference path.
    fn new(mode: ResampleMode, ratio: f64, chunk_size: usize) -> Result<Option<Self>> {
        let sinc = |sinc_len, f_cutoff, interpolation, oversampling_factor, window| {
            let params = SincInterpolationParameters {
                sinc_len,
                f_cutoff,
                interpolation,
                oversampling_factor,
                window,
            };
            SincFixedOut::<f64>::new(ratio, MAX_RELATIVE_RATIO, params, chunk_size, 2)
                .map(|r| Self::Sinc(Box::new(r)))
        };
        let poly = |degree| {
            FastFixedOut::<f64>::new(ratio, MAX_RELATIVE_RATIO, degree, chunk_size, 2).map(Self::Poly)
        };
        let engine = match mode {
            ResampleMode::Best => sinc(
                256,
                0.95,
                SincInterpolationType::Cubic,
                256,
                WindowFunction::BlackmanHarris2,
            ),
            ResampleMode::Fastest => sinc(
                64,
                0.91,
                SincInterpolationType::Linear,
                128,
                WindowFunction::Blackman2,
            ),
            ResampleMode::Cubic => poly(PolynomialDegree::Cubic),
            ResampleMode::Linear => poly(PolynomialDegree::Linear),
            ResampleMode::ZeroOrderHold => poly(PolynomialDegree::Nearest),
            ResampleMode::Reference => return Ok(None),
        }?;
        Ok(Some(engine))
    }

    fn input_frames_next(&self) -> usize {
        with_engine!(self, r => r.input_frames_next())
    }

    fn output_delay(&self) -> usize {
        with_engine!(self, r => r.output_delay())
    }

    fn set_ratio(&mut self, ratio: f64) -> bool {
        with_engine!(self, r => r.set_resample_ratio(ratio, false).is_ok())
    }

    /// Processes one step; `None` input flushes with silence, a short input is
    /// zero-padded.
    fn process(&mut self, input: Option<&[Vec<f64>; 2]>, complex: bool) -> Result<Vec<Vec<f64>>> {
        let mask = [true, complex];
        let mask = Some(&mask[..]);
        let full = input.is_some_and(|chans| chans[0].len() == self.input_frames_next());
        let out = match (input, full) {
            (Some(chans), true) => with_engine!(self, r => r.process(&chans[..], mask))?,
            (Some(chans), false) => {
                with_engine!(self, r => r.process_partial(Some(&chans[..]), mask))?
            }
            (None, _) => with_engine!(self, r => r.process_partial::<Vec<f64>>(None, mask))?,
        };
        Ok(out)
    }
}

enum Path {
    Fast {
        engine: Engine,
        /// Leading output frames still to discard.
        delay: usize,
    },
    Reference {
        /// Input samples from the one under the next output onward.
        history: Vec<Complex64>,
        /// Input samples already dropped from the front of `history`.
        dropped: usize,
        /// Input position of the first output since the last ratio change.
        origin: f64,
        /// Outputs produced since the last ratio change.
        outputs: usize,
    },
}

/// Sample-rate converter node.
///
/// ```rust
/// use rivulet_core::{BufferSource, Resample, ResampleMode, SignalGraph};
///
/// let mut graph = SignalGraph::new();
/// let src = graph.add(BufferSource::new(vec![0.5f32; 480]));
/// let up = graph.add(Resample::new(src, 2.0, ResampleMode::Reference).unwrap());
/// assert_eq!(graph.sample_rate(up.id()).unwrap(), 96000.0);
///
/// let mut total = 0;
/// while let Some(block) = graph.sample(&up, 128).unwrap() {
///     total += block.len();
/// }
/// assert_eq!(total, 960);
/// ```
pub struct Resample {
    upstream: NodeHandle,
    mode: ResampleMode,
    ratio: f64,
    chunk_size: usize,
    path: Path,
    queue: CircularBuffer,
    kind: SampleKind,
    total_in: usize,
    produced: usize,
    /// Output count at the last ratio change.
    base_out: f64,
    /// Input position that `base_out` corresponds to.
    base_in: f64,
    ended: bool,
}

impl Resample {
    /// Output frames per streaming step when none is configured.
    pub const DEFAULT_CHUNK_SIZE: usize = 256;

    /// Creates a converter by `ratio` (`output_rate / upstream_rate`).
    ///
    /// Fails with [`Error::InvalidRatio`] for ratios outside [1/256, 256],
    /// infinities and NaN.
    pub fn new(upstream: NodeHandle, ratio: f64, mode: ResampleMode) -> Result<Self> {
        Self::with_chunk_size(upstream, ratio, mode, Self::DEFAULT_CHUNK_SIZE)
    }

    /// Like [`new`](Self::new) with an explicit streaming step size.
    pub fn with_chunk_size(
        upstream: NodeHandle,
        ratio: f64,
        mode: ResampleMode,
        chunk_size: usize,
    ) -> Result<Self> {
        let ratio = ResampleRatio::new(ratio)?.value();
        if chunk_size == 0 {
            return Err(Error::InvalidChunkSize(0));
        }
        let path = Self::build_path(mode, ratio, chunk_size)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "resample_new: {:?} ratio {ratio} from {}",
            mode,
            upstream.id()
        );
        Ok(Self {
            upstream,
            mode,
            ratio,
            chunk_size,
            path,
            queue: CircularBuffer::new(chunk_size * 2)?,
            kind: SampleKind::F32,
            total_in: 0,
            produced: 0,
            base_out: 0.0,
            base_in: 0.0,
            ended: false,
        })
    }

    fn build_path(mode: ResampleMode, ratio: f64, chunk_size: usize) -> Result<Path> {
        Ok(match Engine::new(mode, ratio, chunk_size)? {
            Some(engine) => Path::Fast {
                delay: engine.output_delay(),
                engine,
            },
            None => Path::Reference {
                history: Vec::new(),
                dropped: 0,
                origin: 0.0,
                outputs: 0,
            },
        })
    }

    /// Current conversion ratio.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Interpolation mode.
    pub fn mode(&self) -> ResampleMode {
        self.mode
    }

    /// Total output length once upstream has ended: the output count at the
    /// last ratio change plus the input after it at the current ratio.
    fn target(&self) -> usize {
        let rest = (self.total_in as f64 - self.base_in).max(0.0);
        (self.base_out + rest * self.ratio).round() as usize
    }

    fn finished(&self) -> bool {
        self.ended && self.produced >= self.target()
    }

    /// Picks up a ratio change from the two node rates.
    fn sync_ratio(&mut self, ctx: &PullContext<'_>) -> Result<()> {
        let ratio = ResampleRatio::between(ctx.source_rate(&self.upstream)?, ctx.sample_rate())?.value();
        if (ratio - self.ratio).abs() <= f64::EPSILON * self.ratio {
            return Ok(());
        }
        let old_ratio = self.ratio;
        self.ratio = ratio;
        match &mut self.path {
            Path::Fast { engine, .. } => {
                self.base_out += (self.total_in as f64 - self.base_in).max(0.0) * old_ratio;
                self.base_in = self.total_in as f64;
                if !engine.set_ratio(ratio) {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("resample_rebuild: ratio {ratio} out of adjustable range");
                    self.path = Self::build_path(self.mode, ratio, self.chunk_size)?;
                }
            }
            Path::Reference {
                origin, outputs, ..
            } => {
                *origin += *outputs as f64 / old_ratio;
                *outputs = 0;
                self.base_out = self.produced as f64;
                self.base_in = *origin;
            }
        }
        Ok(())
    }

    /// Pulls `count` from upstream, tracking kind and end of stream.
    fn pull(&mut self, ctx: &mut PullContext<'_>, count: usize) -> Result<Option<SampleBuffer>> {
        let block = ctx.pull(&self.upstream, count)?;
        match &block {
            Some(b) => {
                self.kind = self.kind.join(b.kind());
                self.total_in += b.len();
                self.ended = b.len() < count;
            }
            None => self.ended = true,
        }
        Ok(block)
    }

    /// Appends converted samples to the output queue, capped at the final
    /// length once upstream has ended.
    fn emit(&mut self, mut values: Vec<Complex64>) -> Result<()> {
        if self.ended {
            values.truncate(self.target().saturating_sub(self.produced));
        }
        if values.is_empty() {
            return Ok(());
        }
        let block = SampleBuffer::from_c64_iter(self.kind, values);
        if self.queue.available()? < block.len() {
            let needed = (self.queue.length()? + block.len()).next_power_of_two();
            self.queue.grow(needed)?;
        }
        self.produced += block.len();
        self.queue.write(&block)?;
        Ok(())
    }

    /// One fast-path step: one upstream pull or one flush.
    fn step_fast(&mut self, ctx: &mut PullContext<'_>) -> Result<()> {
        let output = if self.ended {
            let complex = self.kind.is_complex();
            let Path::Fast { engine, .. } = &mut self.path else {
                return Ok(());
            };
            engine.process(None, complex)?
        } else {
            let need = match &self.path {
                Path::Fast { engine, .. } => engine.input_frames_next(),
                Path::Reference { .. } => return Ok(()),
            };
            let Some(block) = self.pull(ctx, need)? else {
                return Ok(());
            };
            let complex = self.kind.is_complex();
            let mut chans = [Vec::with_capacity(need), Vec::with_capacity(need)];
            for v in block.iter_c64() {
                chans[0].push(v.re);
                chans[1].push(v.im);
            }
            let Path::Fast { engine, .. } = &mut self.path else {
                return Ok(());
            };
            engine.process(Some(&chans), complex)?
        };

        let complex = self.kind.is_complex();
        let Path::Fast { delay, .. } = &mut self.path else {
            return Ok(());
        };
        let frames = output[0].len();
        let skip = (*delay).min(frames);
        *delay -= skip;
        let values = (skip..frames)
            .map(|i| Complex64::new(output[0][i], if complex { output[1][i] } else { 0.0 }))
            .collect();
        self.emit(values)
    }

    /// One reference-path step: interpolate what history allows, else pull.
    /// Returns `false` once upstream has ended and nothing is left.
    fn step_reference(&mut self, ctx: &mut PullContext<'_>, wanted: usize) -> Result<bool> {
        let step = 1.0 / self.ratio;
        let ended = self.ended;
        let target = self.target();
        let mut remaining = if ended {
            wanted.min(target.saturating_sub(self.produced))
        } else {
            wanted
        };

        let Path::Reference {
            history,
            dropped,
            origin,
            outputs,
        } = &mut self.path
        else {
            return Ok(false);
        };
        let mut values = Vec::new();
        while remaining > 0 {
            let position = *origin + *outputs as f64 * step;
            let whole = position.floor();
            let index = whole as usize - *dropped;
            let next = if index + 1 < history.len() {
                history[index + 1]
            } else if ended && index < history.len() {
                history[index]
            } else {
                break;
            };
            values.push(history[index] + (next - history[index]) * (position - whole));
            *outputs += 1;
            remaining -= 1;
        }
        let upcoming = (*origin + *outputs as f64 * step).floor() as usize;
        let consumed = (upcoming - *dropped).min(history.len().saturating_sub(1));
        history.drain(..consumed);
        *dropped += consumed;

        if values.is_empty() {
            if ended {
                return Ok(false);
            }
            let need = ((wanted as f64 * step).ceil() as usize + 2).max(self.chunk_size);
            if let Some(block) = self.pull(ctx, need)? {
                if let Path::Reference { history, .. } = &mut self.path {
                    history.extend(block.iter_c64());
                }
            }
            return Ok(true);
        }
        self.emit(values)?;
        Ok(true)
    }
}

impl Node for Resample {
    fn sample(&mut self, ctx: &mut PullContext<'_>, count: usize) -> Result<Option<SampleBuffer>> {
        self.sync_ratio(ctx)?;
        while self.queue.length()? < count && !self.finished() {
            let wanted = count - self.queue.length()?;
            let advanced = match self.path {
                Path::Fast { .. } => {
                    self.step_fast(ctx)?;
                    true
                }
                Path::Reference { .. } => self.step_reference(ctx, wanted)?,
            };
            if !advanced {
                break;
            }
        }
        let n = count.min(self.queue.length()?);
        if n == 0 {
            return Ok(None);
        }
        let mut block = self.queue.read(n)?;
        block.promote(self.kind);
        Ok(Some(block))
    }

    fn sources(&self) -> Vec<NodeId> {
        vec![self.upstream.id()]
    }

    fn name(&self) -> &'static str {
        "resample"
    }

    fn propagates_sample_rate(&self) -> bool {
        false
    }

    fn output_rate(&self, source_rate: f64) -> f64 {
        source_rate * self.ratio
    }
}

impl SignalGraph {
    /// Adds a [`Resample`] node converting `upstream` to `target_rate`, using
    /// the configured mode and step size when `mode` is `None`.
    pub fn add_resample(
        &mut self,
        upstream: NodeHandle,
        target_rate: f64,
        mode: Option<ResampleMode>,
    ) -> Result<NodeHandle> {
        let ratio = ResampleRatio::between(self.sample_rate(upstream.id())?, target_rate)?;
        let mode = mode.unwrap_or(self.settings().resample_mode);
        let chunk = self.settings().resample_chunk_size;
        let node = Resample::with_chunk_size(upstream, ratio.value(), mode, chunk)?;
        self.add_with_rate(node, target_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Complex32;
    use crate::source::BufferSource;

    fn drain(graph: &mut SignalGraph, h: &NodeHandle, block: usize) -> Vec<Complex64> {
        let mut out = Vec::new();
        while let Some(b) = graph.sample(h, block).unwrap() {
            out.extend(b.iter_c64());
        }
        out
    }

    #[test]
    fn ratio_limits() {
        assert!(matches!(ResampleRatio::new(257.0), Err(Error::InvalidRatio(_))));
        assert!(matches!(
            ResampleRatio::new(0.999 / 256.0),
            Err(Error::InvalidRatio(_))
        ));
        assert!(ResampleRatio::new(core::f64::consts::PI).is_ok());
        assert!(ResampleRatio::new(256.0).is_ok());
        assert!(ResampleRatio::new(1.0 / 256.0).is_ok());
        assert!(ResampleRatio::new(f64::NAN).is_err());
        assert!(ResampleRatio::new(f64::INFINITY).is_err());
    }

    #[test]
    fn construction_rejects_bad_ratio() {
        let mut graph = SignalGraph::new();
        let src = graph.add(BufferSource::new(vec![0.0f32; 4]));
        assert!(matches!(
            Resample::new(src, 257.0, ResampleMode::Linear),
            Err(Error::InvalidRatio(_))
        ));
    }

    #[test]
    fn reference_interpolates_linearly() {
        let mut graph = SignalGraph::new();
        let src = graph.add(BufferSource::new(vec![0.0f64, 1.0, 2.0, 3.0]));
        let up = graph
            .add(Resample::new(src, 2.0, ResampleMode::Reference).unwrap());
        let out: Vec<f64> = drain(&mut graph, &up, 3).iter().map(|c| c.re).collect();
        assert_eq!(out, vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.0]);
    }

    #[test]
    fn reference_keeps_phase_across_blocks() {
        let data: Vec<f64> = (0..50).map(f64::from).collect();
        let run = |block: usize| {
            let mut graph = SignalGraph::new();
            let src = graph.add(BufferSource::new(data.clone()));
            let node = graph.add(Resample::new(src, 0.75, ResampleMode::Reference).unwrap());
            drain(&mut graph, &node, block)
        };
        let whole = run(1000);
        assert_eq!(whole.len(), (50.0f64 * 0.75).round() as usize);
        assert_eq!(run(1), whole);
        assert_eq!(run(7), whole);
    }

    #[test]
    fn fast_path_length_and_kind() {
        for mode in [
            ResampleMode::Best,
            ResampleMode::Fastest,
            ResampleMode::Cubic,
            ResampleMode::Linear,
            ResampleMode::ZeroOrderHold,
        ] {
            let mut graph = SignalGraph::new();
            let src = graph.add(BufferSource::new(vec![0.25f32; 1000]));
            let node = graph.add(Resample::new(src, 44100.0 / 48000.0, mode).unwrap());
            let mut total = 0;
            let mut kinds = Vec::new();
            while let Some(b) = graph.sample(&node, 100).unwrap() {
                total += b.len();
                kinds.push(b.kind());
            }
            assert_eq!(total, 919, "{mode:?}");
            assert!(kinds.iter().all(|&k| k == SampleKind::F32));
        }
    }

    #[test]
    fn fast_path_preserves_dc_level() {
        let mut graph = SignalGraph::new();
        let src = graph.add(BufferSource::new(vec![1.0f64; 4000]));
        let node = graph.add(Resample::new(src, 1.5, ResampleMode::Cubic).unwrap());
        let out = drain(&mut graph, &node, 512);
        assert_eq!(out.len(), 6000);
        for v in &out[200..5800] {
            assert!((v.re - 1.0).abs() < 1e-3, "got {}", v.re);
        }
    }

    #[test]
    fn complex_input_resamples_both_parts() {
        let mut graph = SignalGraph::new();
        let src = graph.add(BufferSource::new(vec![Complex32::new(1.0, -1.0); 600]));
        let node = graph.add(Resample::new(src, 0.5, ResampleMode::Linear).unwrap());
        let first = graph.sample(&node, 200).unwrap().unwrap();
        assert_eq!(first.kind(), SampleKind::ComplexF32);
        let mid = first.get(100);
        assert!((mid.re - 1.0).abs() < 1e-3);
        assert!((mid.im + 1.0).abs() < 1e-3);
    }

    #[test]
    fn rate_boundary() {
        let mut graph = SignalGraph::new();
        let src = graph.add(BufferSource::new(vec![0.0f32; 16]));
        let src_id = src.id();
        let node = graph.add_resample(src, 96000.0, Some(ResampleMode::Reference)).unwrap();
        assert_eq!(graph.sample_rate(node.id()).unwrap(), 96000.0);
        assert_eq!(graph.set_sample_rate(node.id(), 24000.0).unwrap(), 1);
        assert_eq!(graph.sample_rate(src_id).unwrap(), 48000.0);

        let out = drain(&mut graph, &node, 4);
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn runtime_ratio_out_of_range() {
        let mut graph = SignalGraph::new();
        let src = graph.add(BufferSource::new(vec![0.0f32; 16]));
        let node = graph.add_resample(src, 96000.0, Some(ResampleMode::Linear)).unwrap();
        graph.set_sample_rate(node.id(), 1.0).unwrap();
        assert!(matches!(
            graph.sample(&node, 4),
            Err(Error::InvalidRatio(_))
        ));
    }

    fn consumed(graph: &mut SignalGraph, id: NodeId) -> usize {
        graph.node_mut::<Resample>(id).unwrap().total_in
    }

    #[test]
    fn reference_rate_change_mid_stream() {
        let ramp: Vec<f64> = (0..100).map(f64::from).collect();
        let mut graph = SignalGraph::new();
        let src = graph.add(BufferSource::new(ramp));
        let node = graph.add_resample(src, 48000.0, Some(ResampleMode::Reference)).unwrap();

        let mut out: Vec<f64> = graph
            .sample(&node, 50)
            .unwrap()
            .unwrap()
            .iter_c64()
            .map(|c| c.re)
            .collect();
        graph.set_sample_rate(node.id(), 96000.0).unwrap();
        out.extend(drain(&mut graph, &node, 50).iter().map(|c| c.re));

        assert_eq!(out.len(), 150);
        assert_eq!(&out[48..53], &[48.0, 49.0, 50.0, 50.5, 51.0]);
        assert_eq!(out[148], 99.0);
        assert_eq!(out[149], 99.0);
    }

    #[test]
    fn reference_rate_drop_mid_stream() {
        let ramp: Vec<f64> = (0..100).map(f64::from).collect();
        let mut graph = SignalGraph::new();
        let src = graph.add(BufferSource::new(ramp));
        let node = graph.add_resample(src, 96000.0, Some(ResampleMode::Reference)).unwrap();

        let mut out: Vec<f64> = graph
            .sample(&node, 40)
            .unwrap()
            .unwrap()
            .iter_c64()
            .map(|c| c.re)
            .collect();
        graph.set_sample_rate(node.id(), 24000.0).unwrap();
        out.extend(drain(&mut graph, &node, 7).iter().map(|c| c.re));

        // 40 outputs cover inputs 0..20, the remaining 80 inputs give 40 more
        assert_eq!(out.len(), 80);
        assert_eq!(&out[38..42], &[19.0, 19.5, 20.0, 22.0]);
        assert_eq!(out[79], 98.0);
    }

    #[test]
    fn fast_rate_change_mid_stream() {
        let mut graph = SignalGraph::new();
        let src = graph.add(BufferSource::new(vec![1.0f64; 4000]));
        let node = graph.add_resample(src, 48000.0, Some(ResampleMode::Linear)).unwrap();

        let mut out = Vec::new();
        for _ in 0..2 {
            out.extend(graph.sample(&node, 500).unwrap().unwrap().iter_c64());
        }
        let before = consumed(&mut graph, node.id());
        graph.set_sample_rate(node.id(), 72000.0).unwrap();
        out.extend(drain(&mut graph, &node, 500));

        let expected = (before as f64 + (4000 - before) as f64 * 1.5).round() as usize;
        assert_eq!(out.len(), expected);
        for v in &out[200..out.len() - 200] {
            assert!((v.re - 1.0).abs() < 1e-6, "got {}", v.re);
        }
    }

    #[test]
    fn large_rate_change_rebuilds_fast_path() {
        let mut graph = SignalGraph::new();
        let src = graph.add(BufferSource::new(vec![1.0f64; 4000]));
        let node = graph.add_resample(src, 48000.0, Some(ResampleMode::Linear)).unwrap();

        let mut out: Vec<Complex64> = graph.sample(&node, 500).unwrap().unwrap().iter_c64().collect();
        let before = consumed(&mut graph, node.id());
        // beyond what rubato can retune in place
        graph.set_sample_rate(node.id(), 4.0 * 48000.0).unwrap();
        out.extend(drain(&mut graph, &node, 500));

        let expected = before + (4000 - before) * 4;
        assert_eq!(out.len(), expected);
        for v in &out[1000..8000] {
            assert!((v.re - 1.0).abs() < 1e-6, "got {}", v.re);
        }
    }
}
