//! WAV file source and sink.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};
use rivulet_core::SampleBuffer;

use crate::channel::{ChannelSink, ChannelSource};
use crate::{Error, Result, check_block};

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample; 32 means IEEE float, anything else integer PCM.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Full-scale value of a signed integer sample of `bits` bits.
fn int_scale(bits: u16) -> f32 {
    (1i64 << (bits - 1)) as f32
}

/// Streams a WAV file as one `f32` buffer per channel.
///
/// Integer PCM is normalized to `[-1, 1)`.
pub struct WavSource {
    reader: WavReader<BufReader<File>>,
    spec: hound::WavSpec,
}

impl WavSource {
    /// Opens a WAV file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(Error::UnsupportedFormat("zero channels".into()));
        }
        if spec.sample_format == SampleFormat::Float && spec.bits_per_sample != 32 {
            return Err(Error::UnsupportedFormat(format!(
                "{}-bit float",
                spec.bits_per_sample
            )));
        }
        tracing::info!(
            path = %path.display(),
            channels = spec.channels,
            sample_rate = spec.sample_rate,
            frames = reader.duration(),
            "wav source opened"
        );
        Ok(Self { reader, spec })
    }

    /// Format of the file.
    pub fn spec(&self) -> WavSpec {
        self.spec.into()
    }
}

impl ChannelSource for WavSource {
    fn channels(&self) -> usize {
        usize::from(self.spec.channels)
    }

    fn sample_rate(&self) -> f64 {
        f64::from(self.spec.sample_rate)
    }

    fn read(&mut self, frames: usize) -> Result<Option<Vec<SampleBuffer>>> {
        let channels = self.channels();
        let wanted = frames * channels;
        let interleaved: Vec<f32> = match self.spec.sample_format {
            SampleFormat::Float => self
                .reader
                .samples::<f32>()
                .take(wanted)
                .collect::<std::result::Result<_, _>>()?,
            SampleFormat::Int => {
                let scale = int_scale(self.spec.bits_per_sample);
                self.reader
                    .samples::<i32>()
                    .take(wanted)
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        let got = interleaved.len() / channels;
        if got == 0 {
            return Ok(None);
        }
        let block = (0..channels)
            .map(|ch| {
                SampleBuffer::from(
                    interleaved
                        .iter()
                        .skip(ch)
                        .step_by(channels)
                        .take(got)
                        .copied()
                        .collect::<Vec<f32>>(),
                )
            })
            .collect();
        Ok(Some(block))
    }
}

/// Writes split channels to a WAV file, interleaving them.
///
/// Only the real part of complex samples is written.
pub struct WavSink {
    writer: Option<WavWriter<BufWriter<File>>>,
    spec: WavSpec,
    frames: usize,
}

impl WavSink {
    /// Creates (or truncates) a WAV file for writing.
    pub fn create(path: impl AsRef<Path>, spec: WavSpec) -> Result<Self> {
        let path = path.as_ref();
        if spec.channels == 0 {
            return Err(Error::UnsupportedFormat("zero channels".into()));
        }
        let writer = WavWriter::create(path, spec.into())?;
        tracing::info!(
            path = %path.display(),
            channels = spec.channels,
            sample_rate = spec.sample_rate,
            bits = spec.bits_per_sample,
            "wav sink created"
        );
        Ok(Self {
            writer: Some(writer),
            spec,
            frames: 0,
        })
    }

    /// Format of the file.
    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Frames written so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Writes the header and closes the file.
    pub fn finalize(mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
            tracing::info!(frames = self.frames, "wav sink finalized");
        }
        Ok(())
    }

    fn writer(&mut self) -> Result<&mut WavWriter<BufWriter<File>>> {
        self.writer.as_mut().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "wav sink already finalized",
            ))
        })
    }
}

impl ChannelSink for WavSink {
    fn channels(&self) -> usize {
        usize::from(self.spec.channels)
    }

    fn write(&mut self, block: &[SampleBuffer]) -> Result<usize> {
        let frames = check_block(self.channels(), block)?;
        let channels: Vec<Vec<f64>> = block.iter().map(SampleBuffer::real_f64).collect();
        let bits = self.spec.bits_per_sample;
        let writer = self.writer()?;

        if bits == 32 {
            for i in 0..frames {
                for ch in &channels {
                    writer.write_sample(ch[i] as f32)?;
                }
            }
        } else {
            let max_val = int_scale(bits);
            for i in 0..frames {
                for ch in &channels {
                    let int_sample = (ch[i] as f32 * max_val).clamp(-max_val, max_val - 1.0) as i32;
                    writer.write_sample(int_sample)?;
                }
            }
        }
        self.frames += frames;
        Ok(frames)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer()?.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn spec_picks_float_for_32_bits() {
        let float: hound::WavSpec = WavSpec::default().into();
        assert_eq!(float.sample_format, SampleFormat::Float);
        let int: hound::WavSpec = WavSpec {
            bits_per_sample: 16,
            ..WavSpec::default()
        }
        .into();
        assert_eq!(int.sample_format, SampleFormat::Int);
    }

    #[test]
    fn write_then_read_stereo_float() {
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            channels: 2,
            ..WavSpec::default()
        };
        let mut sink = WavSink::create(file.path(), spec).unwrap();
        let left = SampleBuffer::from(vec![0.1f32, 0.2, 0.3]);
        let right = SampleBuffer::from(vec![-0.1f32, -0.2, -0.3]);
        assert_eq!(sink.write(&[left, right]).unwrap(), 3);
        sink.finalize().unwrap();

        let mut source = WavSource::open(file.path()).unwrap();
        assert_eq!(source.spec(), spec);
        let block = source.read(10).unwrap().unwrap();
        assert_eq!(block[0].as_f32().unwrap(), &[0.1, 0.2, 0.3]);
        assert_eq!(block[1].as_f32().unwrap(), &[-0.1, -0.2, -0.3]);
        assert!(source.read(10).unwrap().is_none());
    }

    #[test]
    fn int_pcm_is_normalized() {
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            bits_per_sample: 16,
            ..WavSpec::default()
        };
        let mut sink = WavSink::create(file.path(), spec).unwrap();
        sink.write(&[SampleBuffer::from(vec![0.5f64, -1.0, 2.0])]).unwrap();
        sink.finalize().unwrap();

        let mut source = WavSource::open(file.path()).unwrap();
        let block = source.read(3).unwrap().unwrap();
        let values = block[0].as_f32().unwrap();
        assert_eq!(values[0], 0.5);
        assert_eq!(values[1], -1.0);
        // clipped to the largest positive code
        assert!((values[2] - 32767.0 / 32768.0).abs() < 1e-9);
    }

    #[test]
    fn sink_rejects_wrong_channel_count() {
        let file = NamedTempFile::new().unwrap();
        let mut sink = WavSink::create(file.path(), WavSpec::default()).unwrap();
        let block = [SampleBuffer::from(vec![0.0f32]), SampleBuffer::from(vec![0.0f32])];
        assert!(matches!(
            sink.write(&block),
            Err(Error::Graph(rivulet_core::Error::ChannelCountMismatch { .. }))
        ));
    }
}
