//! Graph-wide construction defaults.

use crate::error::{Error, Result, check_sample_rate};
use crate::resample::ResampleMode;

/// Default sample rate in Hz for nodes without an upstream.
pub const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

/// Defaults applied when the graph constructs buffering nodes.
///
/// Loaded from TOML by `rivulet-config`; every field is optional in the file.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct GraphSettings {
    /// Sample rate in Hz given to nodes with no source.
    pub sample_rate: f64,
    /// Ring capacity, in samples, shared by the branches of one tee.
    pub tee_capacity: usize,
    /// Upstream chunk size used by [`SignalGraph::add_adapter`](crate::SignalGraph::add_adapter)
    /// when none is given.
    pub adapter_chunk_size: usize,
    /// Interpolator used by [`SignalGraph::add_resample`](crate::SignalGraph::add_resample)
    /// when none is given.
    pub resample_mode: ResampleMode,
    /// Output frames produced per step of the streaming resampler.
    pub resample_chunk_size: usize,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            tee_capacity: 65536,
            adapter_chunk_size: 1024,
            resample_mode: ResampleMode::Best,
            resample_chunk_size: 256,
        }
    }
}

impl GraphSettings {
    /// Checks that the rate is usable and every size is non-zero.
    pub fn validate(&self) -> Result<()> {
        check_sample_rate(self.sample_rate)?;
        if self.tee_capacity == 0 {
            return Err(Error::InvalidCapacity {
                requested: 0,
                minimum: 1,
            });
        }
        if self.adapter_chunk_size == 0 {
            return Err(Error::InvalidChunkSize(self.adapter_chunk_size));
        }
        if self.resample_chunk_size == 0 {
            return Err(Error::InvalidChunkSize(self.resample_chunk_size));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = GraphSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.sample_rate, 48000.0);
        assert_eq!(settings.resample_mode, ResampleMode::Best);
    }

    #[test]
    fn rejects_bad_values() {
        let bad_rate = GraphSettings {
            sample_rate: -44100.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_rate.validate(),
            Err(Error::InvalidSampleRate(_))
        ));

        let bad_chunk = GraphSettings {
            adapter_chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            bad_chunk.validate(),
            Err(Error::InvalidChunkSize(0))
        ));

        let bad_tee = GraphSettings {
            tee_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            bad_tee.validate(),
            Err(Error::InvalidCapacity { .. })
        ));
    }
}
