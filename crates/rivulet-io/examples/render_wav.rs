//! Resample a WAV file and fold it down to mono.
//!
//! ```text
//! cargo run -p rivulet-io --example render_wav -- input.wav output.wav [rate]
//! ```
//!
//! Set `RUST_LOG=debug` to see every node pull.

use rivulet_core::{Mixer, SignalGraph};
use rivulet_io::{WavSink, WavSource, WavSpec, render, split_channels};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: render_wav <input.wav> <output.wav> [rate]");
        std::process::exit(2);
    };
    let rate: u32 = match args.next() {
        Some(rate) => rate.parse()?,
        None => 44100,
    };

    let mut graph = SignalGraph::new();
    let source = WavSource::open(&input)?;
    let gain = 1.0 / f32::from(source.spec().channels);
    let channels = split_channels(&mut graph, source, 1024)?;

    let mut mix = Mixer::new();
    for channel in channels {
        mix = mix.with_input(channel, gain);
    }
    let mono = graph.add(mix);
    let mono = graph.add_resample(mono, f64::from(rate), None)?;

    let spec = WavSpec {
        channels: 1,
        sample_rate: rate,
        bits_per_sample: 16,
    };
    let mut sink = WavSink::create(&output, spec)?;
    let frames = render(&mut graph, &[mono], &mut sink, 512)?;
    sink.finalize()?;

    tracing::info!(frames, %input, %output, "done");
    Ok(())
}
