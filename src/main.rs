use std::path::PathBuf;

use clap::Parser;
use env_logger::{Builder, Env};
use log::info;

use pcmplay::{
    AlsaPlayer, Pipeline, PipelineConfig, PcmFormat, PcmResult, WavWriter,
    format::{DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE},
    pipeline::DEFAULT_OUTPUT,
};

/// Convert a raw PCM capture to WAV and play it
#[derive(Parser, Debug)]
#[command(name = "pcmplay", version)]
#[command(about = "Convert a headerless PCM capture to WAV and play it", long_about = None)]
struct Args {
    /// Raw PCM file (no header)
    input: PathBuf,

    /// Where to write the WAV file
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Sample rate in Hz
    #[arg(short = 'r', long, default_value_t = DEFAULT_SAMPLE_RATE,
          value_parser = clap::value_parser!(u32).range(1..))]
    sample_rate: u32,

    /// Interleaved channel count
    #[arg(short, long, default_value_t = DEFAULT_CHANNELS,
          value_parser = clap::value_parser!(u16).range(1..))]
    channels: u16,

    /// Bits per sample (16 or 32)
    #[arg(short, long, default_value_t = 16)]
    bit_depth: u16,
}

fn main() -> PcmResult<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let format = PcmFormat::new(args.sample_rate, args.channels, args.bit_depth)?;

    let config = PipelineConfig::new(args.input)
        .with_output(args.output)
        .with_format(format);

    let mut pipeline = Pipeline::new(config);
    let summary = pipeline.run(&mut WavWriter, &mut AlsaPlayer::new())?;

    info!(
        "done: {} frames at {} Hz via {}",
        summary.frames,
        summary.sample_rate,
        summary.output.display()
    );

    Ok(())
}
