use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::decode_helpers::{PcmError, PcmResult};
use crate::format::PcmFormat;
use crate::pcm::{self, SampleBuffer};
use crate::playback::Player;
use crate::wav;

pub const DEFAULT_OUTPUT: &str = "output.wav";

/// Everything one run needs, fixed up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: PcmFormat,
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            format: PcmFormat::default(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_format(mut self, format: PcmFormat) -> Self {
        self.format = format;
        self
    }
}

/// Produces a header-bearing container at `path`.
pub trait ContainerWriter {
    fn write(&mut self, path: &Path, buffer: &SampleBuffer, sample_rate: u32) -> PcmResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WavWriter;

impl ContainerWriter for WavWriter {
    fn write(&mut self, path: &Path, buffer: &SampleBuffer, sample_rate: u32) -> PcmResult<()> {
        wav::write(path, buffer, sample_rate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Reading,
    Decoding,
    Writing,
    Playing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Reading => "reading",
            Stage::Decoding => "decoding",
            Stage::Writing => "writing",
            Stage::Playing => "playing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: usize,
    pub frames: usize,
    pub output: PathBuf,
}

/// read -> decode -> write -> play, once.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    stage: Stage,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            stage: Stage::Idle,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn enter(&mut self, stage: Stage) {
        debug!("{} -> {}", self.stage, stage);
        self.stage = stage;
    }

    pub fn run<W, P>(&mut self, writer: &mut W, player: &mut P) -> PcmResult<RunSummary>
    where
        W: ContainerWriter + ?Sized,
        P: Player + ?Sized,
    {
        if self.stage != Stage::Idle {
            return Err(PcmError::AlreadyRun);
        }

        match self.steps(writer, player) {
            Ok(summary) => {
                self.enter(Stage::Done);
                Ok(summary)
            }
            Err(err) => {
                error!("{} failed: {err}", self.stage);
                self.enter(Stage::Failed);
                Err(err)
            }
        }
    }

    fn steps<W, P>(&mut self, writer: &mut W, player: &mut P) -> PcmResult<RunSummary>
    where
        W: ContainerWriter + ?Sized,
        P: Player + ?Sized,
    {
        self.enter(Stage::Reading);
        let bytes = read_source(&self.config.input)?;
        info!("read {} bytes from {}", bytes.len(), self.config.input.display());

        self.enter(Stage::Decoding);
        let format = self.config.format;
        let buffer = pcm::decode_with(&bytes, &format)?;
        drop(bytes);
        let sample_rate = format.sample_rate;
        info!("decoded {} frames ({format})", buffer.frame_count());

        self.enter(Stage::Writing);
        writer.write(&self.config.output, &buffer, sample_rate)?;

        self.enter(Stage::Playing);
        player.play(&self.config.output)?;

        Ok(RunSummary {
            sample_rate,
            channels: buffer.channels(),
            samples: buffer.len(),
            frames: buffer.frame_count(),
            output: self.config.output.clone(),
        })
    }
}

// the handle is dropped before decoding starts
fn read_source(path: &Path) -> PcmResult<Vec<u8>> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}
