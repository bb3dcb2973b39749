//! Play headerless PCM captures.
//!
//! A raw capture is decoded with a caller-supplied [`PcmFormat`], written out
//! as a WAV file and played on the default audio device:
//!
//! ```no_run
//! use pcmplay::{AlsaPlayer, Pipeline, PipelineConfig, WavWriter};
//!
//! let config = PipelineConfig::new("capture.pcm").with_output("capture.wav");
//! Pipeline::new(config).run(&mut WavWriter, &mut AlsaPlayer::new())?;
//! # Ok::<(), pcmplay::PcmError>(())
//! ```

pub mod decode_helpers;
pub mod format;
pub mod pcm;
pub mod pipeline;
pub mod playback;
pub mod wav;

pub use decode_helpers::{PcmError, PcmResult};
pub use format::{BitDepth, PcmFormat};
pub use pcm::{Layout, PcmSample, SampleBuffer, Samples, decode, decode_with};
pub use pipeline::{ContainerWriter, Pipeline, PipelineConfig, RunSummary, Stage, WavWriter};
pub use playback::{AlsaPlayer, Player};
