use std::path::Path;

use crate::decode_helpers::PcmResult;

/// Loads a container file and plays it to the end.
pub trait Player {
    /// Blocks until the device has played every frame.
    fn play(&mut self, path: &Path) -> PcmResult<()>;
}

#[cfg(feature = "alsa")]
pub use alsa_output::AlsaPlayer;

#[cfg(not(feature = "alsa"))]
pub use no_output::AlsaPlayer;

#[cfg(feature = "alsa")]
mod alsa_output {
    use alsa_sys::*;
    use libc::{c_int, c_uint, c_void, EAGAIN, EINTR, EPIPE, ESTRPIPE};
    use log::{debug, info, warn};
    use std::{ffi::CStr, ffi::CString, path::Path, ptr};

    use super::Player;
    use crate::decode_helpers::{PcmError, PcmResult};
    use crate::format::BitDepth;
    use crate::pcm::{PcmSample, Samples};
    use crate::wav;

    const DEVICE: &str = "default";
    // frames handed to snd_pcm_writei per call
    const CHUNK_FRAMES: usize = 4096;
    const LATENCY_US: c_uint = 500_000;

    // check error codes for alsa
    //
    fn check_code(code: c_int, ctx: &str) -> PcmResult<c_int> {
        if code < 0 {
            let msg = unsafe { CStr::from_ptr(snd_strerror(code)) };
            return Err(PcmError::Device(format!("{ctx}: {}", msg.to_string_lossy())));
        }
        Ok(code)
    }

    fn native_format(depth: BitDepth) -> snd_pcm_format_t {
        match (depth, cfg!(target_endian = "little")) {
            (BitDepth::Sixteen, true) => SND_PCM_FORMAT_S16_LE,
            (BitDepth::Sixteen, false) => SND_PCM_FORMAT_S16_BE,
            (BitDepth::ThirtyTwo, true) => SND_PCM_FORMAT_S32_LE,
            (BitDepth::ThirtyTwo, false) => SND_PCM_FORMAT_S32_BE,
        }
    }

    // open playback handle, closed on drop
    //
    struct PcmHandle(*mut snd_pcm_t);

    impl PcmHandle {
        fn open(name: &str) -> PcmResult<Self> {
            let dev = CString::new(name)
                .map_err(|_| PcmError::Device(format!("bad device name {name:?}")))?;
            let mut handle: *mut snd_pcm_t = ptr::null_mut();

            // blocking mode: writei waits for room, drain waits for the end
            check_code(
                unsafe { snd_pcm_open(&mut handle, dev.as_ptr(), SND_PCM_STREAM_PLAYBACK, 0) },
                "snd_pcm_open",
            )?;

            Ok(Self(handle))
        }

        fn configure(&self, depth: BitDepth, channels: u16, rate: u32) -> PcmResult<()> {
            check_code(
                unsafe {
                    snd_pcm_set_params(
                        self.0,
                        native_format(depth),
                        SND_PCM_ACCESS_RW_INTERLEAVED,
                        channels as c_uint,
                        rate as c_uint,
                        1,
                        LATENCY_US,
                    )
                },
                "snd_pcm_set_params",
            )?;
            Ok(())
        }

        fn write_all<T: PcmSample>(&self, samples: &[T], channels: usize) -> PcmResult<()> {
            let mut frames_left = samples.len() / channels;
            let mut cursor = 0usize;

            while frames_left > 0 {
                let frames = frames_left.min(CHUNK_FRAMES);
                let chunk = &samples[cursor * channels..];

                let written = unsafe {
                    snd_pcm_writei(
                        self.0,
                        chunk.as_ptr() as *const c_void,
                        frames as snd_pcm_uframes_t,
                    )
                };

                if written < 0 {
                    let code = written as c_int;
                    if code == -EAGAIN || code == -EINTR {
                        continue;
                    }
                    if code == -EPIPE || code == -ESTRPIPE {
                        warn!("underrun after {cursor} frames, recovering");
                    }
                    check_code(unsafe { snd_pcm_recover(self.0, code, 1) }, "snd_pcm_writei")?;
                    continue;
                }

                cursor += written as usize;
                frames_left -= written as usize;
            }

            Ok(())
        }

        fn drain(&self) -> PcmResult<()> {
            check_code(unsafe { snd_pcm_drain(self.0) }, "snd_pcm_drain")?;
            Ok(())
        }
    }

    impl Drop for PcmHandle {
        fn drop(&mut self) {
            unsafe {
                snd_pcm_close(self.0);
            }
        }
    }

    /// Plays WAV files on the host's default ALSA device.
    #[derive(Debug, Default)]
    pub struct AlsaPlayer;

    impl AlsaPlayer {
        pub fn new() -> Self {
            Self
        }
    }

    impl Player for AlsaPlayer {
        fn play(&mut self, path: &Path) -> PcmResult<()> {
            let wav = wav::read(path)?;
            let buffer = &wav.buffer;
            let channels = buffer.channels();

            if buffer.is_empty() {
                info!("{} holds no frames, nothing to play", path.display());
                return Ok(());
            }

            let handle = PcmHandle::open(DEVICE)?;
            handle.configure(buffer.bit_depth(), channels, wav.spec.sample_rate)?;
            debug!(
                "opened '{DEVICE}' for {} Hz, {} ch, {}",
                wav.spec.sample_rate,
                channels,
                buffer.bit_depth()
            );

            match buffer.samples() {
                Samples::I16(v) => handle.write_all(v, channels as usize)?,
                Samples::I32(v) => handle.write_all(v, channels as usize)?,
            }
            handle.drain()?;

            info!("played {} frames from {}", buffer.frame_count(), path.display());
            Ok(())
        }
    }
}

#[cfg(not(feature = "alsa"))]
mod no_output {
    use std::path::Path;

    use super::Player;
    use crate::decode_helpers::{PcmError, PcmResult};

    /// Stand-in when built without the `alsa` feature; always fails.
    #[derive(Debug, Default)]
    pub struct AlsaPlayer;

    impl AlsaPlayer {
        pub fn new() -> Self {
            Self
        }
    }

    impl Player for AlsaPlayer {
        fn play(&mut self, path: &Path) -> PcmResult<()> {
            Err(PcmError::Device(format!(
                "built without audio output, cannot play {}",
                path.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_helpers::PcmError;

    // a missing file must fail before any device is touched
    #[test]
    fn missing_file_fails_before_device() {
        let dir = tempfile::tempdir().unwrap();
        let err = AlsaPlayer::new().play(&dir.path().join("absent.wav")).unwrap_err();

        if cfg!(feature = "alsa") {
            assert!(matches!(err, PcmError::Io(_)));
        } else {
            assert!(matches!(err, PcmError::Device(_)));
        }
        assert!(err.is_io_failure());
    }

    #[test]
    fn non_wav_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.wav");
        std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();

        let err = AlsaPlayer::new().play(&path).unwrap_err();
        assert!(err.is_io_failure());
    }
}
