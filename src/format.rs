use std::fmt;

use crate::decode_helpers::{PcmError, PcmResult};

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_CHANNELS: u16 = 1;

// supported sample widths
//
// raw captures carry no header, so this is all we have to go on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    #[default]
    Sixteen,
    ThirtyTwo,
}

impl BitDepth {
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Sixteen => 16,
            BitDepth::ThirtyTwo => 32,
        }
    }

    /// Width of one sample in bytes.
    pub fn bytes(self) -> usize {
        match self {
            BitDepth::Sixteen => 2,
            BitDepth::ThirtyTwo => 4,
        }
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = PcmError;

    fn try_from(bits: u16) -> PcmResult<Self> {
        match bits {
            16 => Ok(BitDepth::Sixteen),
            32 => Ok(BitDepth::ThirtyTwo),
            other => Err(PcmError::InvalidFormat(format!(
                "unsupported bit depth {other} (expected 16 or 32)"
            ))),
        }
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Format descriptor for a headerless PCM capture.
///
/// `sample_rate` is carried along untouched; nothing here checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: BitDepth,
}

impl PcmFormat {
    pub fn new(sample_rate: u32, channels: u16, bits: u16) -> PcmResult<Self> {
        let bit_depth = BitDepth::try_from(bits)?;

        if channels == 0 {
            return Err(PcmError::InvalidFormat(
                "channel count must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            sample_rate,
            channels,
            bit_depth,
        })
    }

    /// Bytes per frame (one sample for every channel).
    pub fn frame_width(&self) -> usize {
        self.bit_depth.bytes() * self.channels as usize
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bit_depth: BitDepth::Sixteen,
        }
    }
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {}",
            self.sample_rate, self.channels, self.bit_depth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let f = PcmFormat::default();
        assert_eq!(f.sample_rate, 44100);
        assert_eq!(f.channels, 1);
        assert_eq!(f.bit_depth, BitDepth::Sixteen);
        assert_eq!(f.frame_width(), 2);
    }

    #[test]
    fn only_16_and_32_bits() {
        assert_eq!(BitDepth::try_from(16).unwrap(), BitDepth::Sixteen);
        assert_eq!(BitDepth::try_from(32).unwrap(), BitDepth::ThirtyTwo);

        for bad in [0u16, 8, 24, 64] {
            match BitDepth::try_from(bad) {
                Err(PcmError::InvalidFormat(msg)) => assert!(msg.contains(&bad.to_string())),
                other => panic!("expected InvalidFormat for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn zero_channels_rejected() {
        assert!(matches!(
            PcmFormat::new(44100, 0, 16),
            Err(PcmError::InvalidFormat(_))
        ));
    }

    #[test]
    fn frame_width_scales_with_channels() {
        let f = PcmFormat::new(48000, 6, 32).unwrap();
        assert_eq!(f.frame_width(), 24);
        assert_eq!(f.to_string(), "48000 Hz, 6 ch, 32-bit");
    }
}
