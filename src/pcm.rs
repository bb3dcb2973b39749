use std::fmt;
use std::slice::ChunksExact;

use log::debug;

use crate::decode_helpers::{PcmError, PcmResult};
use crate::format::{BitDepth, PcmFormat};

/// Decoded samples, tagged by their integer width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Samples {
    I16(Vec<i16>),
    I32(Vec<i32>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::I16(v) => v.len(),
            Samples::I32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bit_depth(&self) -> BitDepth {
        match self {
            Samples::I16(_) => BitDepth::Sixteen,
            Samples::I32(_) => BitDepth::ThirtyTwo,
        }
    }
}

/// How the flat samples are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Mono: a plain sequence, no frame structure.
    Flat,
    /// Frames of `channels` consecutive samples, channel 0 first.
    Interleaved { channels: u16 },
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for i16 {}
    impl Sealed for i32 {}
}

/// Signed integer types a PCM element can decode to: `i16` and `i32`.
///
/// Sealed; `from_le_chunk` is only ever fed `chunks_exact` slices of the
/// right width from inside this crate.
pub trait PcmSample: sealed::Sealed + Copy + fmt::Debug + PartialEq + Sized {
    const BIT_DEPTH: BitDepth;

    /// `chunk` is exactly `BIT_DEPTH.bytes()` long.
    fn from_le_chunk(chunk: &[u8]) -> Self;

    fn extend_le(self, out: &mut Vec<u8>);

    fn view(samples: &Samples) -> Option<&[Self]>;

    fn wrap(values: Vec<Self>) -> Samples;
}

impl PcmSample for i16 {
    const BIT_DEPTH: BitDepth = BitDepth::Sixteen;

    #[inline]
    fn from_le_chunk(chunk: &[u8]) -> Self {
        i16::from_le_bytes([chunk[0], chunk[1]])
    }

    #[inline]
    fn extend_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn view(samples: &Samples) -> Option<&[Self]> {
        match samples {
            Samples::I16(v) => Some(v),
            _ => None,
        }
    }

    fn wrap(values: Vec<Self>) -> Samples {
        Samples::I16(values)
    }
}

impl PcmSample for i32 {
    const BIT_DEPTH: BitDepth = BitDepth::ThirtyTwo;

    #[inline]
    fn from_le_chunk(chunk: &[u8]) -> Self {
        i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
    }

    #[inline]
    fn extend_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn view(samples: &Samples) -> Option<&[Self]> {
        match samples {
            Samples::I32(v) => Some(v),
            _ => None,
        }
    }

    fn wrap(values: Vec<Self>) -> Samples {
        Samples::I32(values)
    }
}

/// Output of the decoder. Built once, read by the writer and the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: Samples,
    layout: Layout,
}

impl SampleBuffer {
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn into_samples(self) -> Samples {
        self.samples
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn channels(&self) -> u16 {
        match self.layout {
            Layout::Flat => 1,
            Layout::Interleaved { channels } => channels,
        }
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.samples.bit_depth()
    }

    /// Flattened sample count across all channels.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of points in time; equals `len()` for mono.
    pub fn frame_count(&self) -> usize {
        self.len() / self.channels() as usize
    }

    /// The flat samples, if they are of type `T`.
    pub fn as_slice<T: PcmSample>(&self) -> Option<&[T]> {
        T::view(&self.samples)
    }

    /// Frames of type `T`. `None` for mono buffers or a width mismatch.
    pub fn frames<T: PcmSample>(&self) -> Option<ChunksExact<'_, T>> {
        match self.layout {
            Layout::Flat => None,
            Layout::Interleaved { channels } => {
                self.as_slice::<T>().map(|s| s.chunks_exact(channels as usize))
            }
        }
    }

    /// Re-serialise to the little-endian byte layout the samples came from.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match &self.samples {
            Samples::I16(v) => to_le(v),
            Samples::I32(v) => to_le(v),
        }
    }
}

fn to_le<T: PcmSample>(values: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * T::BIT_DEPTH.bytes());
    for &v in values {
        v.extend_le(&mut out);
    }
    out
}

fn reinterpret<T: PcmSample>(bytes: &[u8]) -> Samples {
    let values: Vec<T> = bytes
        .chunks_exact(T::BIT_DEPTH.bytes())
        .map(T::from_le_chunk)
        .collect();
    T::wrap(values)
}

/// Reinterpret `bytes` according to `format`.
///
/// Lengths that do not divide into whole samples (or, with more than one
/// channel, whole frames) are rejected with `TruncatedInput`; nothing is
/// silently dropped.
pub fn decode_with(bytes: &[u8], format: &PcmFormat) -> PcmResult<SampleBuffer> {
    let width = format.bit_depth.bytes();
    if bytes.len() % width != 0 {
        return Err(PcmError::TruncatedInput {
            len: bytes.len(),
            width,
            unit: "sample",
        });
    }

    let frame_width = format.frame_width();
    if format.channels > 1 && bytes.len() % frame_width != 0 {
        return Err(PcmError::TruncatedInput {
            len: bytes.len(),
            width: frame_width,
            unit: "frame",
        });
    }

    let samples = match format.bit_depth {
        BitDepth::Sixteen => reinterpret::<i16>(bytes),
        BitDepth::ThirtyTwo => reinterpret::<i32>(bytes),
    };

    let layout = if format.channels > 1 {
        Layout::Interleaved {
            channels: format.channels,
        }
    } else {
        Layout::Flat
    };

    debug!(
        "decoded {} bytes into {} samples ({})",
        bytes.len(),
        samples.len(),
        format
    );

    Ok(SampleBuffer { samples, layout })
}

/// Decode a raw capture; `sample_rate` comes back unchanged.
pub fn decode(
    bytes: &[u8],
    sample_rate: u32,
    channels: u16,
    bit_depth: u16,
) -> PcmResult<(SampleBuffer, u32)> {
    let format = PcmFormat::new(sample_rate, channels, bit_depth)?;
    let buffer = decode_with(bytes, &format)?;
    Ok((buffer, format.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le16(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn le32(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn mono_16bit_scenario() {
        let (buf, rate) = decode(&[0x01, 0x00, 0x02, 0x00], 44100, 1, 16).unwrap();

        assert_eq!(rate, 44100);
        assert_eq!(buf.layout(), Layout::Flat);
        assert_eq!(buf.as_slice::<i16>(), Some(&[1i16, 2][..]));
        assert!(buf.frames::<i16>().is_none());
    }

    #[test]
    fn stereo_16bit_frames() {
        let (buf, _) = decode(&le16(&[1, 2, 3, 4]), 44100, 2, 16).unwrap();

        assert_eq!(buf.layout(), Layout::Interleaved { channels: 2 });
        assert_eq!(buf.frame_count(), 2);
        let frames: Vec<&[i16]> = buf.frames::<i16>().unwrap().collect();
        assert_eq!(frames, vec![&[1i16, 2][..], &[3, 4][..]]);
    }

    #[test]
    fn sample_rate_passes_through() {
        for rate in [0u32, 8000, 22050, 96000, u32::MAX] {
            let (_, out) = decode(&[], rate, 1, 16).unwrap();
            assert_eq!(out, rate);
        }
    }

    #[test]
    fn empty_input_is_empty_buffer() {
        let (buf, _) = decode(b"", 44100, 1, 16).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.frame_count(), 0);

        let (buf, _) = decode(b"", 44100, 4, 32).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.frames::<i32>().unwrap().count(), 0);
    }

    #[test]
    fn unsupported_bit_depth() {
        for bits in [8u16, 24, 0] {
            let err = decode(&[0; 12], 44100, 1, bits).unwrap_err();
            assert!(matches!(err, PcmError::InvalidFormat(_)), "{bits}: {err:?}");
        }
    }

    #[test]
    fn format_checked_before_length() {
        // 3 bytes would also be truncated; the format error wins
        let err = decode(&[0; 3], 44100, 1, 24).unwrap_err();
        assert!(matches!(err, PcmError::InvalidFormat(_)));
    }

    #[test]
    fn partial_sample_rejected() {
        match decode(&[0x01, 0x00, 0x02], 44100, 1, 16) {
            Err(PcmError::TruncatedInput { len, width, unit }) => {
                assert_eq!((len, width, unit), (3, 2, "sample"));
            }
            other => panic!("expected TruncatedInput, got {other:?}"),
        }

        assert!(matches!(
            decode(&[0; 6], 44100, 1, 32),
            Err(PcmError::TruncatedInput { width: 4, .. })
        ));
    }

    #[test]
    fn partial_frame_rejected() {
        // three whole 16-bit samples, but not a whole number of stereo frames
        match decode(&le16(&[1, 2, 3]), 44100, 2, 16) {
            Err(PcmError::TruncatedInput { len, width, unit }) => {
                assert_eq!((len, width, unit), (6, 4, "frame"));
            }
            other => panic!("expected TruncatedInput, got {other:?}"),
        }
    }

    #[test]
    fn values_are_bit_exact() {
        let values = [i16::MIN, -1, 0, 1, 0x1234, i16::MAX];
        let bytes = le16(&values);
        let (buf, _) = decode(&bytes, 8000, 1, 16).unwrap();

        let decoded = buf.as_slice::<i16>().unwrap();
        for (i, chunk) in bytes.chunks_exact(2).enumerate() {
            assert_eq!(decoded[i], i16::from_le_bytes([chunk[0], chunk[1]]));
        }
        assert_eq!(decoded, &values[..]);
        assert_eq!(buf.to_le_bytes(), bytes);
    }

    #[test]
    fn thirty_two_bit_extremes() {
        let values = [i32::MIN, -65536, 0, 0x0102_0304, i32::MAX, -1];
        let (buf, _) = decode(&le32(&values), 48000, 3, 32).unwrap();

        assert_eq!(buf.bit_depth(), BitDepth::ThirtyTwo);
        assert!(buf.as_slice::<i16>().is_none());
        let frames: Vec<&[i32]> = buf.frames::<i32>().unwrap().collect();
        assert_eq!(frames, vec![&values[..3], &values[3..]]);
    }

    #[test]
    fn element_types_match_bit_depths() {
        assert_eq!(<i16 as PcmSample>::BIT_DEPTH, BitDepth::Sixteen);
        assert_eq!(<i32 as PcmSample>::BIT_DEPTH, BitDepth::ThirtyTwo);
        assert_eq!(i16::from_le_chunk(&[0xFE, 0xFF]), -2);
        assert_eq!(i32::from_le_chunk(&[0x04, 0x03, 0x02, 0x01]), 0x0102_0304);
    }

    #[test]
    fn element_count_law() {
        for n in 0..32usize {
            let bytes = vec![0xA5u8; n * 4];
            let (b16, _) = decode(&bytes, 44100, 1, 16).unwrap();
            let (b32, _) = decode(&bytes, 44100, 1, 32).unwrap();
            assert_eq!(b16.len(), bytes.len() / 2);
            assert_eq!(b32.len(), bytes.len() / 4);
        }
    }

    #[test]
    fn frame_i_matches_flat_index() {
        let channels = 5usize;
        let values: Vec<i16> = (0..(channels as i16 * 7)).map(|v| v * 3 - 50).collect();
        let (buf, _) = decode(&le16(&values), 44100, channels as u16, 16).unwrap();

        assert_eq!(buf.frame_count(), values.len() / channels);
        for (frame_index, frame) in buf.frames::<i16>().unwrap().enumerate() {
            assert_eq!(frame.len(), channels);
            for (i, s) in frame.iter().enumerate() {
                assert_eq!(*s, values[frame_index * channels + i]);
            }
        }
    }
}
