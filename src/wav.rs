use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info, warn};

use crate::decode_helpers::{PcmError, PcmResult, parse_bytes, take_id};
use crate::format::PcmFormat;
use crate::pcm::{self, SampleBuffer};

// RIFF + fmt (16) + data headers
pub const HEADER_LEN: usize = 44;
const FMT_PCM_LEN: u32 = 16;

// format codes
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCode {
    WaveFormatPcm = 0x0001,
    WaveFormatIeeeFloat = 0x0003,
    WaveFormatAlaw = 0x0006,
    WaveFormatMulaw = 0x0007,
    WaveFormatExtensible = 0xFFFE,
}

impl FormatCode {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::WaveFormatPcm),
            0x0003 => Some(Self::WaveFormatIeeeFloat),
            0x0006 => Some(Self::WaveFormatAlaw),
            0x0007 => Some(Self::WaveFormatMulaw),
            0xFFFE => Some(Self::WaveFormatExtensible),
            _ => None,
        }
    }
}

/// Contents of a `fmt ` chunk, after resolving EXTENSIBLE to its subformat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub format_code: FormatCode,
    pub channels: u16,
    pub sample_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WavSpec {
    pub fn pcm_format(&self) -> PcmResult<PcmFormat> {
        if self.format_code != FormatCode::WaveFormatPcm {
            return Err(PcmError::InvalidContainer(format!(
                "unsupported format code {:?}",
                self.format_code
            )));
        }

        let format = PcmFormat::new(self.sample_rate, self.channels, self.bits_per_sample)?;
        if format.frame_width() != self.block_align as usize {
            return Err(PcmError::InvalidContainer(format!(
                "block align {} does not match {}",
                self.block_align, format
            )));
        }

        Ok(format)
    }
}

/// A loaded container: its header and the decoded data chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavFile {
    pub spec: WavSpec,
    pub buffer: SampleBuffer,
}

fn data_size(data_len: usize) -> PcmResult<u32> {
    u32::try_from(data_len)
        .ok()
        .filter(|n| *n <= u32::MAX - 36)
        .ok_or_else(|| {
            PcmError::InvalidFormat(format!("{data_len} bytes of audio do not fit in a WAV file"))
        })
}

fn header(buffer: &SampleBuffer, sample_rate: u32) -> PcmResult<[u8; HEADER_LEN]> {
    let bytes_per_sample = buffer.bit_depth().bytes();
    let data_size = data_size(buffer.len() * bytes_per_sample)?;

    let channels = buffer.channels();
    let block_align = u16::try_from(channels as usize * bytes_per_sample).map_err(|_| {
        PcmError::InvalidFormat(format!(
            "{channels} channels of {} exceed the WAV block align field",
            buffer.bit_depth()
        ))
    })?;
    let byte_rate = sample_rate.checked_mul(block_align as u32).ok_or_else(|| {
        PcmError::InvalidFormat(format!("byte rate overflows at {sample_rate} Hz"))
    })?;

    let mut h = [0u8; HEADER_LEN];
    h[0..4].copy_from_slice(b"RIFF");
    h[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    h[8..12].copy_from_slice(b"WAVE");

    h[12..16].copy_from_slice(b"fmt ");
    h[16..20].copy_from_slice(&FMT_PCM_LEN.to_le_bytes());
    h[20..22].copy_from_slice(&(FormatCode::WaveFormatPcm as u16).to_le_bytes());
    h[22..24].copy_from_slice(&channels.to_le_bytes());
    h[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    h[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    h[32..34].copy_from_slice(&block_align.to_le_bytes());
    h[34..36].copy_from_slice(&buffer.bit_depth().bits().to_le_bytes());

    h[36..40].copy_from_slice(b"data");
    h[40..44].copy_from_slice(&data_size.to_le_bytes());

    Ok(h)
}

/// Serialise `buffer` as a complete WAV image.
pub fn encode(buffer: &SampleBuffer, sample_rate: u32) -> PcmResult<Vec<u8>> {
    let h = header(buffer, sample_rate)?;
    let mut out = Vec::with_capacity(HEADER_LEN + buffer.len() * buffer.bit_depth().bytes());
    out.extend_from_slice(&h);
    out.extend_from_slice(&buffer.to_le_bytes());
    Ok(out)
}

pub fn write(path: &Path, buffer: &SampleBuffer, sample_rate: u32) -> PcmResult<()> {
    let image = encode(buffer, sample_rate)?;

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&image)?;
    out.flush()?;

    info!(
        "wrote {} ({} bytes, {} Hz, {} ch, {})",
        path.display(),
        image.len(),
        sample_rate,
        buffer.channels(),
        buffer.bit_depth()
    );

    Ok(())
}

fn skip<I>(reader: &mut I, n: usize) -> PcmResult<()>
where
    I: Iterator<Item = u8>,
{
    if reader.take(n).count() != n {
        return Err(PcmError::InvalidContainer("unexpected end of file".to_string()));
    }
    Ok(())
}

fn parse_fmt<I>(reader: &mut I, size: u32) -> PcmResult<WavSpec>
where
    I: Iterator<Item = u8>,
{
    if size < FMT_PCM_LEN {
        return Err(PcmError::InvalidContainer(format!("fmt chunk too short ({size} bytes)")));
    }

    let raw_tag = parse_bytes(reader, 2)? as u16;
    let Some(mut format_code) = FormatCode::from_u16(raw_tag) else {
        return Err(PcmError::InvalidContainer(format!(
            "unrecognized format code {raw_tag:#06x}"
        )));
    };

    let channels = parse_bytes(reader, 2)? as u16;
    let sample_rate = parse_bytes(reader, 4)?;
    let _byte_rate = parse_bytes(reader, 4)?;
    let block_align = parse_bytes(reader, 2)? as u16;
    let bits_per_sample = parse_bytes(reader, 2)? as u16;
    let mut consumed = FMT_PCM_LEN;

    // extension is either 0 or 22
    if size >= 18 {
        let cb_size = parse_bytes(reader, 2)?;
        consumed += 2;

        if format_code == FormatCode::WaveFormatExtensible {
            if cb_size < 22 || size < 40 {
                return Err(PcmError::InvalidContainer(
                    "extensible fmt chunk without subformat".to_string(),
                ));
            }
            let valid_bits = parse_bytes(reader, 2)?;
            let _channel_mask = parse_bytes(reader, 4)?;
            // first two bytes of the subformat GUID carry the real code
            let sub = parse_bytes(reader, 2)? as u16;
            skip(reader, 14)?;
            consumed += 22;

            if valid_bits != 0 && valid_bits != bits_per_sample as u32 {
                warn!("ignoring valid-bits {valid_bits} for {bits_per_sample}-bit container");
            }

            format_code = FormatCode::from_u16(sub).ok_or_else(|| {
                PcmError::InvalidContainer(format!("unrecognized subformat {sub:#06x}"))
            })?;
        }
    }

    // plus the pad byte of an odd-sized chunk
    skip(reader, (size - consumed) as usize + (size as usize & 1))?;

    Ok(WavSpec {
        format_code,
        channels,
        sample_rate,
        block_align,
        bits_per_sample,
    })
}

/// Parse a WAV image and decode its data chunk.
pub fn parse(bytes: &[u8]) -> PcmResult<WavFile> {
    let mut reader = bytes.iter().copied();

    if &take_id(&mut reader)? != b"RIFF" {
        return Err(PcmError::InvalidContainer("missing RIFF id".to_string()));
    }
    let riff_size = parse_bytes(&mut reader, 4)?;
    if &take_id(&mut reader)? != b"WAVE" {
        return Err(PcmError::InvalidContainer("missing WAVE id".to_string()));
    }
    debug!("RIFF size {riff_size}, file size {}", bytes.len());

    let mut spec: Option<WavSpec> = None;

    loop {
        let id = take_id(&mut reader).map_err(|_| {
            PcmError::InvalidContainer("no data chunk".to_string())
        })?;
        let size = parse_bytes(&mut reader, 4)?;
        debug!("chunk {:?} ({size} bytes)", String::from_utf8_lossy(&id));

        match &id {
            b"fmt " => {
                spec = Some(parse_fmt(&mut reader, size)?);
            }
            b"data" => {
                let Some(spec) = spec else {
                    return Err(PcmError::InvalidContainer(
                        "data chunk before fmt chunk".to_string(),
                    ));
                };
                let format = spec.pcm_format()?;

                let data: Vec<u8> = reader.by_ref().take(size as usize).collect();
                if data.len() != size as usize {
                    return Err(PcmError::InvalidContainer(format!(
                        "data chunk declares {size} bytes, file holds {}",
                        data.len()
                    )));
                }

                let buffer = pcm::decode_with(&data, &format).map_err(|err| match err {
                    PcmError::TruncatedInput { len, width, .. } => PcmError::InvalidContainer(
                        format!("data chunk of {len} bytes is not a whole number of {width}-byte frames"),
                    ),
                    other => other,
                })?;
                return Ok(WavFile { spec, buffer });
            }
            _ => {
                // chunks are word aligned
                skip(&mut reader, size as usize + (size as usize & 1))?;
            }
        }
    }
}

pub fn read(path: &Path) -> PcmResult<WavFile> {
    let bytes = fs::read(path)?;
    parse(&bytes)
}
