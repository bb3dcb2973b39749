use thiserror::Error;

#[derive(Error, Debug)]
pub enum PcmError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("truncated input: {len} bytes is not a multiple of the {width}-byte {unit}")]
    TruncatedInput {
        len: usize,
        width: usize,
        unit: &'static str,
    },

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("audio device failure: {0}")]
    Device(String),

    #[error("invalid container: {0}")]
    InvalidContainer(String),

    #[error("pipeline has already run")]
    AlreadyRun,
}

impl PcmError {
    /// Source/destination file or audio device trouble, as opposed to a
    /// problem with the declared format or the input's shape.
    pub fn is_io_failure(&self) -> bool {
        matches!(
            self,
            PcmError::Io(_) | PcmError::Device(_) | PcmError::InvalidContainer(_)
        )
    }
}

pub type PcmResult<T> = Result<T, PcmError>;

// helpers for reading RIFF fields
//
// parse num bytes little-endian into an unsigned value
//
pub fn parse_bytes<I>(bytes: &mut I, num: usize) -> PcmResult<u32>
where
    I: Iterator<Item = u8>,
{
    let mut value: u32 = 0;

    for i in 0..num {
        let b = bytes
            .next()
            .ok_or_else(|| PcmError::InvalidContainer("unexpected end of file".to_string()))?;
        value |= (b as u32) << (i as u32 * 8);
    }

    Ok(value)
}
//
// four-character chunk ids
pub fn take_id<I>(bytes: &mut I) -> PcmResult<[u8; 4]>
where
    I: Iterator<Item = u8>,
{
    let mut id = [0u8; 4];
    for slot in id.iter_mut() {
        *slot = bytes
            .next()
            .ok_or_else(|| PcmError::InvalidContainer("unexpected end of file".to_string()))?;
    }
    Ok(id)
}
