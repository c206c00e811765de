//! RIFF/WAVE header parsing.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::WavError;

/// Fixed parse buffer; headers larger than this are rejected.
const HEADER_BYTE_LENGTH: usize = 64 * 1024;

/// Linear PCM format code.
pub const WAVE_FORMAT_PCM: u16 = 1;

/// IEEE float format code, seen on 32-bit streams.
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;

/// Format every downstream engine expects, 48 kHz / 16-bit by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFormat {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl Default for TargetFormat {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            bits_per_sample: 16,
        }
    }
}

/// Parsed WAVE format metadata.
///
/// Field names follow the canonical RIFF layout. `data_offset` is the byte
/// position of the first PCM sample in the stream and `data_size` the size
/// the data chunk declares, which a truncated file may not actually hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WavHeader {
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub bytes_per_sample: u16,
    #[serde(skip)]
    pub extra_params: Vec<u8>,
    pub data_size: u32,
    #[serde(skip)]
    pub data_offset: usize,
}

impl WavHeader {
    /// Parses a WAVE header from the start of `reader`.
    ///
    /// At most [`HEADER_BYTE_LENGTH`] bytes are consumed. Chunks between
    /// the `fmt ` and `data` chunks are skipped over; tag comparison is
    /// case-insensitive. Only linear PCM streams with a sample width of
    /// 8, 16, 24 or 32 bits are accepted.
    pub fn decode<R: Read>(mut reader: R) -> Result<Self, WavError> {
        let mut buffer = vec![0u8; HEADER_BYTE_LENGTH];
        let mut filled = 0;
        loop {
            let n = reader.read(&mut buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
            if filled == buffer.len() {
                break;
            }
        }

        let mut cursor = HeaderCursor {
            buffer: &buffer,
            position: 0,
        };
        if cursor.tag()? != *b"RIFF" {
            return Err(WavError::BadContainerTag);
        }
        let _riff_size = cursor.u32_le()?;
        if cursor.tag()? != *b"WAVE" {
            return Err(WavError::BadFormatTag);
        }

        seek_chunk(&mut cursor, "fmt ")?;
        let fmt_size = cursor.u32_le()?;
        let audio_format = cursor.u16_le()?;
        if audio_format != WAVE_FORMAT_PCM {
            return Err(WavError::UnsupportedFormat { code: audio_format });
        }
        let channels = cursor.u16_le()?;
        let sample_rate = cursor.u32_le()?;
        let byte_rate = cursor.u32_le()?;
        let block_align = cursor.u16_le()?;
        let bits_per_sample = cursor.u16_le()?;
        if !matches!(bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(WavError::UnsupportedBitDepth {
                bits: bits_per_sample,
            });
        }
        let mut extra_params = Vec::new();
        if fmt_size > 16 {
            let extra_len = cursor.u16_le()? as usize;
            extra_params = cursor.take(extra_len)?.to_vec();
        }

        seek_chunk(&mut cursor, "data")?;
        let data_size = cursor.u32_le()?;
        let data_offset = cursor.position;

        Ok(Self {
            audio_format,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            bytes_per_sample: bits_per_sample / 8,
            extra_params,
            data_size,
            data_offset,
        })
    }

    /// Whether the stream format matches the pipeline target.
    pub fn matches(&self, target: &TargetFormat) -> bool {
        self.sample_rate == target.sample_rate && self.bits_per_sample == target.bits_per_sample
    }
}

struct HeaderCursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl HeaderCursor<'_> {
    fn take(&mut self, len: usize) -> Result<&[u8], WavError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.buffer.len())
            .ok_or(WavError::TruncatedHeader)?;
        let slice = &self.buffer[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), WavError> {
        self.take(len).map(|_| ())
    }

    fn tag(&mut self) -> Result<[u8; 4], WavError> {
        let slice = self.take(4)?;
        Ok([slice[0], slice[1], slice[2], slice[3]])
    }

    fn u32_le(&mut self) -> Result<u32, WavError> {
        let slice = self.take(4)?;
        Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
    }

    fn u16_le(&mut self) -> Result<u16, WavError> {
        let slice = self.take(2)?;
        Ok(u16::from_le_bytes([slice[0], slice[1]]))
    }
}

/// Advances the cursor past unrelated chunks until `chunk` is found.
fn seek_chunk(cursor: &mut HeaderCursor<'_>, chunk: &'static str) -> Result<(), WavError> {
    loop {
        let tag = cursor
            .tag()
            .map_err(|_| WavError::ChunkNotFound { chunk })?;
        if tag.eq_ignore_ascii_case(chunk.as_bytes()) {
            return Ok(());
        }
        let size = cursor
            .u32_le()
            .map_err(|_| WavError::ChunkNotFound { chunk })? as usize;
        cursor
            .skip(size)
            .map_err(|_| WavError::ChunkNotFound { chunk })?;
    }
}
