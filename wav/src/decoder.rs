//! Bounded PCM amplitude decoding over a sliding data window.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::WavError;
use crate::header::{TargetFormat, WAVE_FORMAT_IEEE_FLOAT, WavHeader};

/// Upper bound on the materialized data window, 16 MiB.
const WINDOW_MAX_BYTES: usize = 1 << 24;

/// Read buffer used while streaming the data chunk.
const READ_BUFFER_BYTES: usize = 1 << 12;

/// Amplitude returned for samples outside the readable stream. Decoded
/// zeros are remapped to this value as well, so a true zero never appears
/// in decoder output.
pub const SENTINEL_AMPLITUDE: f64 = 1.0;

/// Amplitude decoder over a single WAVE file.
///
/// At most [`WINDOW_MAX_BYTES`] of the data chunk are held in memory at a
/// time. Requests past the window re-materialize it; the data chunk is
/// always re-scanned from its first byte, so seeking is linear in the
/// offset, never in the distance moved.
#[derive(Debug)]
pub struct WavDecoder {
    path: PathBuf,
    header: WavHeader,
    data: Vec<u8>,
    data_size: usize,
    window_start: usize,
    window_end: usize,
    end_of_stream: bool,
}

impl WavDecoder {
    /// Opens `path`, parses the header and materializes the first window.
    ///
    /// Streams that do not match `target` are refused before any data is
    /// read. The data chunk size is measured by streaming, so a file
    /// truncated below its declared size reports what is actually there.
    pub fn open(path: impl AsRef<Path>, target: TargetFormat) -> Result<Self, WavError> {
        let path = path.as_ref().to_path_buf();
        let header = WavHeader::decode(File::open(&path)?)?;
        if !header.matches(&target) {
            return Err(WavError::TargetMismatch {
                sample_rate: header.sample_rate,
                bits_per_sample: header.bits_per_sample,
            });
        }

        let mut decoder = Self {
            path,
            header,
            data: Vec::new(),
            data_size: 0,
            window_start: 0,
            window_end: 0,
            end_of_stream: false,
        };
        decoder.data_size = decoder.measure_data_size()?;
        decoder.extract_window(0)?;
        debug!(
            "Opened {} ({} Hz, {}-bit, {} channels, {} data bytes)",
            decoder.path.display(),
            decoder.header.sample_rate,
            decoder.header.bits_per_sample,
            decoder.header.channels,
            decoder.data_size
        );
        Ok(decoder)
    }

    /// Parsed stream metadata.
    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    /// Measured size of the data chunk in bytes.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// Whether the latest amplitude request ran past the readable stream.
    pub fn end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// Total number of samples across all channels.
    pub fn num_samples(&self) -> usize {
        self.data_size / usize::from(self.header.bytes_per_sample)
    }

    /// Number of samples in each channel.
    pub fn num_samples_per_channel(&self) -> usize {
        self.num_samples() / usize::from(self.header.channels)
    }

    /// Stream duration in milliseconds, from the measured data size and
    /// the declared byte rate.
    pub fn total_time_ms(&self) -> u64 {
        if self.header.byte_rate == 0 {
            return 0;
        }
        self.data_size as u64 * 1000 / u64::from(self.header.byte_rate)
    }

    /// Sample index at `time_ms`, by linear proportion over the stream.
    pub fn sample_from_time(&self, time_ms: u64) -> usize {
        let total = self.total_time_ms();
        if total == 0 {
            return 0;
        }
        (self.num_samples_per_channel() as f64 / total as f64 * time_ms as f64) as usize
    }

    /// Decodes an inclusive sample range from the first channel.
    pub fn amplitudes(&mut self, samples: RangeInclusive<usize>) -> Result<Vec<f64>, WavError> {
        self.amplitudes_chunk(1, samples)
    }

    /// Decodes an inclusive sample range from one channel, 1-based.
    ///
    /// A range reaching beyond the current window but still inside the
    /// stream re-materializes the window first. Samples that cannot be
    /// read decode to [`SENTINEL_AMPLITUDE`] and raise the end-of-stream
    /// flag instead of failing the call.
    pub fn amplitudes_chunk(
        &mut self,
        channel: u16,
        samples: RangeInclusive<usize>,
    ) -> Result<Vec<f64>, WavError> {
        let initial = *samples.start();
        let last = *samples.end();
        if last < initial {
            return Ok(Vec::new());
        }
        let initial_byte = self.byte_position(initial);
        let final_byte = self.byte_position(last);
        if final_byte > self.window_end && final_byte < self.data_size {
            self.extract_window(initial)?;
        }

        let channels = usize::from(self.header.channels);
        let bytes_per_sample = usize::from(self.header.bytes_per_sample);
        let count = last - initial + 1;
        let Some(mut offset) = initial_byte.checked_sub(self.window_start) else {
            // request starts before the materialized window
            self.end_of_stream = true;
            return Ok(vec![SENTINEL_AMPLITUDE; count]);
        };

        let mut amplitudes = vec![0.0; count];
        for slot in amplitudes.iter_mut() {
            for ch in 1..=channels {
                if ch == usize::from(channel) {
                    *slot = match self.decode_sample(offset) {
                        Some(amplitude) => amplitude,
                        None => {
                            self.end_of_stream = true;
                            SENTINEL_AMPLITUDE
                        }
                    };
                }
                offset += bytes_per_sample;
            }
        }
        Ok(amplitudes)
    }

    /// Materializes the data window starting at `initial_sample`.
    pub fn extract_window(&mut self, initial_sample: usize) -> Result<(), WavError> {
        self.end_of_stream = false;
        let initial_byte = self.byte_position(initial_sample);
        let mut end = initial_byte.saturating_add(WINDOW_MAX_BYTES);
        if end > self.data_size {
            end = self.data_size;
        }
        self.window_start = initial_byte;
        self.window_end = end;
        let size = end.saturating_sub(initial_byte);
        self.data = vec![0u8; size];

        let mut stream = self.open_data_stream()?;
        let mut buffer = [0u8; READ_BUFFER_BYTES];
        let mut seen = 0usize;
        let mut filled = 0usize;
        while filled < size {
            let n = stream.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            let chunk_start = seen;
            seen += n;
            if seen <= initial_byte {
                continue;
            }
            let from = initial_byte.saturating_sub(chunk_start);
            let take = (n - from).min(size - filled);
            self.data[filled..filled + take].copy_from_slice(&buffer[from..from + take]);
            filled += take;
        }
        debug!(
            "Materialized window [{}, {}) of {} data bytes",
            self.window_start, self.window_end, self.data_size
        );
        Ok(())
    }

    fn byte_position(&self, sample: usize) -> usize {
        sample * usize::from(self.header.channels) * usize::from(self.header.bytes_per_sample)
    }

    fn open_data_stream(&self) -> Result<File, WavError> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.header.data_offset as u64))?;
        Ok(file)
    }

    fn measure_data_size(&self) -> Result<usize, WavError> {
        let mut stream = self.open_data_stream()?;
        let declared = self.header.data_size as usize;
        let mut buffer = [0u8; READ_BUFFER_BYTES];
        let mut total = 0usize;
        loop {
            let n = stream.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            total += n;
            if total >= declared {
                total = declared;
                break;
            }
        }
        Ok(total)
    }

    fn decode_sample(&self, offset: usize) -> Option<f64> {
        let width = usize::from(self.header.bytes_per_sample);
        let bytes = self.data.get(offset..offset + width)?;
        let amplitude = match self.header.bits_per_sample {
            8 => i32::from(bytes[0]) - 128,
            16 => i32::from(i16::from_le_bytes([bytes[0], bytes[1]])),
            24 => {
                i32::from(bytes[0]) | i32::from(bytes[1]) << 8 | i32::from(bytes[2] as i8) << 16
            }
            32 => {
                let raw = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                if self.header.audio_format == WAVE_FORMAT_IEEE_FLOAT {
                    (f32::from_bits(raw as u32) * 2_147_483_647.0) as i32
                } else {
                    raw
                }
            }
            _ => return None,
        };
        let amplitude = if amplitude == 0 { 1 } else { amplitude };
        Some(f64::from(amplitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn wav_bytes(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let byte_rate = sample_rate * u32::from(channels) * 2;
        let block_align = channels * 2;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&byte_rate.to_le_bytes());
        bytes.extend_from_slice(&block_align.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    fn write_temp(name: &str, bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("sonid-wav-{}-{}.wav", std::process::id(), name));
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn decodes_known_samples() {
        let path = write_temp(
            "known",
            &wav_bytes(48_000, 1, &[100, -200, 0, 32767, -32768]),
        );
        let mut wav = WavDecoder::open(&path, TargetFormat::default()).unwrap();

        assert_eq!(wav.num_samples(), 5);
        assert_eq!(wav.num_samples_per_channel(), 5);
        let amplitudes = wav.amplitudes(0..=4).unwrap();
        // the zero sample is remapped to the sentinel value
        assert_eq!(amplitudes, vec![100.0, -200.0, 1.0, 32767.0, -32768.0]);
        assert!(!wav.end_of_stream());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn refuses_untargeted_format() {
        let path = write_temp("gate", &wav_bytes(44_100, 1, &[1, 2, 3]));
        let err = WavDecoder::open(&path, TargetFormat::default()).unwrap_err();
        assert!(matches!(
            err,
            WavError::TargetMismatch {
                sample_rate: 44_100,
                bits_per_sample: 16
            }
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn reads_past_stream_end_become_sentinels() {
        let path = write_temp("eof", &wav_bytes(48_000, 1, &[5, 6]));
        let mut wav = WavDecoder::open(&path, TargetFormat::default()).unwrap();

        let amplitudes = wav.amplitudes(0..=4).unwrap();
        assert_eq!(amplitudes, vec![5.0, 6.0, 1.0, 1.0, 1.0]);
        assert!(wav.end_of_stream());

        // a later in-range request clears nothing but reads normally
        let amplitudes = wav.amplitudes(0..=1).unwrap();
        assert_eq!(amplitudes, vec![5.0, 6.0]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn separates_stereo_channels() {
        // interleaved L/R pairs
        let path = write_temp("stereo", &wav_bytes(48_000, 2, &[10, -10, 20, -20, 30, -30]));
        let mut wav = WavDecoder::open(&path, TargetFormat::default()).unwrap();

        assert_eq!(wav.num_samples(), 6);
        assert_eq!(wav.num_samples_per_channel(), 3);
        assert_eq!(
            wav.amplitudes_chunk(1, 0..=2).unwrap(),
            vec![10.0, 20.0, 30.0]
        );
        assert_eq!(
            wav.amplitudes_chunk(2, 0..=2).unwrap(),
            vec![-10.0, -20.0, -30.0]
        );
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn durations_from_byte_rate() {
        let samples = vec![1i16; 48_000];
        let path = write_temp("duration", &wav_bytes(48_000, 1, &samples));
        let wav = WavDecoder::open(&path, TargetFormat::default()).unwrap();

        assert_eq!(wav.total_time_ms(), 1000);
        assert_eq!(wav.sample_from_time(500), 24_000);
        assert_eq!(wav.sample_from_time(0), 0);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn truncated_data_chunk_reports_measured_size() {
        let mut bytes = wav_bytes(48_000, 1, &[1, 2, 3, 4]);
        bytes.truncate(bytes.len() - 4);
        let path = write_temp("truncated", &bytes);
        let wav = WavDecoder::open(&path, TargetFormat::default()).unwrap();

        // declared 8 bytes, only 4 present
        assert_eq!(wav.header().data_size, 8);
        assert_eq!(wav.data_size(), 4);
        assert_eq!(wav.num_samples(), 2);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn rescans_to_a_later_window() {
        // data larger than one window: 2^24 + 4096 bytes of 16-bit samples
        let total_samples = (WINDOW_MAX_BYTES + 4096) / 2;
        let samples: Vec<i16> = (0..total_samples).map(|i| (i % 30_000) as i16).collect();
        let path = write_temp("rescan", &wav_bytes(48_000, 1, &samples));
        let mut wav = WavDecoder::open(&path, TargetFormat::default()).unwrap();

        let first = total_samples - 10;
        let amplitudes = wav.amplitudes(first..=total_samples - 1).unwrap();
        assert!(!wav.end_of_stream());
        for (i, amplitude) in amplitudes.iter().enumerate() {
            let mut expected = ((first + i) % 30_000) as f64;
            if expected == 0.0 {
                expected = 1.0;
            }
            assert_eq!(*amplitude, expected);
        }
        std::fs::remove_file(path).ok();
    }
}
