use anyhow::Result;
use log::Level::Warn;
use log::{debug, trace};

use crate::log_or_err;
use crate::process::ProbeOptions;
use crate::utils::errors::ContainerError;

pub const RIFF_TAG: [u8; 4] = *b"RIFF";
pub const WAVE_TAG: [u8; 4] = *b"WAVE";
pub const FMT_TAG: [u8; 4] = *b"fmt ";
pub const DATA_TAG: [u8; 4] = *b"data";

pub const WAVE_FORMAT_PCM: u16 = 0x0001;

/// Offset of the format descriptor inside a canonical RIFF/WAVE header.
pub const FMT_DATA_OFFSET: usize = 20;

/// Size of a PCM format descriptor.
pub const FMT_DATA_LEN: usize = 16;

/// Size of a chunk header: 4-byte tag and 4-byte little-endian length.
pub const CHUNK_HEADER_LEN: usize = 8;

/// DTS audio CDs pose as plain CD audio.
pub const CD_CHANNELS: u16 = 2;
pub const CD_SAMPLE_RATE: u32 = 44100;
pub const CD_BITS_PER_SAMPLE: u16 = 16;

fn le_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn le_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// PCM format descriptor of a `fmt ` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WaveFormat {
    pub fn read(data: &[u8]) -> Option<Self> {
        if data.len() < FMT_DATA_LEN {
            return None;
        }

        Some(Self {
            format_tag: le_u16(data, 0),
            channels: le_u16(data, 2),
            sample_rate: le_u32(data, 4),
            byte_rate: le_u32(data, 8),
            block_align: le_u16(data, 12),
            bits_per_sample: le_u16(data, 14),
        })
    }

    pub fn is_cd_audio(&self) -> bool {
        self.format_tag == WAVE_FORMAT_PCM
            && self.channels == CD_CHANNELS
            && self.sample_rate == CD_SAMPLE_RATE
            && self.bits_per_sample == CD_BITS_PER_SAMPLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: [u8; 4],
    pub len: u32,
    /// Offset of the chunk header in the buffer.
    pub offset: usize,
}

impl ChunkHeader {
    pub fn data_offset(&self) -> usize {
        self.offset + CHUNK_HEADER_LEN
    }
}

/// Walks the chunk records of a buffer, stopping at the first header
/// that does not fit.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Chunks<'a> {
    pub fn new(buffer: &'a [u8], offset: usize) -> Self {
        Self { buffer, offset }
    }
}

impl Iterator for Chunks<'_> {
    type Item = ChunkHeader;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset.checked_add(CHUNK_HEADER_LEN)? > self.buffer.len() {
            return None;
        }

        let offset = self.offset;
        let tag = [
            self.buffer[offset],
            self.buffer[offset + 1],
            self.buffer[offset + 2],
            self.buffer[offset + 3],
        ];
        let len = le_u32(self.buffer, offset + 4);

        // chunk bodies are padded to an even length
        let padded = (len as usize).saturating_add((len & 1) as usize);
        self.offset = offset
            .saturating_add(CHUNK_HEADER_LEN)
            .saturating_add(padded);

        trace!(
            "chunk {} at {offset}, {len} bytes",
            String::from_utf8_lossy(&tag)
        );

        Some(ChunkHeader { tag, len, offset })
    }
}

/// Returns the payload offset of a RIFF/WAVE wrapped stream, or 0 when
/// the buffer is not such a container.
///
/// Only CD audio descriptors (PCM, 2 channels, 44100 Hz, 16 bits) are
/// accepted. A mismatching descriptor or a missing `data` chunk is
/// logged at warning level, and returned as an error when
/// `opts.fail_level` includes warnings.
pub fn inspect_container(buffer: &[u8], opts: &ProbeOptions) -> Result<usize> {
    if buffer.len() < FMT_DATA_OFFSET + FMT_DATA_LEN
        || buffer[0..4] != RIFF_TAG
        || buffer[8..12] != WAVE_TAG
        || buffer[12..16] != FMT_TAG
    {
        return Ok(0);
    }

    let fmt_len = le_u32(buffer, 16) as usize;
    let Some(format) = WaveFormat::read(&buffer[FMT_DATA_OFFSET..]) else {
        return Ok(0);
    };

    if !format.is_cd_audio() {
        log_or_err!(
            opts,
            Warn,
            ContainerError::UnexpectedPcmFormat {
                format_tag: format.format_tag,
                channels: format.channels,
                sample_rate: format.sample_rate,
                bits_per_sample: format.bits_per_sample,
            }
        );
        return Ok(0);
    }

    let start = FMT_DATA_OFFSET.saturating_add(fmt_len);
    if let Some(data) = Chunks::new(buffer, start).find(|chunk| chunk.tag == DATA_TAG) {
        let offset = data.data_offset();
        debug!("Found WAVE data chunk, payload starts at offset {offset}");

        return Ok(offset);
    }

    log_or_err!(opts, Warn, ContainerError::MissingDataChunk(buffer.len()));

    Ok(0)
}

/// Returns the payload offset of a RIFF/WAVE wrapped stream, or 0.
pub fn detect_container_offset(buffer: &[u8]) -> usize {
    inspect_container(buffer, &ProbeOptions::default()).unwrap_or(0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn wave_header(format: &WaveFormat, extra_chunks: &[([u8; 4], &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(RIFF_TAG);
        out.extend(0u32.to_le_bytes());
        out.extend(WAVE_TAG);
        out.extend(FMT_TAG);
        out.extend((FMT_DATA_LEN as u32).to_le_bytes());
        out.extend(format.format_tag.to_le_bytes());
        out.extend(format.channels.to_le_bytes());
        out.extend(format.sample_rate.to_le_bytes());
        out.extend(format.byte_rate.to_le_bytes());
        out.extend(format.block_align.to_le_bytes());
        out.extend(format.bits_per_sample.to_le_bytes());
        for (tag, body) in extra_chunks {
            out.extend(tag);
            out.extend((body.len() as u32).to_le_bytes());
            out.extend(*body);
            if body.len() & 1 == 1 {
                out.push(0);
            }
        }
        out.extend(DATA_TAG);
        out.extend(0u32.to_le_bytes());
        out
    }

    pub(crate) fn cd_format() -> WaveFormat {
        WaveFormat {
            format_tag: WAVE_FORMAT_PCM,
            channels: 2,
            sample_rate: 44100,
            byte_rate: 176_400,
            block_align: 4,
            bits_per_sample: 16,
        }
    }

    #[test]
    fn canonical_header() {
        let header = wave_header(&cd_format(), &[]);
        assert_eq!(header.len(), 44);
        assert_eq!(detect_container_offset(&header), 44);
    }

    #[test]
    fn skips_unknown_chunks() {
        let header = wave_header(
            &cd_format(),
            &[(*b"LIST", &b"INFOabc"[..]), (*b"fact", &b"1234"[..])],
        );
        // LIST body is padded to 8 bytes
        assert_eq!(detect_container_offset(&header), 44 + 16 + 12);
    }

    #[test]
    fn no_container() {
        assert_eq!(detect_container_offset(&[]), 0);
        assert_eq!(detect_container_offset(&[0xFF; 64]), 0);

        let mut header = wave_header(&cd_format(), &[]);
        header[8..12].copy_from_slice(b"AVI ");
        assert_eq!(detect_container_offset(&header), 0);
    }

    #[test]
    fn rejects_non_cd_descriptor() {
        let format = WaveFormat {
            sample_rate: 48000,
            ..cd_format()
        };
        let header = wave_header(&format, &[]);
        assert_eq!(detect_container_offset(&header), 0);

        let strict = ProbeOptions {
            fail_level: log::Level::Warn,
            ..Default::default()
        };
        let err = inspect_container(&header, &strict).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ContainerError>(),
            Some(ContainerError::UnexpectedPcmFormat {
                sample_rate: 48000,
                ..
            })
        ));
    }

    #[test]
    fn missing_data_chunk() {
        let mut header = wave_header(&cd_format(), &[]);
        header.truncate(40);
        assert_eq!(detect_container_offset(&header), 0);

        let strict = ProbeOptions {
            fail_level: log::Level::Warn,
            ..Default::default()
        };
        assert_eq!(
            inspect_container(&header, &strict)
                .unwrap_err()
                .downcast_ref::<ContainerError>(),
            Some(&ContainerError::MissingDataChunk(40))
        );
    }

    #[test]
    fn chunk_walk_survives_huge_lengths() {
        let mut buffer = Vec::new();
        buffer.extend(*b"junk");
        buffer.extend(u32::MAX.to_le_bytes());
        buffer.extend(DATA_TAG);
        buffer.extend(0u32.to_le_bytes());

        let chunks: Vec<_> = Chunks::new(&buffer, 0).collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len, u32::MAX);
    }
}
