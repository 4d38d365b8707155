use std::io::{self, BufWriter, Seek, SeekFrom, Write};

use dts::process::container::{
    CD_BITS_PER_SAMPLE, CD_CHANNELS, CD_SAMPLE_RATE, DATA_TAG, FMT_DATA_LEN, FMT_TAG, RIFF_TAG,
    WAVE_FORMAT_PCM, WAVE_TAG,
};
use dtsd_macros::ToBytes;

use crate::byteorder::WriteBytesLe;

/// Canonical 44-byte RIFF/WAVE header.
#[derive(Debug, Clone, ToBytes)]
pub struct WaveHeader {
    riff: [u8; 4],
    riff_len: u32,
    wave: [u8; 4],
    fmt: [u8; 4],
    fmt_len: u32,
    format_tag: u16,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
    data: [u8; 4],
    data_len: u32,
}

pub const WAVE_HEADER_LEN: u64 = 44;

impl WaveHeader {
    /// Header for 16-bit stereo 44.1 kHz PCM, the layout of DTS audio CDs.
    pub fn cd_audio(data_len: u32) -> Self {
        let block_align = CD_CHANNELS * CD_BITS_PER_SAMPLE / 8;
        Self {
            riff: RIFF_TAG,
            riff_len: data_len.saturating_add(WAVE_HEADER_LEN as u32 - 8),
            wave: WAVE_TAG,
            fmt: FMT_TAG,
            fmt_len: FMT_DATA_LEN as u32,
            format_tag: WAVE_FORMAT_PCM,
            channels: CD_CHANNELS,
            sample_rate: CD_SAMPLE_RATE,
            byte_rate: CD_SAMPLE_RATE * block_align as u32,
            block_align,
            bits_per_sample: CD_BITS_PER_SAMPLE,
            data: DATA_TAG,
            data_len,
        }
    }

    pub fn block_align(&self) -> u16 {
        self.block_align
    }
}

/// RIFF/WAVE writer for CD audio payloads.
///
/// The header is written with zero lengths and patched by [`finish`](Self::finish).
pub struct WAVWriter<W: Write + Seek> {
    writer: BufWriter<W>,
    data_written: u64,
}

impl<W: Write + Seek> WAVWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            data_written: 0,
        }
    }

    /// Write the RIFF/WAVE header
    pub fn write_header(&mut self) -> io::Result<()> {
        let mut header = Vec::with_capacity(WAVE_HEADER_LEN as usize);
        WaveHeader::cd_audio(0).write_le(&mut header);
        self.writer.write_all(&header)
    }

    /// Append payload bytes to the data chunk.
    pub fn write_data(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.data_written += data.len() as u64;
        Ok(())
    }

    /// Pad the data chunk to whole sample frames and update the header lengths.
    pub fn finish(&mut self) -> io::Result<()> {
        let block_align = WaveHeader::cd_audio(0).block_align() as u64;
        let padding = (block_align - self.data_written % block_align) % block_align;
        self.write_data(&vec![0u8; padding as usize])?;

        let data_len = u32::try_from(self.data_written).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "data chunk exceeds the 4 GiB RIFF limit",
            )
        })?;

        let mut header = Vec::with_capacity(WAVE_HEADER_LEN as usize);
        WaveHeader::cd_audio(data_len).write_le(&mut header);

        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.write_all(&header)?;
        self.writer.seek(SeekFrom::End(0))?;
        self.writer.flush()
    }

    pub fn data_written(&self) -> u64 {
        self.data_written
    }

    /// Get the underlying writer
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}
