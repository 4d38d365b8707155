//! DTS core frame header structures.
//!
//! ## Bitstream Packings
//!
//! The same core bitstream is carried in four packings:
//!
//! - **16-bit big-endian** (0x7FFE8001): plain elementary stream
//! - **16-bit little-endian** (0xFE7F0180): byte-swapped words
//! - **14-bit big-endian** (0x1FFFE800 07Fx): 14 payload bits per 16-bit word
//! - **14-bit little-endian** (0xFF1F00E8 Fx07): DTS audio CD layout
//!
//! Header fields are always read from the normalized 16-bit big-endian
//! form, so bit positions match the core header syntax regardless of
//! how the stream was packed.

use std::fmt::Display;

use anyhow::{Result, bail};
use log::trace;

use crate::utils::bitstream_io::{BsIoSliceReader, pack_14bit_words, swap_16bit_words};
use crate::utils::errors::SyncError;

/// Core sync word of the normalized bitstream.
pub const CORE_SYNC: u32 = 0x7F_FE_80_01;

/// Stored bytes from the start of a sync word holding every header field
/// through LFF, in the widest packing.
pub const FRAME_HEADER_LEN: usize = 14;

/// Normalized bits from the sync word through SFREQ.
const REQUIRED_HEADER_BITS: usize = 70;

/// Smallest legal core frame, in bytes of the normalized bitstream.
pub const MIN_FRAME_SIZE: u32 = 96;

/// Core audio sampling frequencies indexed by SFREQ. Zero entries are reserved.
pub const SAMPLE_RATES: [u32; 16] = [
    0, 8000, 16000, 32000, 0, 0, 11025, 22050, 44100, 0, 0, 12000, 24000, 48000, 96000, 192000,
];

/// Transmission bit rates indexed by RATE, in bits per second.
///
/// Indices 29 to 31 signal open, variable and lossless rates.
pub const BIT_RATES: [u32; 29] = [
    32_000, 56_000, 64_000, 96_000, 112_000, 128_000, 192_000, 224_000, 256_000, 320_000,
    384_000, 448_000, 512_000, 576_000, 640_000, 768_000, 960_000, 1_024_000, 1_152_000,
    1_280_000, 1_344_000, 1_408_000, 1_411_200, 1_472_000, 1_536_000, 1_920_000, 2_048_000,
    3_072_000, 3_840_000,
];

/// Full bandwidth channel count per AMODE. Higher values are user defined.
pub const AMODE_CHANNELS: [u8; 16] = [1, 2, 2, 2, 2, 3, 3, 4, 4, 5, 6, 6, 6, 7, 8, 8];

/// Word packing of a DTS elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitstreamFormat {
    Be16,
    Le16,
    Be14,
    Le14,
}

impl BitstreamFormat {
    pub fn is_14bit(&self) -> bool {
        matches!(self, BitstreamFormat::Be14 | BitstreamFormat::Le14)
    }

    /// Converts header bytes starting at a sync word into the plain
    /// 16-bit big-endian bitstream.
    pub fn normalize(&self, data: &[u8]) -> Vec<u8> {
        match self {
            BitstreamFormat::Be16 => data.to_vec(),
            BitstreamFormat::Le16 => swap_16bit_words(data),
            BitstreamFormat::Be14 => pack_14bit_words(
                data.chunks_exact(2)
                    .map(|w| u16::from_be_bytes([w[0], w[1]])),
            ),
            BitstreamFormat::Le14 => pack_14bit_words(
                data.chunks_exact(2)
                    .map(|w| u16::from_le_bytes([w[0], w[1]])),
            ),
        }
    }

    /// Stored bytes needed to decode the header through SFREQ.
    pub fn required_header_len(&self) -> usize {
        match self {
            Self::Be16 => REQUIRED_HEADER_BITS.div_ceil(8),
            // words are swapped whole
            Self::Le16 => REQUIRED_HEADER_BITS.div_ceil(16) * 2,
            Self::Be14 | Self::Le14 => REQUIRED_HEADER_BITS.div_ceil(14) * 2,
        }
    }

    /// Converts a frame size in normalized bytes into stored bytes.
    pub fn stored_frame_size(&self, normalized: u32) -> u32 {
        if self.is_14bit() {
            normalized * 8 / 14 * 2
        } else {
            normalized
        }
    }
}

impl Display for BitstreamFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BitstreamFormat::Be16 => write!(f, "16-bit big-endian"),
            BitstreamFormat::Le16 => write!(f, "16-bit little-endian"),
            BitstreamFormat::Be14 => write!(f, "14-bit big-endian"),
            BitstreamFormat::Le14 => write!(f, "14-bit little-endian"),
        }
    }
}

/// Core header fields following SFREQ.
///
/// Only decoded when the buffer reaches past LFF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderExtension {
    pub rate: u8,
    pub fixed_bit: bool,
    pub dynamic_range: bool,
    pub time_stamp: bool,
    pub aux_data: bool,
    pub hdcd: bool,
    pub ext_audio_id: u8,
    pub ext_audio: bool,
    pub aspf: bool,
    pub lff: u8,
}

impl HeaderExtension {
    /// Bits from RATE through LFF.
    pub const BITS: u64 = 17;

    fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        Ok(Self {
            rate: reader.get_n(5)?,
            fixed_bit: reader.get()?,
            dynamic_range: reader.get()?,
            time_stamp: reader.get()?,
            aux_data: reader.get()?,
            hdcd: reader.get()?,
            ext_audio_id: reader.get_n(3)?,
            ext_audio: reader.get()?,
            aspf: reader.get()?,
            lff: reader.get_n(2)?,
        })
    }
}

/// Raw core frame header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameHeader {
    pub frame_type: bool,
    pub deficit_samples: u8,
    pub crc_present: bool,
    pub blocks: u8,
    pub frame_size: u16,
    pub amode: u8,
    pub sfreq: u8,
    pub extension: Option<HeaderExtension>,
}

impl FrameHeader {
    /// Reads the header from a normalized bitstream positioned at the sync word.
    ///
    /// Fields through SFREQ are required. The fields after it are read
    /// only when the bitstream holds all of them.
    pub fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        let sync: u32 = reader.get_n(32)?;
        if sync != CORE_SYNC {
            bail!("Unexpected core sync {sync:#010X}");
        }

        let mut header = Self {
            frame_type: reader.get()?,
            deficit_samples: reader.get_n(5)?,
            crc_present: reader.get()?,
            blocks: reader.get_n(7)?,
            frame_size: reader.get_n(14)?,
            amode: reader.get_n(6)?,
            sfreq: reader.get_n(4)?,
            extension: None,
        };

        if reader.available()? >= HeaderExtension::BITS {
            header.extension = Some(HeaderExtension::read(reader)?);
        }

        trace!("{header:?}");

        Ok(header)
    }

    pub fn sample_rate(&self) -> Result<u32> {
        match SAMPLE_RATES.get(self.sfreq as usize) {
            Some(&rate) if rate != 0 => Ok(rate),
            _ => bail!(SyncError::InvalidSampleRate(self.sfreq)),
        }
    }

    pub fn samples_per_frame(&self) -> u32 {
        (self.blocks as u32 + 1) * 32
    }

    /// Frame size in bytes of the normalized bitstream.
    pub fn normalized_frame_size(&self) -> u32 {
        self.frame_size as u32 + 1
    }

    pub fn bit_rate(&self) -> Option<u32> {
        let rate = self.extension.as_ref()?.rate;
        BIT_RATES.get(rate as usize).copied()
    }

    pub fn lfe(&self) -> bool {
        self.extension.as_ref().is_some_and(|ext| ext.lff != 0)
    }

    pub fn channels(&self) -> Option<u8> {
        AMODE_CHANNELS.get(self.amode as usize).copied()
    }
}

/// Stream parameters derived once from the first frame header.
///
/// The stream is treated as constant bit rate: every frame is assumed to
/// occupy `frame_size` bytes and carry `samples_per_frame` samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    pub format: BitstreamFormat,
    pub sample_rate: u32,
    /// Stored frame size in bytes.
    pub frame_size: u32,
    pub samples_per_frame: u32,
    /// Byte offset of the first frame.
    pub data_start: u64,
    pub channels: Option<u8>,
    pub lfe: bool,
    pub bit_rate: Option<u32>,
}

impl StreamHeader {
    pub fn from_frame_header(
        header: &FrameHeader,
        format: BitstreamFormat,
        data_start: u64,
    ) -> Result<Self> {
        let sample_rate = header.sample_rate()?;

        let normalized = header.normalized_frame_size();
        if normalized < MIN_FRAME_SIZE {
            bail!(SyncError::InvalidFrameSize(normalized));
        }
        let frame_size = format.stored_frame_size(normalized);

        Ok(Self {
            format,
            sample_rate,
            frame_size,
            samples_per_frame: header.samples_per_frame(),
            data_start,
            channels: header.channels(),
            lfe: header.lfe(),
            bit_rate: header.bit_rate(),
        })
    }

    /// Number of whole frames in a stream of `stream_length` bytes.
    pub fn frame_count(&self, stream_length: u64) -> u64 {
        stream_length
            .saturating_sub(self.data_start)
            .checked_div(self.frame_size as u64)
            .unwrap_or(0)
    }

    /// Playback duration in milliseconds of a stream of `stream_length` bytes.
    pub fn duration_ms(&self, stream_length: u64) -> u64 {
        let samples = self.frame_count(stream_length) as u128 * self.samples_per_frame as u128;
        let ms = (samples * 1000)
            .checked_div(self.sample_rate as u128)
            .unwrap_or(0);

        u64::try_from(ms).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a normalized 16-bit big-endian core header.
    pub(crate) fn core_header(
        blocks: u8,
        frame_size: u16,
        amode: u8,
        sfreq: u8,
        rate: u8,
    ) -> Vec<u8> {
        let mut bits: Vec<(u32, u32)> = vec![
            (32, CORE_SYNC),
            (1, 1),
            (5, 31),
            (1, 0),
            (7, blocks as u32),
            (14, frame_size as u32),
            (6, amode as u32),
            (4, sfreq as u32),
            (5, rate as u32),
            (1, 0),
            (1, 0),
            (1, 0),
            (1, 0),
            (1, 0),
            (3, 0),
            (1, 0),
            (1, 0),
            (2, 1),
        ];
        // pad up to a whole number of 14-bit and 16-bit words
        bits.push((112 - 87, 0));

        let mut out = Vec::new();
        let mut acc = 0u64;
        let mut n = 0;
        for (width, value) in bits {
            for i in (0..width).rev() {
                acc = (acc << 1) | ((value >> i) & 1) as u64;
                n += 1;
                if n == 8 {
                    out.push(acc as u8);
                    acc = 0;
                    n = 0;
                }
            }
        }
        out
    }

    #[test]
    fn read_core_header_fields() -> Result<()> {
        let data = core_header(15, 2047, 9, 13, 24);
        let header = FrameHeader::read(&mut BsIoSliceReader::from_slice(&data))?;

        assert!(header.frame_type);
        assert_eq!(header.deficit_samples, 31);
        assert_eq!(header.blocks, 15);
        assert_eq!(header.frame_size, 2047);
        assert_eq!(header.amode, 9);
        assert_eq!(header.sfreq, 13);
        let ext = header.extension.as_ref().unwrap();
        assert_eq!(ext.rate, 24);
        assert_eq!(ext.lff, 1);
        assert!(header.lfe());

        assert_eq!(header.sample_rate()?, 48000);
        assert_eq!(header.samples_per_frame(), 512);
        assert_eq!(header.normalized_frame_size(), 2048);
        assert_eq!(header.bit_rate(), Some(1_536_000));
        assert_eq!(header.channels(), Some(5));

        Ok(())
    }

    #[test]
    fn reserved_sample_rates_are_rejected() {
        for sfreq in 0..16u8 {
            let header = FrameHeader {
                sfreq,
                ..Default::default()
            };
            match header.sample_rate() {
                Ok(rate) => assert_eq!(rate, SAMPLE_RATES[sfreq as usize]),
                Err(e) => {
                    assert!([0, 4, 5, 9, 10].contains(&sfreq));
                    assert_eq!(
                        e.downcast_ref::<SyncError>(),
                        Some(&SyncError::InvalidSampleRate(sfreq))
                    );
                }
            }
        }
    }

    #[test]
    fn stored_frame_size_for_14bit_packing() {
        assert_eq!(BitstreamFormat::Be16.stored_frame_size(2048), 2048);
        assert_eq!(BitstreamFormat::Le14.stored_frame_size(2048), 2340);
        assert_eq!(BitstreamFormat::Be14.stored_frame_size(1024), 1170);
    }

    #[test]
    fn stream_header_rejects_tiny_frames() {
        let header = FrameHeader {
            sfreq: 8,
            frame_size: 10,
            ..Default::default()
        };
        let err = StreamHeader::from_frame_header(&header, BitstreamFormat::Be16, 0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SyncError>(),
            Some(&SyncError::InvalidFrameSize(11))
        );
    }

    #[test]
    fn header_without_trailing_fields() -> Result<()> {
        // sync through SFREQ only
        let data = core_header(15, 2012, 2, 8, 15);
        let header = FrameHeader::read(&mut BsIoSliceReader::from_slice(&data[..9]))?;

        assert_eq!(header.sfreq, 8);
        assert_eq!(header.frame_size, 2012);
        assert_eq!(header.extension, None);
        assert_eq!(header.bit_rate(), None);
        assert!(!header.lfe());

        let err = FrameHeader::read(&mut BsIoSliceReader::from_slice(&data[..8]));
        assert!(err.is_err());

        Ok(())
    }

    #[test]
    fn required_header_len_covers_sfreq() {
        assert_eq!(BitstreamFormat::Be16.required_header_len(), 9);
        assert_eq!(BitstreamFormat::Le16.required_header_len(), 10);
        assert_eq!(BitstreamFormat::Be14.required_header_len(), 10);
        assert_eq!(BitstreamFormat::Le14.required_header_len(), 10);
    }

    #[test]
    fn minimum_frame_size_applies_before_packing() {
        // 90 normalized bytes would be stored as 102 bytes
        let header = FrameHeader {
            sfreq: 8,
            frame_size: 89,
            ..Default::default()
        };
        assert_eq!(BitstreamFormat::Le14.stored_frame_size(90), 102);
        let err = StreamHeader::from_frame_header(&header, BitstreamFormat::Le14, 0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SyncError>(),
            Some(&SyncError::InvalidFrameSize(90))
        );

        let header = FrameHeader {
            frame_size: 95,
            ..header
        };
        let stream = StreamHeader::from_frame_header(&header, BitstreamFormat::Le14, 0);
        assert_eq!(stream.map(|s| s.frame_size).ok(), Some(108));
    }

    #[test]
    fn degenerate_headers_do_not_divide_by_zero() {
        let header = StreamHeader {
            format: BitstreamFormat::Be16,
            sample_rate: 0,
            frame_size: 0,
            samples_per_frame: 512,
            data_start: 0,
            channels: None,
            lfe: false,
            bit_rate: None,
        };
        assert_eq!(header.frame_count(10_000), 0);
        assert_eq!(header.duration_ms(10_000), 0);

        let header = StreamHeader {
            frame_size: 1000,
            ..header
        };
        assert_eq!(header.frame_count(10_000), 10);
        assert_eq!(header.duration_ms(10_000), 0);
    }

    #[test]
    fn duration_of_cbr_stream() -> Result<()> {
        let header = FrameHeader {
            blocks: 15,
            frame_size: 2012,
            sfreq: 8,
            ..Default::default()
        };
        let stream = StreamHeader::from_frame_header(&header, BitstreamFormat::Le14, 44)?;
        assert_eq!(stream.frame_size, 2013 * 8 / 14 * 2);
        assert_eq!(stream.frame_count(44 + stream.frame_size as u64 * 100 + 7), 100);
        // 100 frames of 512 samples at 44.1 kHz
        assert_eq!(
            stream.duration_ms(44 + stream.frame_size as u64 * 100),
            51_200_000 / 44100
        );
        Ok(())
    }
}
