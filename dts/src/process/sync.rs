use anyhow::{Result, bail};
use log::debug;

use crate::structs::header::{BitstreamFormat, FRAME_HEADER_LEN, FrameHeader, StreamHeader};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::SyncError;

/// Sync word of the 16-bit big-endian packing.
pub const SYNC_BE16: u32 = 0x7F_FE_80_01;

/// Sync word of the 16-bit little-endian packing.
pub const SYNC_LE16: u32 = 0xFE_7F_01_80;

/// First four sync bytes of the 14-bit big-endian packing, followed by `07 Fx`.
pub const SYNC_BE14: u32 = 0x1F_FF_E8_00;

/// First four sync bytes of the 14-bit little-endian packing, followed by `Fx 07`.
pub const SYNC_LE14: u32 = 0xFF_1F_00_E8;

/// Bytes that must follow the scan position before a candidate is reported.
const SYNC_TRAILING_MARGIN: usize = 9;

/// Location and packing of a detected sync word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncMatch {
    pub offset: usize,
    pub format: BitstreamFormat,
}

/// Matches the shift register against every sync pattern.
///
/// `next` holds the two bytes following the register. The 14-bit
/// packings split the sync over three words, so their last word is
/// checked on those lookahead bytes to reject coarse 32-bit matches.
fn match_sync(register: u32, next: [u8; 2]) -> Option<BitstreamFormat> {
    match register {
        SYNC_LE14 if next[0] & 0xF0 == 0xF0 && next[1] == 0x07 => Some(BitstreamFormat::Le14),
        SYNC_BE14 if next[0] == 0x07 && next[1] & 0xF0 == 0xF0 => Some(BitstreamFormat::Be14),
        SYNC_BE16 => Some(BitstreamFormat::Be16),
        SYNC_LE16 => Some(BitstreamFormat::Le16),
        _ => None,
    }
}

/// Scans `buffer` from `start` for the first DTS sync word.
///
/// A 32-bit big-endian shift register accumulates one byte per step.
/// Candidates with fewer than nine bytes after the sync word are not
/// reported.
pub fn find_sync(buffer: &[u8], start: usize) -> Option<SyncMatch> {
    let end = buffer.len().saturating_sub(SYNC_TRAILING_MARGIN);

    let mut register = 0u32;
    let mut pos = start;

    while pos < end {
        register = (register << 8) | buffer[pos] as u32;
        pos += 1;

        if pos - start < 4 {
            continue;
        }

        if let Some(format) = match_sync(register, [buffer[pos], buffer[pos + 1]]) {
            let offset = pos - 4;
            debug!("Found {format} DTS sync word at offset {offset}");

            return Some(SyncMatch { offset, format });
        }
    }

    None
}

/// Packing of the sync word starting exactly at `offset`, if any.
pub fn sync_format_at(buffer: &[u8], offset: usize) -> Option<BitstreamFormat> {
    let word = buffer.get(offset..offset.checked_add(6)?)?;
    let register = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);

    match_sync(register, [word[4], word[5]])
}

/// Decodes the frame header at a sync word into stream parameters.
///
/// Fields up to SFREQ are required. The fields after it are decoded when
/// the buffer holds them. The returned header uses the sync offset as its
/// data start.
pub fn parse_frame_header(buffer: &[u8], sync: SyncMatch) -> Result<StreamHeader> {
    let available = buffer.len().saturating_sub(sync.offset);
    let needed = sync.format.required_header_len();
    if available < needed {
        bail!(SyncError::TruncatedHeader {
            offset: sync.offset,
            needed,
            available,
        });
    }

    let stored = &buffer[sync.offset..sync.offset + available.min(FRAME_HEADER_LEN)];
    let mut data = sync.format.normalize(stored);
    if sync.format.is_14bit() {
        // drop the padding after the last whole word
        data.truncate(stored.len() / 2 * 14 / 8);
    }
    let header = FrameHeader::read(&mut BsIoSliceReader::from_slice(&data))?;

    StreamHeader::from_frame_header(&header, sync.format, sync.offset as u64)
}
