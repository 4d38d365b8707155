//! Bitstream I/O utilities for header parsing.
//!
//! Provides a bounds-checked big-endian bit reader and helpers that
//! normalize the four DTS word packings into one plain bitstream.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, UnsignedInteger};

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        self.bs.read_bit()
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        let avail = self.available()?;
        if n as u64 > avail {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "get_n({}): out of bounds bits at {}",
                    n,
                    self.position().unwrap_or(0)
                ),
            ));
        }

        self.bs.read_unsigned_var(n)
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> io::Result<()> {
        self.available().and_then(|avail| {
            if n as u64 > avail {
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "skip_n: out of bounds bits",
                ))
            } else {
                self.bs.skip(n)
            }
        })
    }

    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.bs
            .position_in_bits()
            .map(|pos| self.len.saturating_sub(pos))
    }

    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits()
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

impl Default for BsIoSliceReader<'_> {
    fn default() -> Self {
        Self::from_slice(&[])
    }
}

/// Packs the low 14 bits of every word into a contiguous big-endian bitstream.
///
/// Trailing bits that do not fill a whole byte are zero padded.
pub fn pack_14bit_words<I>(words: I) -> Vec<u8>
where
    I: IntoIterator<Item = u16>,
{
    let mut out = Vec::new();
    let mut acc = 0u32;
    let mut bits = 0u32;

    for word in words {
        acc = (acc << 14) | (word & 0x3FFF) as u32;
        bits += 14;

        while bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
        acc &= (1 << bits) - 1;
    }

    if bits > 0 {
        out.push((acc << (8 - bits)) as u8);
    }

    out
}

/// Swaps the bytes of every 16-bit word. A trailing odd byte is dropped.
pub fn swap_16bit_words(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(2).flat_map(|w| [w[1], w[0]]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_fields_across_byte_boundaries() -> io::Result<()> {
        let data = [0b1010_1100, 0b0101_0011, 0xFF];
        let mut reader = BsIoSliceReader::from_slice(&data);

        assert!(reader.get()?);
        assert_eq!(reader.get_n::<u8>(3)?, 0b010);
        assert_eq!(reader.get_n::<u16>(10)?, 0b1100_0101_00);
        assert_eq!(reader.position()?, 14);
        assert_eq!(reader.available()?, 10);

        reader.skip_n(2)?;
        assert_eq!(reader.get_n::<u8>(8)?, 0xFF);
        assert!(reader.get_n::<u8>(1).is_err());

        Ok(())
    }

    #[test]
    fn pack_14bit_sync() {
        // 14-bit sync words 0x1FFF 0x2800 0x07F0 carry 0x7FFE8001 in their first 32 bits
        let packed = pack_14bit_words([0x1FFF, 0xE800, 0x07F0]);
        assert_eq!(packed.len(), 6);
        assert_eq!(&packed[..4], &[0x7F, 0xFE, 0x80, 0x01]);
        assert_eq!(packed[4], 0xFC);
        assert_eq!(packed[5], 0x00);
    }

    #[test]
    fn swap_words() {
        assert_eq!(
            swap_16bit_words(&[0xFE, 0x7F, 0x01, 0x80, 0xAA]),
            vec![0x7F, 0xFE, 0x80, 0x01]
        );
    }
}
