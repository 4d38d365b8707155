pub trait WriteBytesLe {
    fn write_le(&self, dst: &mut Vec<u8>);
}

pub trait WriteBytesBe {
    fn write_be(&self, dst: &mut Vec<u8>);
}

macro_rules! impl_num_le_be {
    ($($t:ty),+) => { $(
        impl WriteBytesLe for $t { #[inline] fn write_le(&self, dst: &mut Vec<u8>) { dst.extend_from_slice(&self.to_le_bytes()); }}
        impl WriteBytesBe for $t { #[inline] fn write_be(&self, dst: &mut Vec<u8>) { dst.extend_from_slice(&self.to_be_bytes()); }}
    )+ }
}

impl_num_le_be!(u8, u16, u32);

impl<T: WriteBytesLe, const N: usize> WriteBytesLe for [T; N] {
    #[inline]
    fn write_le(&self, dst: &mut Vec<u8>) {
        self.iter().for_each(|item| item.write_le(dst));
    }
}

impl<T: WriteBytesBe, const N: usize> WriteBytesBe for [T; N] {
    #[inline]
    fn write_be(&self, dst: &mut Vec<u8>) {
        self.iter().for_each(|item| item.write_be(dst));
    }
}

#[cfg(test)]
mod tests {
    use crate::byteorder::{WriteBytesBe, WriteBytesLe};
    use dtsd_macros::ToBytes;

    #[derive(ToBytes)]
    struct ChunkHeader {
        tag: [u8; 4],
        len: u32,
        pad: u16,
    }

    #[test]
    fn derived_struct_byte_order() {
        let chunk = ChunkHeader {
            tag: *b"data",
            len: 0x0001_0203,
            pad: 0xABCD,
        };

        let mut le = Vec::new();
        let mut be = Vec::new();
        chunk.write_le(&mut le);
        chunk.write_be(&mut be);

        assert_eq!(le, [b'd', b'a', b't', b'a', 0x03, 0x02, 0x01, 0x00, 0xCD, 0xAB]);
        assert_eq!(be, [b'd', b'a', b't', b'a', 0x00, 0x01, 0x02, 0x03, 0xAB, 0xCD]);
    }
}
