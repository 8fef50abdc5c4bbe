#![forbid(unsafe_code)]
//! Varint codec used to pack relationship ids into id blocks.

pub mod var {
    //! Unsigned varints: seven payload bits per byte, high bit set on every
    //! byte except the last.

    /// Largest number of bytes a single `u64` occupies once encoded.
    pub const MAX_VARINT_LEN: usize = 10;

    /// Returns the number of bytes `v` occupies once encoded.
    #[inline]
    pub fn encoded_len(v: u64) -> usize {
        let bits = (u64::BITS - (v | 1).leading_zeros()) as usize;
        bits.div_ceil(7)
    }

    /// Encodes `v` at the start of `dst`, returning the number of bytes written.
    pub fn encode_u64_into(mut v: u64, dst: &mut [u8]) -> usize {
        let mut i = 0usize;
        loop {
            if i >= dst.len() {
                panic!(
                    "varint destination too small: need {} bytes, have {}",
                    i + encoded_len(v),
                    dst.len()
                );
            }
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                dst[i] = byte;
                return i + 1;
            }
            dst[i] = byte | 0x80;
            i += 1;
        }
    }

    /// Decodes a u64 varint from a slice, updating the offset.
    pub fn decode_u64(src: &[u8], off: &mut usize) -> u64 {
        let mut result = 0u64;
        let mut shift = 0u32;
        for i in 0..MAX_VARINT_LEN {
            let idx = *off;
            if idx >= src.len() {
                panic!("varint decode truncated at byte {}", i);
            }
            let byte = src[idx];
            *off += 1;
            let payload = (byte & 0x7f) as u64;
            result |= payload << shift;
            if (byte & 0x80) == 0 {
                if i == MAX_VARINT_LEN - 1 && payload > 1 {
                    panic!("varint overflow (more than 64 bits)");
                }
                return result;
            }
            shift += 7;
        }
        panic!("varint too long (exceeded {} bytes)", MAX_VARINT_LEN);
    }
}
