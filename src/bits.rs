//! Reading and writing of unsigned integers of arbitrary bit width at
//! arbitrary bit offsets, most significant bit first.
//!
//! Offsets and widths are given in bits. None of the functions here check
//! bounds beyond what slice indexing does: callers are expected to validate
//! offsets against the buffer length first.

use crate::helpers::num_octets;

/// Reads `width` bits (0 to 64) starting at bit `offset` and returns them
/// right-justified.
///
/// # Panics
///
/// Panics if the bits to read extend past the end of `buf` or if `width` is
/// larger than 64.
pub fn get_bits(buf: &[u8], offset: usize, width: usize) -> u64 {
    assert!(width <= 64, "bit width {width} is larger than 64");
    let mut value = 0u64;
    let mut pos = offset;
    let mut remaining = width;
    while remaining > 0 {
        let avail = 8 - pos % 8;
        let take = avail.min(remaining);
        let shift = avail - take;
        let bits = (buf[pos / 8] >> shift) & low_mask(take);
        value = (value << take) | u64::from(bits);
        pos += take;
        remaining -= take;
    }
    value
}

/// Reads `n` fields of `width` bits each, starting at bit `offset` and
/// skipping `skip` bits after every field.
///
/// # Panics
///
/// Panics under the same conditions as [`get_bits`].
pub fn get_bits_n(buf: &[u8], offset: usize, width: usize, skip: usize, n: usize) -> Vec<u64> {
    (0..n)
        .map(|i| get_bits(buf, offset + i * (width + skip), width))
        .collect()
}

/// Writes the low `width` bits of `value` at bit `offset`, leaving every other
/// bit of `buf` untouched.
///
/// # Panics
///
/// Panics if the bits to write extend past the end of `buf` or if `width` is
/// larger than 64.
pub fn set_bits(buf: &mut [u8], value: u64, offset: usize, width: usize) {
    assert!(width <= 64, "bit width {width} is larger than 64");
    let mut pos = offset;
    let mut remaining = width;
    while remaining > 0 {
        let avail = 8 - pos % 8;
        let take = avail.min(remaining);
        let shift = avail - take;
        let chunk = (value >> (remaining - take)) as u8 & low_mask(take);
        let mask = low_mask(take) << shift;
        let byte = &mut buf[pos / 8];
        *byte = (*byte & !mask) | (chunk << shift);
        pos += take;
        remaining -= take;
    }
}

/// Writes `values` as consecutive fields of `width` bits each, starting at bit
/// `offset` and skipping `skip` bits after every field.
///
/// # Panics
///
/// Panics under the same conditions as [`set_bits`].
pub fn set_bits_n(buf: &mut [u8], values: &[u64], offset: usize, width: usize, skip: usize) {
    for (i, value) in values.iter().enumerate() {
        set_bits(buf, *value, offset + i * (width + skip), width);
    }
}

/// Packs `values` into a new buffer as consecutive `width`-bit fields. The
/// last octet is padded with zero bits.
pub fn pack_bits<I>(values: I, width: usize) -> Vec<u8>
where
    I: IntoIterator<Item = u64>,
    I::IntoIter: ExactSizeIterator,
{
    let values = values.into_iter();
    let mut buf = vec![0u8; num_octets(values.len() * width)];
    for (i, value) in values.enumerate() {
        set_bits(&mut buf, value, i * width, width);
    }
    buf
}

#[inline]
fn low_mask(bits: usize) -> u8 {
    ((1u16 << bits) - 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_octet_write() {
        let mut out = [0u8; 1];
        set_bits(&mut out, 1, 0, 8);
        assert_eq!(out[0], 1);
    }

    #[test]
    fn read_across_octet_boundaries() {
        let buf = [0b0000_0000, 0b1111_1111, 0b1111_1111, 0, 0];
        assert_eq!(get_bits(&buf, 0, 9), 0b000000001);
        assert_eq!(get_bits(&buf, 9, 9), 0b111111111);
        assert_eq!(get_bits(&buf, 18, 9), 0b111111000);
        assert_eq!(get_bits(&buf, 7, 2), 0b01);
        assert_eq!(get_bits(&buf, 3, 0), 0);
    }

    #[test]
    fn read_64_bits() {
        let buf = [0xff, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef];
        assert_eq!(get_bits(&buf, 8, 64), 0x0123_4567_89ab_cdef);
        assert_eq!(get_bits(&buf, 4, 64), 0xf012_3456_789a_bcde);
    }

    #[test]
    fn batched_read_with_skip() {
        // 4-bit fields separated by 4 skipped bits: the high nibble of each octet
        let buf = [0x1a, 0x2b, 0x3c];
        assert_eq!(get_bits_n(&buf, 0, 4, 4, 3), vec![1, 2, 3]);
        assert_eq!(get_bits_n(&buf, 4, 4, 4, 3), vec![0xa, 0xb, 0xc]);
    }

    #[test]
    fn batched_write_with_skip() {
        let mut buf = [0xffu8; 2];
        set_bits_n(&mut buf, &[0, 0, 0, 0], 1, 2, 2);
        assert_eq!(buf, [0b1001_1001, 0b1001_1001]);
    }

    #[test]
    fn write_then_read_is_identity_and_keeps_neighbours() {
        let value = 0xdead_beef_u64;
        for width in 1..=32 {
            for offset in 0..24 {
                let mut buf = [0b1010_0101u8; 8];
                let original = buf;
                set_bits(&mut buf, value, offset, width);

                assert_eq!(
                    get_bits(&buf, offset, width),
                    value & ((1u64 << width) - 1),
                    "width {width}, offset {offset}"
                );
                for bit in (0..offset).chain(offset + width..64) {
                    assert_eq!(
                        get_bits(&buf, bit, 1),
                        get_bits(&original, bit, 1),
                        "bit {bit} changed (width {width}, offset {offset})"
                    );
                }
            }
        }
    }

    #[test]
    fn packing_pads_last_octet() {
        let packed = pack_bits(vec![1u64, 2, 3], 3);
        assert_eq!(packed, vec![0b0010_1001, 0b1000_0000]);
    }

    #[test]
    fn packing_with_zero_width() {
        let packed = pack_bits(vec![0u64; 10], 0);
        assert!(packed.is_empty());
    }
}
