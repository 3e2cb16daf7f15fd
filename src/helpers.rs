use crate::error::EncodeError;

macro_rules! read_as {
    ($ty:ty, $buf:ident, $start:expr) => {{
        let start = $start;
        let mut bytes = [0u8; std::mem::size_of::<$ty>()];
        bytes.copy_from_slice(&$buf[start..start + std::mem::size_of::<$ty>()]);
        <$ty>::from_be_bytes(bytes)
    }};
}
pub(crate) use read_as;

/// Reads a big-endian unsigned integer of 0 to 8 octets.
pub(crate) fn uint_from_bytes(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Reads a sign-magnitude integer of 1 to 8 octets, where the most significant
/// bit is the sign.
pub(crate) fn grib_int_from_bytes(bytes: &[u8]) -> i64 {
    let Some((first, rest)) = bytes.split_first() else {
        return 0;
    };
    let negative = first.leading_zeros() == 0;
    let abs = rest
        .iter()
        .fold(u64::from(first & 0x7f), |acc, byte| (acc << 8) | u64::from(*byte));
    let abs = abs as i64;
    if negative { -abs } else { abs }
}

/// Appends `value` as a big-endian unsigned integer of `width` octets.
pub(crate) fn push_uint(out: &mut Vec<u8>, value: u64, width: usize) -> Result<(), EncodeError> {
    if width < 8 && value >> (width * 8) != 0 {
        return Err(EncodeError::ValueOutOfRange(format!(
            "{value} does not fit in {width} octet(s)"
        )));
    }
    let bytes = value.to_be_bytes();
    out.extend_from_slice(&bytes[8 - width..]);
    Ok(())
}

/// Appends `value` as a sign-magnitude integer of `width` octets.
pub(crate) fn push_grib_int(out: &mut Vec<u8>, value: i64, width: usize) -> Result<(), EncodeError> {
    let abs = value.unsigned_abs();
    let sign_bit = 1u64 << (width * 8 - 1);
    if abs >= sign_bit {
        return Err(EncodeError::ValueOutOfRange(format!(
            "{value} does not fit in {width} signed octet(s)"
        )));
    }
    let raw = if value < 0 { abs | sign_bit } else { abs };
    let bytes = raw.to_be_bytes();
    out.extend_from_slice(&bytes[8 - width..]);
    Ok(())
}

/// Number of octets needed to hold `bits` bits.
pub(crate) fn num_octets(bits: usize) -> usize {
    bits.div_ceil(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_conversion_from_bytes_to_grib_int {
        ($(($name:ident, $input:expr, $expected:expr),)*) => ($(
            #[test]
            fn $name() {
                let bytes = $input;
                let actual = grib_int_from_bytes(&bytes);
                let expected = $expected;
                assert_eq!(actual, expected)
            }
        )*);
    }

    test_conversion_from_bytes_to_grib_int! {
        (
            conversion_from_bytes_to_grib_int_for_1_byte_positive,
            vec![0b01010101],
            0b01010101
        ),
        (
            conversion_from_bytes_to_grib_int_for_1_byte_negative,
            vec![0b11010101],
            -0b01010101
        ),
        (
            conversion_from_bytes_to_grib_int_for_2_bytes_negative,
            vec![0b11010101, 0b10101010],
            -0b0101_0101_1010_1010
        ),
        (
            conversion_from_bytes_to_grib_int_for_3_bytes_negative_starting_from_0x80,
            vec![0b10000000, 0b10101010, 0b10101010],
            -0b0000_0000_1010_1010_1010_1010
        ),
        (
            conversion_from_bytes_to_grib_int_for_4_bytes_positive,
            vec![0b01010101, 0b10101010, 0b10101010, 0b10101010],
            0b0101_0101_1010_1010_1010_1010_1010_1010
        ),
        (
            conversion_from_bytes_to_grib_int_for_4_bytes_negative,
            vec![0b11010101, 0b10101010, 0b10101010, 0b10101010],
            -0b0101_0101_1010_1010_1010_1010_1010_1010
        ),
    }

    macro_rules! test_grib_int_encoding {
        ($(($name:ident, $value:expr, $width:expr, $expected:expr),)*) => ($(
            #[test]
            fn $name() {
                let mut out = Vec::new();
                push_grib_int(&mut out, $value, $width).unwrap();
                assert_eq!(out, $expected);
                assert_eq!(grib_int_from_bytes(&out), $value);
            }
        )*);
    }

    test_grib_int_encoding! {
        (grib_int_encoding_1_octet_negative, -64, 1, vec![0b11000000]),
        (grib_int_encoding_2_octets_positive, 300, 2, vec![0x01, 0x2c]),
        (grib_int_encoding_4_octets_negative, -90_000_000, 4, vec![0x85, 0x5d, 0x4a, 0x80]),
        (grib_int_encoding_zero, 0, 4, vec![0, 0, 0, 0]),
    }

    #[test]
    fn grib_int_encoding_overflow() {
        let mut out = Vec::new();
        assert!(push_grib_int(&mut out, 128, 1).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn uint_encoding_and_overflow() {
        let mut out = Vec::new();
        push_uint(&mut out, 0xffff_ffff, 4).unwrap();
        push_uint(&mut out, 2021, 2).unwrap();
        assert_eq!(out, vec![0xff, 0xff, 0xff, 0xff, 0x07, 0xe5]);
        assert_eq!(uint_from_bytes(&out[4..]), 2021);
        assert!(push_uint(&mut out, 256, 1).is_err());
    }

    #[test]
    fn octet_count() {
        let actual = (0..10).map(num_octets).collect::<Vec<_>>();
        assert_eq!(actual, vec![0, 1, 1, 1, 1, 1, 1, 1, 1, 2]);
    }
}
