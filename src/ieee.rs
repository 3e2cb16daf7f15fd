//! Conversion between big-endian IEEE 754 octets and native floats.
//!
//! Conversions go through the raw bit patterns, so NaN payloads and
//! infinities survive unchanged.

use crate::helpers::read_as;

#[inline]
pub fn f32_from_be_bytes(bytes: [u8; 4]) -> f32 {
    f32::from_bits(u32::from_be_bytes(bytes))
}

/// Reads consecutive 4-octet IEEE single-precision values. Trailing octets
/// that do not form a whole value are ignored.
pub fn read_f32s(buf: &[u8]) -> Vec<f32> {
    buf.chunks_exact(4)
        .map(|chunk| f32::from_bits(read_as!(u32, chunk, 0)))
        .collect()
}

/// Reads consecutive 8-octet IEEE double-precision values.
pub fn read_f64s(buf: &[u8]) -> Vec<f64> {
    buf.chunks_exact(8)
        .map(|chunk| f64::from_bits(read_as!(u64, chunk, 0)))
        .collect()
}

pub fn write_f32s(values: &[f32], out: &mut Vec<u8>) {
    out.reserve(values.len() * 4);
    for value in values {
        out.extend_from_slice(&value.to_bits().to_be_bytes());
    }
}

pub fn write_f64s(values: &[f64], out: &mut Vec<u8>) {
    out.reserve(values.len() * 8);
    for value in values {
        out.extend_from_slice(&value.to_bits().to_be_bytes());
    }
}

/// Interprets a template entry holding a raw 4-octet IEEE pattern.
#[inline]
pub fn template_value_to_f32(value: i64) -> f32 {
    f32::from_bits(value as u32)
}

/// Stores `value` as a raw 4-octet IEEE pattern for a template entry.
#[inline]
pub fn f32_to_template_value(value: f32) -> i64 {
    i64::from(value.to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_reference_value() {
        assert_eq!(f32_from_be_bytes([0x3f, 0x80, 0x00, 0x00]), 1.0);
        assert_eq!(f32_from_be_bytes([0xc2, 0xf6, 0x00, 0x00]), -123.0);
    }

    #[test]
    fn special_values_survive() {
        let values = [f32::INFINITY, f32::NEG_INFINITY, -0.0, f32::from_bits(0x7fc0_0001)];
        let mut buf = Vec::new();
        write_f32s(&values, &mut buf);
        assert_eq!(buf.len(), 16);

        let actual = read_f32s(&buf);
        let actual_bits = actual.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        let expected_bits = values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(actual_bits, expected_bits);
    }

    #[test]
    fn doubles() {
        let mut buf = Vec::new();
        write_f64s(&[1.5, -2.25e100], &mut buf);
        assert_eq!(&buf[..8], &[0x3f, 0xf8, 0, 0, 0, 0, 0, 0]);
        assert_eq!(read_f64s(&buf), vec![1.5, -2.25e100]);
    }

    #[test]
    fn template_entry_round_trip() {
        let value = f32_to_template_value(-1.5);
        assert_eq!(value, 0xbfc0_0000);
        assert_eq!(template_value_to_f32(value), -1.5);
    }

    #[test]
    fn truncated_input_is_ignored() {
        assert_eq!(read_f32s(&[0x3f, 0x80, 0, 0, 0x3f]), vec![1.0]);
    }
}
