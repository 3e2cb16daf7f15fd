use self::aec::Stream;
use crate::{
    config::CodecConfig,
    decoder::{
        collect_points,
        param::{CcsdsCompressionParam, SimplePackingParam},
        simple::{self, NonZeroSimplePackingDecoder},
        stream::NBitwiseIterator,
    },
    error::{DecodeError, EncodeError},
};

mod aec;

const AEC_DATA_3BYTE: u8 = libaec_sys::AEC_DATA_3BYTE as u8;
pub(crate) const AEC_DATA_MSB: u8 = libaec_sys::AEC_DATA_MSB as u8;

/// Octets a sample of `nbit` bits takes in libaec buffers. 24-bit samples
/// are padded to 4 octets unless the 3-byte flag is set.
pub(crate) fn bytes_per_sample(nbit: u8, flags: u8) -> usize {
    match usize::from(nbit).div_ceil(8) {
        3 if flags & AEC_DATA_3BYTE == 0 => 4,
        n => n,
    }
}

/// Decodes CCSDS recommended lossless compression (template 5.42).
pub(crate) fn decode(
    template: &[i64],
    payload: &[u8],
    num_points: usize,
) -> Result<Vec<f32>, DecodeError> {
    SimplePackingParam::check_orig_field_type(template)?;
    let param = SimplePackingParam::from_template(template)?;
    if param.nbit == 0 {
        return collect_points(simple::unpack(&param, payload, num_points), num_points);
    }

    let ccsds = CcsdsCompressionParam::from_template(template)?;
    let size = bytes_per_sample(param.nbit, ccsds.mask);
    let out_len = num_points
        .checked_mul(size)
        .ok_or(DecodeError::AllocationFailed(num_points))?;
    let mut out = Vec::new();
    out.try_reserve_exact(out_len)
        .map_err(|_| DecodeError::AllocationFailed(out_len))?;
    out.resize(out_len, 0);

    let mut stream = Stream::new(
        u32::from(param.nbit),
        u32::from(ccsds.block_size),
        u32::from(ccsds.reference_sample_interval),
        u32::from(ccsds.mask),
    );
    let written = stream
        .decode(payload, &mut out)
        .map_err(|e| DecodeError::from(format!("CCSDS decode error: {e}")))?;
    out.truncate(written);

    let iter = NBitwiseIterator::new(out, size * 8);
    let iter = NonZeroSimplePackingDecoder::new(iter, &param);
    collect_points(iter, num_points)
}

/// Compresses big-endian samples of `bytes_per_sample(nbit, flags)` octets
/// each.
pub(crate) fn encode_samples(
    samples: &[u8],
    nbit: u8,
    block_size: u32,
    rsi: u32,
    flags: u8,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = vec![0; samples.len() * 2 + 1024];
    let mut stream = Stream::new(u32::from(nbit), block_size, rsi, u32::from(flags));
    let written = stream.encode(samples, &mut out).map_err(EncodeError::from)?;
    out.truncate(written);
    Ok(out)
}

/// Block size, reference sample interval and flags to encode with: template
/// entries 6, 7 and 5, falling back to `config` where they are zero.
pub(crate) fn encoding_options(template: &[i64], config: &CodecConfig) -> (u32, u32, u8) {
    let entry = |i: usize| template.get(i).copied().unwrap_or(0);
    let block_size = match entry(6) {
        0 => config.ccsds_block_size,
        n => n as u32,
    };
    let rsi = match entry(7) {
        0 => config.ccsds_rsi,
        n => n as u32,
    };
    let flags = match entry(5) {
        0 => config.ccsds_flags,
        n => n as u8,
    };
    (block_size, rsi, flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_bytes_per_sample {
        ($(($name:ident, $nbit:expr, $flags:expr, $expected:expr),)*) => ($(
            #[test]
            fn $name() {
                assert_eq!(bytes_per_sample($nbit, $flags), $expected);
            }
        )*);
    }

    test_bytes_per_sample! {
        (bytes_per_sample_for_8_bits, 8, 0, 1),
        (bytes_per_sample_for_12_bits, 12, 0, 2),
        (bytes_per_sample_for_24_bits, 24, 0, 4),
        (bytes_per_sample_for_24_bits_packed, 24, AEC_DATA_3BYTE, 3),
        (bytes_per_sample_for_32_bits, 32, 0, 4),
    }

    #[test]
    fn decode_compressed_samples() {
        let samples: Vec<u16> = (0..100).map(|i| (i * 7) % 300).collect();
        let raw: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
        // preprocessing and MSB first
        let flags = 0b1100;
        let payload = encode_samples(&raw, 12, 32, 128, flags).unwrap();

        let template = vec![0, 0, 0, 12, 0, flags.into(), 32, 128];
        let actual = decode(&template, &payload, 100).unwrap();
        let expected: Vec<f32> = samples.iter().map(|s| f32::from(*s)).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn template_options_override_config() {
        let config = CodecConfig::default();
        assert_eq!(
            encoding_options(&[0, 0, 0, 8, 0, 0, 0, 0], &config),
            (32, 128, 0b1100)
        );
        assert_eq!(
            encoding_options(&[0, 0, 0, 8, 0, 14, 16, 64], &config),
            (16, 64, 14)
        );
    }
}
