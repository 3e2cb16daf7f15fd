//! JPEG 2000 code stream support (templates 5.40, 5.40000 and 5.40010)
//! through OpenJPEG.

use self::{
    codec::{DecodeParams, Decoder, EncodeParams, Encoder},
    image::Image,
    stream::Stream,
};
use crate::{
    config::CodecConfig,
    decoder::{
        collect_points,
        param::SimplePackingParam,
        simple::{self, NonZeroSimplePackingDecoder},
    },
    error::{DecodeError, EncodeError},
};

mod codec;
mod image;
mod stream;

pub(crate) fn decode(
    template: &[i64],
    payload: &[u8],
    num_points: usize,
    config: &CodecConfig,
) -> Result<Vec<f32>, DecodeError> {
    SimplePackingParam::check_orig_field_type(template)?;
    let param = SimplePackingParam::from_template(template)?;
    if param.nbit == 0 {
        return collect_points(simple::unpack(&param, payload, num_points), num_points);
    }

    let samples = decode_code_stream(payload, config.jpeg2000_threads)
        .map_err(|e| DecodeError::from(format!("JPEG 2000 decode error: {e}")))?;
    if samples.len() > num_points {
        log::warn!(
            "JPEG 2000 image holds {} samples for {num_points} points; ignoring the rest",
            samples.len()
        );
    }
    let iter = NonZeroSimplePackingDecoder::new(samples.into_iter().take(num_points), &param);
    collect_points(iter, num_points)
}

fn decode_code_stream(buf: &[u8], num_threads: u32) -> Result<Vec<i32>, &'static str> {
    let stream = Stream::from_bytes(buf)?;
    let decoder = Decoder::new(stream, num_threads)?;
    decoder.setup(DecodeParams::default())?;
    let image = decoder.read_header()?;
    decoder.decode(&image)?;

    match image.components() {
        [gray] => Ok(gray.data().to_vec()),
        _ => Err("only single-component images are supported"),
    }
}

/// Compresses unsigned `samples` of `nbit` bits each into a J2K code stream
/// of `width` x `height` pixels.
pub(crate) fn encode_code_stream(
    samples: &[i32],
    width: u32,
    height: u32,
    nbit: u8,
    reversible: bool,
    compression_ratio: u32,
    config: &CodecConfig,
) -> Result<Vec<u8>, EncodeError> {
    let image = Image::grayscale(samples, width, height, u32::from(nbit))
        .map_err(EncodeError::from)?;
    let encoder = Encoder::new(config.jpeg2000_threads).map_err(EncodeError::from)?;
    encoder
        .encode(EncodeParams::new(reversible, compression_ratio), &image)
        .map_err(EncodeError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossless_code_stream_round_trip() {
        let samples: Vec<i32> = (0..64).map(|i| (i * 37) % 1024).collect();
        let config = CodecConfig::default();
        let stream = encode_code_stream(&samples, 64, 1, 10, true, 0, &config).unwrap();
        // SOC marker
        assert_eq!(&stream[..2], &[0xff, 0x4f]);
        assert_eq!(decode_code_stream(&stream, 1).unwrap(), samples);
    }

    #[test]
    fn decode_with_simple_packing_parameters() {
        let samples = vec![0, 5, 10, 15];
        let config = CodecConfig::default();
        let payload = encode_code_stream(&samples, 4, 1, 4, true, 0, &config).unwrap();
        // reference 100.0, E = 0, D = 1
        let template = vec![0x42c8_0000, 0, 1, 4, 0, 0, 255];
        let actual = decode(&template, &payload, 4, &config).unwrap();
        let expected = [10.0, 10.5, 11.0, 11.5];
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-5, "{a} != {e}");
        }
    }

    #[test]
    fn decode_garbage() {
        let template = vec![0, 0, 0, 8, 0, 0, 255];
        assert!(decode(&template, &[0; 16], 4, &CodecConfig::default()).is_err());
    }

    #[test]
    fn mismatched_image_size() {
        assert!(encode_code_stream(&[1, 2, 3], 2, 2, 8, true, 0, &CodecConfig::default()).is_err());
    }
}
