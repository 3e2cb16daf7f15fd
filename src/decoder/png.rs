use crate::{
    decoder::{
        collect_points,
        param::SimplePackingParam,
        simple::{self, NonZeroSimplePackingDecoder},
        stream::NBitwiseIterator,
    },
    error::DecodeError,
};

/// Decodes PNG compressed data (template 5.41). Samples are the packed
/// integers laid out as a single row of pixels.
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

    let buf = read_image_buffer(payload)
        .map_err(|e| DecodeError::from(format!("PNG decode error: {e}")))?;
    let iter = NBitwiseIterator::new(buf, usize::from(param.nbit));
    let (num_pixels, _) = iter.size_hint();
    if num_pixels > num_points {
        log::warn!("PNG image holds {num_pixels} samples for {num_points} points; ignoring the rest");
    }
    let iter = NonZeroSimplePackingDecoder::new(iter.take(num_points), &param);
    collect_points(iter, num_points)
}

fn read_image_buffer(buf: &[u8]) -> Result<Vec<u8>, String> {
    let reader = std::io::Cursor::new(buf);
    let decoder = png::Decoder::new(reader);
    let mut reader = decoder.read_info().map_err(|e| e.to_string())?;
    let buf_size = reader
        .output_buffer_size()
        .ok_or("output buffer size is unknown")?;
    let mut out_buf = Vec::new();
    out_buf
        .try_reserve_exact(buf_size)
        .map_err(|_| format!("failed to allocate {buf_size} octets"))?;
    out_buf.resize(buf_size, 0);
    let info = reader.next_frame(&mut out_buf).map_err(|e| e.to_string())?;
    out_buf.truncate(info.buffer_size());
    Ok(out_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_gray16(samples: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, samples.len() as u32, 1);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Sixteen);
            let mut writer = encoder.write_header().unwrap();
            let data: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
            writer.write_image_data(&data).unwrap();
        }
        out
    }

    #[test]
    fn decode_png_gray16() {
        let payload = encode_gray16(&[0, 1, 2, 1000]);
        // reference 1.0, E = 1, D = 0
        let template = vec![0x3f80_0000, 1, 0, 16, 0];
        let actual = decode(&template, &payload, 4).unwrap();
        assert_eq!(actual, vec![1.0, 3.0, 5.0, 2001.0]);
    }

    #[test]
    fn decode_png_with_zero_bits() {
        let template = vec![0x4000_0000, 0, 0, 0, 0];
        assert_eq!(decode(&template, &[], 3), Ok(vec![2.0; 3]));
    }

    #[test]
    fn decode_png_with_too_few_samples() {
        let payload = encode_gray16(&[1, 2]);
        let template = vec![0, 0, 0, 16, 0];
        assert_eq!(
            decode(&template, &payload, 3),
            Err(DecodeError::LengthMismatch)
        );
    }

    #[test]
    fn decode_broken_png() {
        let template = vec![0, 0, 0, 16, 0];
        assert!(matches!(
            decode(&template, b"not a png", 3),
            Err(DecodeError::Unknown(_))
        ));
    }
}
