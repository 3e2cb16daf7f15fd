use crate::{
    encoder::{param, simple::SimplePacking},
    error::EncodeError,
};

/// Packs `values` as a single-row PNG image (template 5.41).
///
/// The number of bits per value is rounded up to 8, 16, 24 or 32, stored as
/// 8-bit gray, 16-bit gray, 8-bit RGB or 8-bit RGBA pixels respectively.
pub(crate) fn encode(template: &[i64], values: &[f32]) -> Result<(Vec<i64>, Vec<u8>), EncodeError> {
    let mut packing = SimplePacking::compute(
        values,
        param::narrow(template, 1)?,
        param::narrow(template, 2)?,
        param::narrow(template, 3)?,
    )?;
    if packing.is_constant() {
        return Ok((packing.template_head().to_vec(), Vec::new()));
    }

    let (nbit, color, depth) = match packing.nbit {
        1..=8 => (8, png::ColorType::Grayscale, png::BitDepth::Eight),
        9..=16 => (16, png::ColorType::Grayscale, png::BitDepth::Sixteen),
        17..=24 => (24, png::ColorType::Rgb, png::BitDepth::Eight),
        _ => (32, png::ColorType::Rgba, png::BitDepth::Eight),
    };
    packing.nbit = nbit;
    let width = u32::try_from(values.len()).map_err(|_| {
        EncodeError::ValueOutOfRange(format!("too many values for a PNG row: {}", values.len()))
    })?;

    let payload = write_image(&packing.pack(), width, color, depth)
        .map_err(|e| EncodeError::Unknown(format!("PNG encode error: {e}")))?;
    Ok((packing.template_head().to_vec(), payload))
}

fn write_image(
    data: &[u8],
    width: u32,
    color: png::ColorType,
    depth: png::BitDepth,
) -> Result<Vec<u8>, png::EncodingError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, 1);
        encoder.set_color(color);
        encoder.set_depth(depth);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(data)?;
        writer.finish()?;
    }
    Ok(out)
}
