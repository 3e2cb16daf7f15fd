use crate::{
    codetables::Table5_40,
    config::CodecConfig,
    decoder::jpeg2000::encode_code_stream,
    encoder::{param, simple::SimplePacking},
    error::EncodeError,
};

/// Widest sample OpenJPEG stores in its signed 32-bit buffers.
const MAX_SAMPLE_BITS: u8 = 31;

/// Packs `values` as a single-row J2K code stream (template 5.40).
///
/// Template entry 5 selects lossless (0) or lossy (1) compression, entry 6
/// the target compression ratio of lossy compression.
pub(crate) fn encode(
    template: &[i64],
    values: &[f32],
    config: &CodecConfig,
) -> Result<(Vec<i64>, Vec<u8>), EncodeError> {
    let compression_type: u8 = param::narrow(template, 5)?;
    let ratio: u8 = param::narrow(template, 6)?;
    let lossless = match Table5_40::try_from(compression_type) {
        Ok(Table5_40::Lossless) => true,
        Ok(Table5_40::Lossy) => false,
        _ => {
            return Err(EncodeError::NotSupported(
                "GRIB2 code table 5.40 (type of compression)",
                compression_type.into(),
            ));
        }
    };

    let packing = SimplePacking::compute(
        values,
        param::narrow(template, 1)?,
        param::narrow(template, 2)?,
        param::narrow(template, 3)?,
    )?;
    let mut out_template = packing.template_head().to_vec();
    out_template.extend([i64::from(compression_type), if lossless { 255 } else { ratio.into() }]);
    if packing.is_constant() {
        return Ok((out_template, Vec::new()));
    }
    if packing.nbit > MAX_SAMPLE_BITS {
        return Err(EncodeError::ValueOutOfRange(format!(
            "JPEG 2000 samples cannot be {} bits wide",
            packing.nbit
        )));
    }

    let width = u32::try_from(values.len()).map_err(|_| {
        EncodeError::ValueOutOfRange(format!("too many values for an image row: {}", values.len()))
    })?;
    let samples: Vec<i32> = packing.ints.iter().map(|v| *v as i32).collect();
    let reversible = lossless && config.jpeg2000_reversible;
    let ratio = if lossless { 0 } else { u32::from(ratio) };
    let payload = encode_code_stream(&samples, width, 1, packing.nbit, reversible, ratio, config)?;
    Ok((out_template, payload))
}
