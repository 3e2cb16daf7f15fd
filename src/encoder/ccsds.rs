use crate::{
    config::CodecConfig,
    decoder::ccsds::{AEC_DATA_MSB, bytes_per_sample, encode_samples, encoding_options},
    encoder::{param, simple::SimplePacking},
    error::EncodeError,
};

/// Packs `values` with CCSDS recommended lossless compression (template
/// 5.42). Samples are always handed to libaec most significant byte first.
pub(crate) fn encode(
    template: &[i64],
    values: &[f32],
    config: &CodecConfig,
) -> Result<(Vec<i64>, Vec<u8>), EncodeError> {
    let packing = SimplePacking::compute(
        values,
        param::narrow(template, 1)?,
        param::narrow(template, 2)?,
        param::narrow(template, 3)?,
    )?;
    let (block_size, rsi, flags) = encoding_options(template, config);
    let flags = flags | AEC_DATA_MSB;

    let mut out_template = packing.template_head().to_vec();
    out_template.extend([i64::from(flags), i64::from(block_size), i64::from(rsi)]);
    if packing.is_constant() {
        return Ok((out_template, Vec::new()));
    }

    let size = bytes_per_sample(packing.nbit, flags);
    let mut samples = Vec::with_capacity(packing.ints.len() * size);
    for int in &packing.ints {
        samples.extend_from_slice(&int.to_be_bytes()[8 - size..]);
    }
    let payload = encode_samples(&samples, packing.nbit, block_size, rsi, flags)?;
    Ok((out_template, payload))
}
