use crate::{
    encoder::{param, simple::SimplePacking},
    error::EncodeError,
    ieee::f32_to_template_value,
};

/// Packs spherical harmonic coefficients with simple packing (template
/// 5.50). The real part of the (0,0) coefficient goes unpacked into template
/// entry 4.
pub(crate) fn encode(template: &[i64], values: &[f32]) -> Result<(Vec<i64>, Vec<u8>), EncodeError> {
    let Some((first, rest)) = values.split_first() else {
        return Err(EncodeError::ValueOutOfRange(
            "spectral data needs at least one coefficient".to_owned(),
        ));
    };
    if !first.is_finite() {
        return Err(EncodeError::ValueOutOfRange(format!(
            "value at 0 is not finite: {first}"
        )));
    }
    let packing = SimplePacking::compute(
        rest,
        param::narrow(template, 1)?,
        param::narrow(template, 2)?,
        param::narrow(template, 3)?,
    )?;
    let mut out_template = packing.template_head().to_vec();
    out_template[4] = f32_to_template_value(*first);
    Ok((out_template, packing.pack()))
}
