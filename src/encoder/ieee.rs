use crate::{codetables::Table5_7, encoder::param, error::EncodeError, ieee};

/// Stores `values` as IEEE floating-point numbers (template 5.4) of the
/// precision given in template entry 0.
pub(crate) fn encode(template: &[i64], values: &[f32]) -> Result<(Vec<i64>, Vec<u8>), EncodeError> {
    let precision: u8 = param::narrow(template, 0)?;
    let mut payload = Vec::new();
    match Table5_7::try_from(precision) {
        Ok(Table5_7::Single) => ieee::write_f32s(values, &mut payload),
        Ok(Table5_7::Double) => {
            let values: Vec<f64> = values.iter().map(|v| f64::from(*v)).collect();
            ieee::write_f64s(&values, &mut payload);
        }
        _ => {
            return Err(EncodeError::NotSupported(
                "GRIB2 code table 5.7 (precision of floating-point numbers)",
                precision.into(),
            ));
        }
    }
    Ok((vec![precision.into()], payload))
}
