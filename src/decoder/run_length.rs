use crate::{
    decoder::{collect_points, param::RunLengthPackingParam, stream::NBitwiseIterator},
    error::DecodeError,
};

/// Decodes run length packing with level values (template 5.200). Level 0
/// stands for missing and decodes to NaN.
pub(crate) fn decode(
    template: &[i64],
    payload: &[u8],
    num_points: usize,
) -> Result<Vec<f32>, DecodeError> {
    let param = RunLengthPackingParam::from_template(template)?;
    if param.nbit == 0 || param.nbit > 16 {
        return Err(DecodeError::NotSupported(
            "number of bits used for each packed value in run length packing",
            param.nbit.into(),
        ));
    }
    if u32::from(param.maxv) >= 1 << param.nbit {
        return Err(DecodeError::from(format!(
            "maximum level {} does not fit in {} bits",
            param.maxv, param.nbit
        )));
    }

    let mut level_map = Vec::with_capacity(usize::from(param.max_level) + 1);
    level_map.push(f32::NAN);
    let factor = 10_f32.powi(-i32::from(param.num_digits));
    level_map.extend(param.level_values.iter().map(|val| f32::from(*val) * factor));

    let decoded_levels = rleunpack(payload, param.nbit, param.maxv, Some(num_points))?;

    let level_to_value = |level: &u16| -> Result<f32, DecodeError> {
        let index: usize = (*level).into();
        level_map
            .get(index)
            .copied()
            .ok_or(DecodeError::from(format!("invalid level value: {level}")))
    };

    let decoded: Result<Vec<_>, _> = decoded_levels.iter().map(level_to_value).collect();
    collect_points(decoded?.into_iter(), num_points)
}

// Since maxv is represented as a 16-bit integer, values are 16 bits or less.
fn rleunpack(
    input: &[u8],
    nbit: u8,
    maxv: u16,
    expected_len: Option<usize>,
) -> Result<Box<[u16]>, DecodeError> {
    let mut out_buf = Vec::new();
    if let Some(len) = expected_len {
        out_buf
            .try_reserve_exact(len)
            .map_err(|_| DecodeError::AllocationFailed(len))?;
    }

    let rlbase = u32::from(maxv) + 1;
    let lngu: usize = ((1u32 << nbit) - rlbase) as usize;
    let mut cached = None;
    let mut exp: usize = 1;
    let iter = NBitwiseIterator::new(input, usize::from(nbit));

    for value in iter {
        if rlbase > value {
            let value = value as u16;
            out_buf.push(value);
            cached = Some(value);
            exp = 1;
        } else {
            let prev = cached.ok_or(DecodeError::from("invalid first value"))?;
            let new_len = ((value - rlbase) as usize)
                .checked_mul(exp)
                .and_then(|length| out_buf.len().checked_add(length))
                .ok_or(DecodeError::LengthMismatch)?;
            if let Some(len) = expected_len
                && new_len > len
            {
                return Err(DecodeError::LengthMismatch);
            }
            out_buf.resize(new_len, prev);
            exp = exp.saturating_mul(lngu);
        }
    }

    if let Some(len) = expected_len
        && len != out_buf.len()
    {
        return Err(DecodeError::LengthMismatch);
    }

    Ok(out_buf.into_boxed_slice())
}
