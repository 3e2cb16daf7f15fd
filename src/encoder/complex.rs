use crate::{
    bits::pack_bits,
    codetables::Table5_6,
    encoder::{
        param,
        simple::{MAX_NUM_BITS, bit_width, check_finite, min_max},
    },
    error::EncodeError,
    helpers::push_grib_int,
    ieee::f32_to_template_value,
};

/// Group length used when the template leaves entry 12 zero.
const DEFAULT_GROUP_LEN: usize = 16;

/// Packs `values` with complex packing (template 5.2), or with complex
/// packing and spatial differencing of order `template[16]` (template 5.3)
/// when `spatial_differencing` is set.
///
/// Groups have a fixed length and no missing value management is applied.
pub(crate) fn encode(
    template: &[i64],
    values: &[f32],
    spatial_differencing: bool,
) -> Result<(Vec<i64>, Vec<u8>), EncodeError> {
    check_finite(values)?;
    let exp: i16 = param::narrow(template, 1)?;
    let dig: i16 = param::narrow(template, 2)?;
    let group_len = match param::narrow::<u32>(template, 12)? {
        0 => DEFAULT_GROUP_LEN,
        n => n as usize,
    };
    let order = if spatial_differencing {
        let order: u8 = param::narrow(template, 16)?;
        match Table5_6::try_from(order) {
            Ok(Table5_6::FirstOrder | Table5_6::SecondOrder) => order,
            _ => {
                return Err(EncodeError::NotSupported(
                    "GRIB2 code table 5.6 (order of spatial differencing)",
                    order.into(),
                ));
            }
        }
    } else {
        0
    };

    let mut out_template = vec![0; if spatial_differencing { 18 } else { 16 }];
    out_template[2] = dig.into();
    out_template[5] = 1;
    if spatial_differencing {
        out_template[16] = order.into();
    }

    let (min, max) = min_max(values);
    if values.is_empty() || min == max {
        out_template[0] = f32_to_template_value(values.first().copied().unwrap_or(0.0));
        return Ok((out_template, Vec::new()));
    }

    let (ref_val, ints) = scale(values, exp, dig, min);
    out_template[0] = f32_to_template_value(ref_val);
    out_template[1] = exp.into();

    let mut payload = Vec::new();
    let stream = if spatial_differencing {
        let diff = SpatialDifferences::new(&ints, order);
        let num_octets = diff.num_octets();
        out_template[17] = num_octets as i64;
        for value in diff.first_values.iter().chain(std::iter::once(&diff.minimum)) {
            push_grib_int(&mut payload, *value, num_octets)?;
        }
        diff.stream
    } else {
        ints.into_iter().map(|v| v as u64).collect()
    };

    let groups = Groups::split(&stream, group_len);
    let ref_nbit = bit_width(groups.refs.iter().copied().max().unwrap_or(0));
    if ref_nbit > MAX_NUM_BITS {
        return Err(EncodeError::ValueOutOfRange(format!(
            "group references need {ref_nbit} bits"
        )));
    }
    let width_ref = groups.widths.iter().copied().min().unwrap_or(0);
    let max_width = groups.widths.iter().copied().max().unwrap_or(0);
    if max_width > MAX_NUM_BITS {
        return Err(EncodeError::ValueOutOfRange(format!(
            "group values need {max_width} bits"
        )));
    }
    let width_nbit = bit_width(u64::from(max_width - width_ref));
    let ngroup = groups.refs.len();
    let last_len = stream.len() - (ngroup - 1) * group_len;

    out_template[3] = ref_nbit.into();
    out_template[9] = ngroup as i64;
    out_template[10] = width_ref.into();
    out_template[11] = width_nbit.into();
    out_template[12] = group_len as i64;
    out_template[13] = 1;
    out_template[14] = last_len as i64;
    out_template[15] = 0;

    payload.extend(pack_bits(groups.refs.iter().copied(), usize::from(ref_nbit)));
    payload.extend(pack_bits(
        groups.widths.iter().map(|w| u64::from(w - width_ref)),
        usize::from(width_nbit),
    ));
    // Every group length equals the reference length, so lengths take no bits.
    payload.extend(groups.pack_values(&stream, group_len));

    Ok((out_template, payload))
}

/// Scales values to non-negative integers relative to the reference value,
/// rounding to integers after decimal scaling when no binary scale is given.
fn scale(values: &[f32], exp: i16, dig: i16, min: f32) -> (f32, Vec<i64>) {
    let dscale = 10_f64.powi(dig.into());
    if exp == 0 {
        let imin = (f64::from(min) * dscale).round();
        let ints = values
            .iter()
            .map(|v| ((f64::from(*v) * dscale).round() - imin) as i64)
            .collect();
        (imin as f32, ints)
    } else {
        let ref_val = (f64::from(min) * dscale) as f32;
        let bscale = 2_f64.powi(-i32::from(exp));
        let ints = values
            .iter()
            .map(|v| {
                ((f64::from(*v) * dscale - f64::from(ref_val)) * bscale)
                    .round()
                    .max(0.0) as i64
            })
            .collect();
        (ref_val, ints)
    }
}

struct SpatialDifferences {
    first_values: Vec<i64>,
    minimum: i64,
    stream: Vec<u64>,
}

impl SpatialDifferences {
    fn new(ints: &[i64], order: u8) -> Self {
        let order = usize::from(order);
        let diffs: Vec<i64> = (0..ints.len())
            .map(|i| match (order, i) {
                (_, i) if i < order => 0,
                (1, i) => ints[i] - ints[i - 1],
                (_, i) => ints[i] - 2 * ints[i - 1] + ints[i - 2],
            })
            .collect();
        let minimum = diffs.iter().skip(order).copied().min().unwrap_or(0);
        let stream = diffs
            .iter()
            .enumerate()
            .map(|(i, d)| if i < order { 0 } else { (d - minimum) as u64 })
            .collect();
        Self {
            first_values: ints.iter().take(order).copied().collect(),
            minimum,
            stream,
        }
    }

    /// Octets for each sign-magnitude descriptor, at least 1.
    fn num_octets(&self) -> usize {
        let max_abs = self
            .first_values
            .iter()
            .chain(std::iter::once(&self.minimum))
            .map(|v| v.unsigned_abs())
            .max()
            .unwrap_or(0);
        (usize::from(bit_width(max_abs)) + 1).div_ceil(8).max(1)
    }
}

struct Groups {
    refs: Vec<u64>,
    widths: Vec<u8>,
}

impl Groups {
    fn split(stream: &[u64], group_len: usize) -> Self {
        let (refs, widths) = stream
            .chunks(group_len)
            .map(|chunk| {
                let min = chunk.iter().copied().min().unwrap_or(0);
                let max = chunk.iter().copied().max().unwrap_or(0);
                (min, bit_width(max - min))
            })
            .unzip();
        Self { refs, widths }
    }

    fn pack_values(&self, stream: &[u64], group_len: usize) -> Vec<u8> {
        let total_bits: usize = stream
            .chunks(group_len)
            .zip(&self.widths)
            .map(|(chunk, width)| chunk.len() * usize::from(*width))
            .sum();
        let mut buf = vec![0u8; total_bits.div_ceil(8)];
        let mut pos = 0;
        for ((chunk, reference), width) in stream.chunks(group_len).zip(&self.refs).zip(&self.widths) {
            let width = usize::from(*width);
            if width == 0 {
                continue;
            }
            for value in chunk {
                crate::bits::set_bits(&mut buf, value - reference, pos, width);
                pos += width;
            }
        }
        buf
    }
}
