use crate::{bits::pack_bits, encoder::param, error::EncodeError, ieee::f32_to_template_value};

/// Widest packed value the encoders produce.
pub(crate) const MAX_NUM_BITS: u8 = 32;

/// Integers and scaling parameters of a field packed with simple packing.
///
/// `ints` is empty for a constant field, which is represented by the
/// reference value alone with 0 bits per value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SimplePacking {
    pub(crate) ref_val: f32,
    pub(crate) exp: i16,
    pub(crate) dig: i16,
    pub(crate) nbit: u8,
    pub(crate) ints: Vec<u64>,
}

impl SimplePacking {
    /// Computes the packing of `values` with decimal scale factor `dig`.
    ///
    /// A zero `nbit` or `exp` is worked out from the range of the values:
    ///
    /// - neither given: values are rounded to integers after decimal scaling
    ///   and `nbit` is the width of the largest difference from the minimum;
    /// - `nbit` given: `exp` is the smallest binary scale fitting the range
    ///   in `nbit` bits;
    /// - `exp` given: `nbit` is the width of the scaled range;
    /// - both given: every scaled value must fit in `nbit` bits.
    pub(crate) fn compute(values: &[f32], exp: i16, dig: i16, nbit: u8) -> Result<Self, EncodeError> {
        check_finite(values)?;
        if nbit > MAX_NUM_BITS {
            return Err(EncodeError::ValueOutOfRange(format!(
                "{nbit} bits per value exceeds {MAX_NUM_BITS}"
            )));
        }

        let (min, max) = min_max(values);
        if values.is_empty() || min == max {
            return Ok(Self::constant(values.first().copied().unwrap_or(0.0), dig));
        }

        let dscale = 10_f64.powi(dig.into());
        let rmin = f64::from(min) * dscale;
        let rmax = f64::from(max) * dscale;

        let (ref_val, exp, nbit) = match (nbit, exp) {
            (0, 0) => {
                let imin = rmin.round();
                let maxdif = rmax.round() - imin;
                (imin, 0, bit_width(maxdif as u64))
            }
            (n, 0) => {
                let maxnum = (2_f64.powi(n.into()) - 1.0) / (rmax - rmin);
                let exp = (-maxnum.log2()).ceil();
                (rmin, exp as i16, n)
            }
            (0, e) => {
                let maxdif = ((rmax - rmin) * 2_f64.powi(-i32::from(e))).round();
                (rmin, e, bit_width(maxdif as u64))
            }
            (n, e) => (rmin, e, n),
        };
        if nbit == 0 {
            // The range rounds away, which leaves a constant field.
            return Ok(Self::constant((ref_val / dscale) as f32, dig));
        }
        if nbit > MAX_NUM_BITS {
            return Err(EncodeError::ValueOutOfRange(format!(
                "values need {nbit} bits, more than {MAX_NUM_BITS}"
            )));
        }

        let ref_f32 = ref_val as f32;
        let ref_val = f64::from(ref_f32);
        let bscale = 2_f64.powi(-i32::from(exp));
        let max_int = (1u64 << nbit) - 1;
        let mut ints = Vec::with_capacity(values.len());
        for value in values {
            let scaled = if exp == 0 && ref_val.fract() == 0.0 {
                (f64::from(*value) * dscale).round() - ref_val
            } else {
                ((f64::from(*value) * dscale - ref_val) * bscale).round()
            };
            let int = scaled.max(0.0) as u64;
            if int > max_int {
                return Err(EncodeError::ValueOutOfRange(format!(
                    "{value} does not fit in {nbit} bits with E = {exp} and D = {dig}"
                )));
            }
            ints.push(int);
        }

        Ok(Self {
            ref_val: ref_f32,
            exp,
            dig,
            nbit,
            ints,
        })
    }

    fn constant(value: f32, dig: i16) -> Self {
        Self {
            ref_val: value,
            exp: 0,
            dig,
            nbit: 0,
            ints: Vec::new(),
        }
    }

    pub(crate) fn is_constant(&self) -> bool {
        self.nbit == 0
    }

    /// The leading template entries shared by templates based on simple
    /// packing, followed by type of original field values 0 (floating point).
    pub(crate) fn template_head(&self) -> [i64; 5] {
        [
            f32_to_template_value(self.ref_val),
            self.exp.into(),
            self.dig.into(),
            self.nbit.into(),
            0,
        ]
    }

    /// The integers packed `nbit` bits each.
    pub(crate) fn pack(&self) -> Vec<u8> {
        pack_bits(self.ints.iter().copied(), usize::from(self.nbit))
    }
}

/// Packs `values` with simple packing (template 5.0).
pub(crate) fn encode(template: &[i64], values: &[f32]) -> Result<(Vec<i64>, Vec<u8>), EncodeError> {
    let packing = SimplePacking::compute(
        values,
        param::narrow(template, 1)?,
        param::narrow(template, 2)?,
        param::narrow(template, 3)?,
    )?;
    Ok((packing.template_head().to_vec(), packing.pack()))
}

pub(crate) fn check_finite(values: &[f32]) -> Result<(), EncodeError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(EncodeError::ValueOutOfRange(format!(
            "value at {i} is not finite: {}",
            values[i]
        ))),
        None => Ok(()),
    }
}

pub(crate) fn min_max(values: &[f32]) -> (f32, f32) {
    values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), v| {
            (min.min(*v), max.max(*v))
        })
}

/// Number of bits needed to hold `value`.
pub(crate) fn bit_width(value: u64) -> u8 {
    (u64::BITS - value.leading_zeros()) as u8
}
