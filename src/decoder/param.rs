use crate::{error::DecodeError, ieee::template_value_to_f32};

/// Widest packed field the decoders read.
pub(crate) const MAX_NUM_BITS: u8 = 32;

pub(crate) fn entry(values: &[i64], index: usize) -> Result<i64, DecodeError> {
    values.get(index).copied().ok_or(DecodeError::LengthMismatch)
}

fn narrow<T: TryFrom<i64>>(values: &[i64], index: usize) -> Result<T, DecodeError> {
    let value = entry(values, index)?;
    T::try_from(value)
        .map_err(|_| DecodeError::from(format!("template entry {index} out of range: {value}")))
}

/// The leading entries shared by every template based on simple packing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SimplePackingParam {
    pub(crate) ref_val: f32,
    pub(crate) exp: i16,
    pub(crate) dig: i16,
    pub(crate) nbit: u8,
}

impl SimplePackingParam {
    pub(crate) fn from_template(values: &[i64]) -> Result<Self, DecodeError> {
        let nbit: u8 = narrow(values, 3)?;
        if nbit > MAX_NUM_BITS {
            return Err(DecodeError::NotSupported(
                "number of bits for each packed value",
                nbit.into(),
            ));
        }
        Ok(Self {
            ref_val: template_value_to_f32(entry(values, 0)?),
            exp: narrow(values, 1)?,
            dig: narrow(values, 2)?,
            nbit,
        })
    }

    /// Checks the type of original field values (Code Table 5.1), for the
    /// templates that carry it at entry 4.
    pub(crate) fn check_orig_field_type(values: &[i64]) -> Result<(), DecodeError> {
        match entry(values, 4)? {
            0 | 1 => Ok(()),
            t => Err(DecodeError::NotSupported(
                "GRIB2 code table 5.1 (type of original field values)",
                t as u16,
            )),
        }
    }
}

pub(crate) struct ComplexPackingParam {
    pub(crate) group_splitting_method_used: u8,
    pub(crate) missing_value_management_used: u8,
    pub(crate) primary_missing: f32,
    pub(crate) secondary_missing: f32,
    pub(crate) ngroup: u32,
    pub(crate) group_width_ref: u8,
    pub(crate) group_width_nbit: u8,
    pub(crate) group_len_ref: u32,
    pub(crate) group_len_inc: u8,
    pub(crate) group_len_last: u32,
    pub(crate) group_len_nbit: u8,
}

impl ComplexPackingParam {
    pub(crate) fn from_template(values: &[i64]) -> Result<Self, DecodeError> {
        // Substitutes are IEEE floats for floating-point fields and plain
        // integers for integer fields.
        let substitute = |index: usize| -> Result<f32, DecodeError> {
            let raw = entry(values, index)?;
            Ok(if entry(values, 4)? == 0 {
                template_value_to_f32(raw)
            } else {
                raw as f32
            })
        };
        Ok(Self {
            group_splitting_method_used: narrow(values, 5)?,
            missing_value_management_used: narrow(values, 6)?,
            primary_missing: substitute(7)?,
            secondary_missing: substitute(8)?,
            ngroup: narrow(values, 9)?,
            group_width_ref: narrow(values, 10)?,
            group_width_nbit: narrow(values, 11)?,
            group_len_ref: narrow(values, 12)?,
            group_len_inc: narrow(values, 13)?,
            group_len_last: narrow(values, 14)?,
            group_len_nbit: narrow(values, 15)?,
        })
    }
}

pub(crate) struct SpatialDifferencingParam {
    pub(crate) order: u8,
    pub(crate) extra_desc_num_octets: u8,
}

impl SpatialDifferencingParam {
    pub(crate) fn from_template(values: &[i64]) -> Result<Self, DecodeError> {
        Ok(Self {
            order: narrow(values, 16)?,
            extra_desc_num_octets: narrow(values, 17)?,
        })
    }
}

#[cfg_attr(not(feature = "ccsds-unpack-with-libaec"), allow(dead_code))]
pub(crate) struct CcsdsCompressionParam {
    pub(crate) mask: u8,
    pub(crate) block_size: u8,
    pub(crate) reference_sample_interval: u16,
}

impl CcsdsCompressionParam {
    #[cfg_attr(not(feature = "ccsds-unpack-with-libaec"), allow(dead_code))]
    pub(crate) fn from_template(values: &[i64]) -> Result<Self, DecodeError> {
        Ok(Self {
            mask: narrow(values, 5)?,
            block_size: narrow(values, 6)?,
            reference_sample_interval: narrow(values, 7)?,
        })
    }
}

pub(crate) struct SpectralComplexParam {
    pub(crate) laplacian_scaling: i32,
    pub(crate) js: u16,
    pub(crate) ks: u16,
    pub(crate) ms: u16,
    pub(crate) ts: u32,
    pub(crate) precision: u8,
}

impl SpectralComplexParam {
    pub(crate) fn from_template(values: &[i64]) -> Result<Self, DecodeError> {
        Ok(Self {
            laplacian_scaling: narrow(values, 4)?,
            js: narrow(values, 5)?,
            ks: narrow(values, 6)?,
            ms: narrow(values, 7)?,
            ts: narrow(values, 8)?,
            precision: narrow(values, 9)?,
        })
    }
}

pub(crate) struct RunLengthPackingParam {
    pub(crate) nbit: u8,
    pub(crate) maxv: u16,
    pub(crate) max_level: u16,
    pub(crate) num_digits: u8,
    pub(crate) level_values: Vec<u16>,
}

impl RunLengthPackingParam {
    pub(crate) fn from_template(values: &[i64]) -> Result<Self, DecodeError> {
        let max_level: u16 = narrow(values, 2)?;
        let level_values = (0..usize::from(max_level))
            .map(|i| narrow(values, 4 + i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            nbit: narrow(values, 0)?,
            maxv: narrow(values, 1)?,
            max_level,
            num_digits: narrow(values, 3)?,
            level_values,
        })
    }
}
