use std::iter;

use self::{
    diff::{SpatialDiffDecodeIterator, SpatialDifferencingExtraDescriptors},
    missing::DecodedValue,
};
use crate::{
    bits::get_bits,
    decoder::{
        collect_points,
        param::{ComplexPackingParam, SimplePackingParam, SpatialDifferencingParam},
        stream::{BitStream, FixedValueIterator},
    },
    error::*,
    helpers::num_octets,
};

mod diff;
mod missing;

/// Group fields wider than this are rejected as corrupt.
const MAX_GROUP_WIDTH: usize = 32;

/// Decodes complex packing (template 5.2), or complex packing with spatial
/// differencing (template 5.3) when `spatial_differencing` is set.
pub(crate) fn decode(
    template: &[i64],
    payload: &[u8],
    num_points: usize,
    spatial_differencing: bool,
) -> Result<Vec<f32>, DecodeError> {
    SimplePackingParam::check_orig_field_type(template)?;
    let simple_param = SimplePackingParam::from_template(template)?;
    let complex_param = ComplexPackingParam::from_template(template)?;

    if complex_param.ngroup == 0 {
        let iter = FixedValueIterator::new(simple_param.ref_val, num_points);
        return collect_points(iter, num_points);
    }

    if complex_param.group_splitting_method_used != 1 {
        return Err(DecodeError::NotSupported(
            "GRIB2 code table 5.4 (group splitting method)",
            complex_param.group_splitting_method_used.into(),
        ));
    }
    if complex_param.missing_value_management_used > 2 {
        return Err(DecodeError::NotSupported(
            "GRIB2 code table 5.5 (missing value management)",
            complex_param.missing_value_management_used.into(),
        ));
    }

    let (spdiff, body) = if spatial_differencing {
        let param = SpatialDifferencingParam::from_template(template)?;
        let descriptors = SpatialDifferencingExtraDescriptors::new(
            payload,
            param.order,
            param.extra_desc_num_octets,
        )?;
        let body = &payload[descriptors.len()..];
        (Some((param.order, descriptors)), body)
    } else {
        (None, payload)
    };

    let (groups, data) = read_groups(&simple_param, &complex_param, body)?;
    let total_len = groups
        .iter()
        .try_fold(0_usize, |acc, g| acc.checked_add(g.length));
    let total_bits = groups.iter().try_fold(0_usize, |acc, g| {
        g.width.checked_mul(g.length).and_then(|bits| acc.checked_add(bits))
    });
    match (total_len, total_bits) {
        (Some(len), Some(bits)) if len == num_points && bits <= data.len().saturating_mul(8) => {}
        _ => return Err(DecodeError::LengthMismatch),
    }

    let z_min = spdiff.as_ref().map_or(0, |(_, d)| d.minimum());
    let unpacked = ComplexPackingValueDecodeIterator::new(
        groups,
        data,
        complex_param.missing_value_management_used,
        usize::from(simple_param.nbit),
        z_min,
    );

    let bscale = 2_f32.powi(simple_param.exp.into());
    let dscale = 10_f32.powi(-i32::from(simple_param.dig));
    let ref_val = simple_param.ref_val;
    let substitutes = (complex_param.primary_missing, complex_param.secondary_missing);
    let reconstruct = move |v: DecodedValue| {
        v.to_f32(|v| (v as f32 * bscale + ref_val) * dscale, substitutes)
    };

    match spdiff {
        Some((order, descriptors)) => {
            let first_values = descriptors.first_values().into_iter();
            let iter = SpatialDiffDecodeIterator::new(order, unpacked, first_values);
            collect_points(iter.map(reconstruct), num_points)
        }
        None => collect_points(unpacked.map(reconstruct), num_points),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Group {
    reference: u64,
    width: usize,
    length: usize,
}

/// Reads the group references, widths and lengths, each array starting on an
/// octet boundary, and returns them with the remaining packed values.
fn read_groups<'a>(
    simple_param: &SimplePackingParam,
    complex_param: &ComplexPackingParam,
    body: &'a [u8],
) -> Result<(Vec<Group>, &'a [u8]), DecodeError> {
    let ngroup = complex_param.ngroup as usize;
    let ref_nbit = usize::from(simple_param.nbit);
    let width_nbit = usize::from(complex_param.group_width_nbit);
    let len_nbit = usize::from(complex_param.group_len_nbit);

    let group_refs_end_octet = num_octets(ngroup * ref_nbit);
    let group_widths_end_octet = group_refs_end_octet + num_octets(ngroup * width_nbit);
    let group_lens_end_octet = group_widths_end_octet + num_octets(ngroup * len_nbit);
    if body.len() < group_lens_end_octet || width_nbit > MAX_GROUP_WIDTH || len_nbit > 32 {
        return Err(DecodeError::LengthMismatch);
    }

    let group_refs = BitStream::new(&body[..group_refs_end_octet], ref_nbit, ngroup).take(ngroup);

    let group_widths = BitStream::new(
        &body[group_refs_end_octet..group_widths_end_octet],
        width_nbit,
        ngroup,
    )
    .take(ngroup)
    .map(|v| usize::from(complex_param.group_width_ref) + v as usize);

    let group_lens = BitStream::new(
        &body[group_widths_end_octet..group_lens_end_octet],
        len_nbit,
        ngroup,
    )
    .take(ngroup - 1)
    .map(|v| {
        usize::from(complex_param.group_len_inc)
            .saturating_mul(v as usize)
            .saturating_add(complex_param.group_len_ref as usize)
    })
    .chain(iter::once(complex_param.group_len_last as usize));

    let mut groups = Vec::new();
    groups
        .try_reserve_exact(ngroup)
        .map_err(|_| DecodeError::AllocationFailed(ngroup))?;
    for ((reference, width), length) in group_refs.zip(group_widths).zip(group_lens) {
        if width > MAX_GROUP_WIDTH {
            return Err(DecodeError::NotSupported("group width", width as u16));
        }
        groups.push(Group {
            reference: u64::from(reference),
            width,
            length,
        });
    }
    if groups.len() != ngroup {
        return Err(DecodeError::LengthMismatch);
    }

    Ok((groups, &body[group_lens_end_octet..]))
}

struct ComplexPackingValueDecodeIterator<'a> {
    groups: std::vec::IntoIter<Group>,
    current: Option<Group>,
    index_in_group: usize,
    data: &'a [u8],
    pos: usize,
    missing_value_management: u8,
    ref_nbit: usize,
    z_min: i64,
}

impl<'a> ComplexPackingValueDecodeIterator<'a> {
    fn new(
        groups: Vec<Group>,
        data: &'a [u8],
        missing_value_management: u8,
        ref_nbit: usize,
        z_min: i64,
    ) -> Self {
        Self {
            groups: groups.into_iter(),
            current: None,
            index_in_group: 0,
            data,
            pos: 0,
            missing_value_management,
            ref_nbit,
            z_min,
        }
    }
}

impl Iterator for ComplexPackingValueDecodeIterator<'_> {
    type Item = DecodedValue;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(group) = &self.current
                && self.index_in_group < group.length
            {
                break;
            }
            self.current = Some(self.groups.next()?);
            self.index_in_group = 0;
        }
        self.index_in_group += 1;
        let group = self.current.as_ref()?;

        let value = if group.width == 0 {
            // Groups of a constant value have no incremental data; the
            // reference itself may be the missing value pattern.
            DecodedValue::classify(
                group.reference,
                self.ref_nbit,
                self.missing_value_management,
                self.z_min,
            )
        } else {
            let v = get_bits(self.data, self.pos, group.width);
            self.pos += group.width;
            match DecodedValue::classify(v, group.width, self.missing_value_management, 0) {
                DecodedValue::Normal(v) => {
                    DecodedValue::Normal(v + group.reference as i64 + self.z_min)
                }
                missing => missing,
            }
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // reference 0.0, E = 0, D = 0, 4-bit group references
    fn template(
        ngroup: i64,
        width_nbit: i64,
        len_ref: i64,
        last_len: i64,
        missing_management: i64,
    ) -> Vec<i64> {
        vec![
            0,
            0,
            0,
            4,
            0,
            1,
            missing_management,
            0x447a_0000, // 1000.0
            0x44fa_0000, // 2000.0
            ngroup,
            0,
            width_nbit,
            len_ref,
            1,
            last_len,
            0,
            1,
            1,
        ]
    }

    #[test]
    fn decode_complex_packing() {
        // groups: (ref 3, width 2, len 3), (ref 7, width 0, len 2)
        let template = template(2, 2, 3, 2, 0);
        let payload = vec![
            0b0011_0111, // group references
            0b1000_0000, // group widths
            0b0001_1000, // group values: 0, 1, 2
        ];
        let actual = decode(&template, &payload, 5, false).unwrap();
        assert_eq!(actual, vec![3.0, 4.0, 5.0, 7.0, 7.0]);
    }

    #[test]
    fn decode_complex_packing_with_missing_values() {
        let template = template(2, 2, 3, 2, 2);
        let payload = vec![
            0b0011_1111, // group references: 3, 15 (missing)
            0b1000_0000,
            0b1110_0100, // 3 (missing), 2 (secondary missing), 1
        ];
        let actual = decode(&template, &payload, 5, false).unwrap();
        assert_eq!(actual, vec![1000.0, 2000.0, 4.0, 1000.0, 1000.0]);
    }

    #[test]
    fn decode_complex_packing_with_spatial_differencing() {
        let template = template(2, 2, 3, 2, 0);
        let payload = vec![
            0x0a,        // first value: 10
            0x81,        // minimum of differences: -1
            0b0000_0010, // group references: 0, 2
            0b1000_0000,
            0b0001_1000, // 0, 1, 2 then two constant 2s
        ];
        let actual = decode(&template, &payload, 5, true).unwrap();
        // differences after adding the minimum: _, 0, 1, 1, 1
        assert_eq!(actual, vec![10.0, 10.0, 11.0, 12.0, 13.0]);
    }

    #[test]
    fn decode_complex_packing_with_no_group() {
        let mut template = template(0, 0, 0, 0, 0);
        template[0] = 0x4120_0000;
        let actual = decode(&template, &[], 3, false).unwrap();
        assert_eq!(actual, vec![10.0; 3]);
    }

    #[test]
    fn decode_complex_packing_with_inconsistent_lengths() {
        let template = template(2, 2, 3, 2, 0);
        let payload = vec![0b0011_0111, 0b1000_0000, 0b0001_1000];
        assert_eq!(
            decode(&template, &payload, 6, false),
            Err(DecodeError::LengthMismatch)
        );
    }

    #[test]
    fn decode_complex_packing_with_huge_group_lengths() {
        let template = template(2, 2, 0xffff_ffff, 0xffff_ffff, 0);
        let payload = vec![0b0011_0111, 0b1111_1111, 0b1111_1111, 0];
        assert_eq!(
            decode(&template, &payload, 5, false),
            Err(DecodeError::LengthMismatch)
        );
    }

    #[test]
    fn decode_complex_packing_with_unsupported_splitting() {
        let mut template = template(2, 2, 3, 2, 0);
        template[5] = 0;
        assert!(matches!(
            decode(&template, &[0; 3], 5, false),
            Err(DecodeError::NotSupported(_, 0))
        ));
    }
}
