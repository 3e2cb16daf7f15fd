//! Static registry of Grid Definition (3.x), Product Definition (4.x) and
//! Data Representation (5.x) template layouts.
//!
//! A layout is a list of octet widths, one per template entry. A negative
//! width marks a signed (sign-magnitude) entry. Some templates end with a
//! variable-length tail whose size is derived from entries read before it;
//! those carry an [`ExtensionRule`].

use std::fmt::{self, Debug, Display, Formatter};

use crate::{
    error::{DecodeError, EncodeError, ParseError},
    helpers::{grib_int_from_bytes, push_grib_int, push_uint, uint_from_bytes},
};

mod grid;
mod product;
mod repr;

/// Section number and template number, displayed as `"3.0"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateInfo(pub u8, pub u16);

impl TemplateInfo {
    pub fn section(&self) -> u8 {
        self.0
    }

    pub fn number(&self) -> u16 {
        self.1
    }

    /// Returns the registered layout, if any.
    pub fn descriptor(&self) -> Option<&'static TemplateDescriptor> {
        lookup(self.0, self.1)
    }
}

impl Display for TemplateInfo {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

/// Computes the widths of the entries appended after the fixed part of a
/// template from the values of the fixed part. Returns `None` when those
/// entries would take more than the given number of octets.
pub type ExtensionRule = fn(&[i64], usize) -> Option<Vec<i8>>;

/// Widest template entry.
const MAX_ENTRY_OCTETS: usize = 4;

pub struct TemplateDescriptor {
    section: u8,
    num: u16,
    map: &'static [i8],
    extension: Option<ExtensionRule>,
}

impl TemplateDescriptor {
    pub(crate) const fn fixed(section: u8, num: u16, map: &'static [i8]) -> Self {
        Self {
            section,
            num,
            map,
            extension: None,
        }
    }

    pub(crate) const fn extensible(
        section: u8,
        num: u16,
        map: &'static [i8],
        rule: ExtensionRule,
    ) -> Self {
        Self {
            section,
            num,
            map,
            extension: Some(rule),
        }
    }

    pub fn info(&self) -> TemplateInfo {
        TemplateInfo(self.section, self.num)
    }

    /// Widths of the fixed entries.
    pub fn entries(&self) -> &'static [i8] {
        self.map
    }

    pub fn needs_extension(&self) -> bool {
        self.extension.is_some()
    }

    /// Widths of the entries following the fixed part, given at least the
    /// fixed values. `None` if they would not fit in `max_octets` octets.
    pub fn extend(&self, values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
        match self.extension {
            Some(rule) => rule(values, max_octets),
            None => Some(Vec::new()),
        }
    }

    /// Widths of all entries for a template holding `values`.
    pub fn layout(&self, values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
        let mut layout = self.map.to_vec();
        layout.extend(self.extend(values, max_octets)?);
        Some(layout)
    }

    /// Reads the template entries from `buf[*pos..end]`, advancing `pos`.
    pub(crate) fn unpack(
        &self,
        buf: &[u8],
        pos: &mut usize,
        end: usize,
    ) -> Result<Vec<i64>, ParseError> {
        let mut values = Vec::with_capacity(self.map.len());
        read_entries(buf, pos, end, self.map, &mut values)?;
        let remaining = end.min(buf.len()).saturating_sub(*pos);
        let ext = self
            .extend(&values, remaining)
            .ok_or(ParseError::UnexpectedEndOfData(*pos))?;
        read_entries(buf, pos, end, &ext, &mut values)?;
        Ok(values)
    }

    pub(crate) fn pack(&self, values: &[i64], out: &mut Vec<u8>) -> Result<(), EncodeError> {
        if values.len() < self.map.len() {
            return Err(EncodeError::TemplateLengthMismatch {
                expected: self.map.len(),
                actual: values.len(),
            });
        }
        let max_octets = values.len().saturating_mul(MAX_ENTRY_OCTETS);
        let layout = self.layout(values, max_octets).ok_or_else(|| {
            EncodeError::ValueOutOfRange(format!(
                "template {} announces more entries than the {} given",
                self.info(),
                values.len()
            ))
        })?;
        if layout.len() != values.len() {
            return Err(EncodeError::TemplateLengthMismatch {
                expected: layout.len(),
                actual: values.len(),
            });
        }

        for (index, (width, value)) in layout.iter().zip(values).enumerate() {
            let num_octets = usize::from(width.unsigned_abs());
            let result = if *width < 0 {
                push_grib_int(out, *value, num_octets)
            } else {
                u64::try_from(*value)
                    .map_err(|_| {
                        EncodeError::ValueOutOfRange(format!(
                            "entry {index} of template {} is negative: {value}",
                            self.info()
                        ))
                    })
                    .and_then(|v| push_uint(out, v, num_octets))
            };
            result?;
        }
        Ok(())
    }
}

impl Debug for TemplateDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateDescriptor")
            .field("template", &self.info().to_string())
            .field("map", &self.map)
            .field("extensible", &self.needs_extension())
            .finish()
    }
}

fn read_entries(
    buf: &[u8],
    pos: &mut usize,
    end: usize,
    widths: &[i8],
    values: &mut Vec<i64>,
) -> Result<(), ParseError> {
    for width in widths {
        let num_octets = usize::from(width.unsigned_abs());
        let next = *pos + num_octets;
        if next > end || next > buf.len() {
            return Err(ParseError::UnexpectedEndOfData(*pos));
        }
        let bytes = &buf[*pos..next];
        let value = if *width < 0 {
            grib_int_from_bytes(bytes)
        } else {
            uint_from_bytes(bytes) as i64
        };
        values.push(value);
        *pos = next;
    }
    Ok(())
}

/// Looks up the layout of template `section.num`. `None` means the template is
/// unrecognized, which is normal for centre-local templates.
pub fn lookup(section: u8, num: u16) -> Option<&'static TemplateDescriptor> {
    let table = match section {
        3 => grid::GRID_TEMPLATES,
        4 => product::PRODUCT_TEMPLATES,
        5 => repr::REPR_TEMPLATES,
        _ => return None,
    };
    table.iter().find(|t| t.num == num)
}

/// Template entries of a section, either decoded through a registered
/// layout or kept as raw octets when the template is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateValues {
    Decoded(Vec<i64>),
    Opaque(Box<[u8]>),
}

impl TemplateValues {
    pub(crate) fn unpack(
        info: TemplateInfo,
        buf: &[u8],
        pos: &mut usize,
        end: usize,
    ) -> Result<Self, ParseError> {
        match info.descriptor() {
            Some(descriptor) => Ok(Self::Decoded(descriptor.unpack(buf, pos, end)?)),
            None => {
                log::warn!("template {info} is not recognized; keeping its octets as they are");
                let end = end.min(buf.len()).max(*pos);
                let raw = buf[*pos..end].into();
                *pos = end;
                Ok(Self::Opaque(raw))
            }
        }
    }

    pub(crate) fn pack(&self, info: TemplateInfo, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match self {
            Self::Decoded(values) => info
                .descriptor()
                .ok_or(EncodeError::UnrecognizedTemplate(info))?
                .pack(values, out),
            Self::Opaque(raw) => {
                out.extend_from_slice(raw);
                Ok(())
            }
        }
    }

    /// Returns the decoded entries, failing for opaque templates.
    pub fn values(&self, info: TemplateInfo) -> Result<&[i64], DecodeError> {
        match self {
            Self::Decoded(values) => Ok(values),
            Self::Opaque(_) => Err(DecodeError::UnrecognizedTemplate(info)),
        }
    }

    pub fn as_decoded(&self) -> Option<&[i64]> {
        match self {
            Self::Decoded(values) => Some(values),
            Self::Opaque(_) => None,
        }
    }
}

impl Default for TemplateValues {
    fn default() -> Self {
        Self::Decoded(Vec::new())
    }
}

/// Reads `values[index]` as a repeat count, treating anything missing or
/// negative as zero.
fn count_at(values: &[i64], index: usize) -> usize {
    values
        .get(index)
        .copied()
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(0)
}

fn num_octets(widths: &[i8]) -> usize {
    widths.iter().map(|w| usize::from(w.unsigned_abs())).sum()
}

/// Repeats `pattern` `count` times if the result fits in `max_octets` octets.
fn repeat_within(pattern: &[i8], count: usize, max_octets: usize) -> Option<Vec<i8>> {
    let octets = count.checked_mul(num_octets(pattern))?;
    (octets <= max_octets).then(|| pattern.repeat(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_info_display() {
        assert_eq!(TemplateInfo(5, 0).to_string(), "5.0");
        assert_eq!(TemplateInfo(3, 32768).to_string(), "3.32768");
    }

    macro_rules! test_lookup {
        ($(($name:ident, $section:expr, $num:expr, $expected_len:expr, $extensible:expr),)*) => ($(
            #[test]
            fn $name() {
                let descriptor = lookup($section, $num).unwrap();
                assert_eq!(descriptor.info(), TemplateInfo($section, $num));
                assert_eq!(descriptor.entries().len(), $expected_len);
                assert_eq!(descriptor.needs_extension(), $extensible);
            }
        )*);
    }

    test_lookup! {
        (lookup_grid_template_0, 3, 0, 19, false),
        (lookup_grid_template_4, 3, 4, 13, true),
        (lookup_grid_template_30, 3, 30, 22, false),
        (lookup_grid_template_50, 3, 50, 5, false),
        (lookup_grid_template_120, 3, 120, 7, true),
        (lookup_product_template_0, 4, 0, 15, false),
        (lookup_product_template_8, 4, 8, 29, true),
        (lookup_product_template_9, 4, 9, 36, true),
        (lookup_product_template_48, 4, 48, 26, false),
        (lookup_repr_template_0, 5, 0, 5, false),
        (lookup_repr_template_1, 5, 1, 15, true),
        (lookup_repr_template_3, 5, 3, 18, false),
        (lookup_repr_template_200, 5, 200, 4, true),
        (lookup_repr_template_40000, 5, 40000, 7, false),
    }

    #[test]
    fn unknown_templates_are_unrecognized() {
        assert!(lookup(3, 65535).is_none());
        assert!(lookup(4, 50000).is_none());
        assert!(lookup(5, 61).is_none());
        assert!(lookup(6, 0).is_none());
    }

    #[test]
    fn extension_of_repr_template_1() {
        let descriptor = lookup(5, 1).unwrap();
        let mut values = vec![0; 15];
        values[10] = 2;
        values[12] = 3;
        assert_eq!(descriptor.extend(&values, 20), Some(vec![4; 5]));
        assert_eq!(descriptor.layout(&values, 20).map(|l| l.len()), Some(20));
        assert_eq!(descriptor.extend(&values, 19), None);
    }

    #[test]
    fn extension_of_product_template_8_repeats_time_range() {
        let descriptor = lookup(4, 8).unwrap();
        let mut values = vec![0; 29];
        values[21] = 1;
        assert_eq!(descriptor.extend(&values, 0), Some(Vec::new()));
        values[21] = 3;
        assert_eq!(
            descriptor.extend(&values, 24),
            Some(vec![1, 1, 1, 4, 1, 4, 1, 1, 1, 4, 1, 4])
        );
    }

    #[test]
    fn extension_of_grid_template_120() {
        let descriptor = lookup(3, 120).unwrap();
        let values = vec![10, 2, 0, 0, 0, 0, 0];
        assert_eq!(descriptor.extend(&values, 8), Some(vec![2, -2, 2, -2]));
    }

    #[test]
    fn extension_from_short_values_is_empty() {
        let descriptor = lookup(5, 200).unwrap();
        assert_eq!(descriptor.extend(&[], 0), Some(Vec::new()));
    }

    #[test]
    fn pack_and_unpack_run_length_template() {
        let descriptor = lookup(5, 200).unwrap();
        let values = vec![8, 250, 3, 1, 10, 20, 30];
        let mut buf = Vec::new();
        descriptor.pack(&values, &mut buf).unwrap();
        assert_eq!(buf, vec![8, 0, 250, 0, 3, 1, 0, 10, 0, 20, 0, 30]);

        let mut pos = 0;
        let actual = descriptor.unpack(&buf, &mut pos, buf.len()).unwrap();
        assert_eq!(actual, values);
        assert_eq!(pos, buf.len());
    }

    #[test]
    fn signed_entries_use_sign_magnitude() {
        let descriptor = lookup(5, 0).unwrap();
        let values = vec![0x4120_0000, -3, 2, 12, 0];
        let mut buf = Vec::new();
        descriptor.pack(&values, &mut buf).unwrap();
        assert_eq!(buf, vec![0x41, 0x20, 0, 0, 0x80, 3, 0, 2, 12, 0]);
    }

    #[test]
    fn pack_rejects_wrong_value_count() {
        let descriptor = lookup(5, 0).unwrap();
        let mut buf = Vec::new();
        assert_eq!(
            descriptor.pack(&[0, 0, 0], &mut buf),
            Err(EncodeError::TemplateLengthMismatch {
                expected: 5,
                actual: 3
            })
        );
        let descriptor = lookup(5, 200).unwrap();
        assert_eq!(
            descriptor.pack(&[8, 250, 2, 1, 10], &mut buf),
            Err(EncodeError::TemplateLengthMismatch {
                expected: 6,
                actual: 5
            })
        );
    }

    // Fixed entries followed by a few spare octets, with the count entry at
    // `index` set to the largest value its width can hold.
    fn fixed_part_with_huge_count(descriptor: &TemplateDescriptor, index: usize) -> Vec<u8> {
        let mut buf = Vec::new();
        for (i, width) in descriptor.entries().iter().enumerate() {
            let num_octets = usize::from(width.unsigned_abs());
            let value = if i == index {
                (1_u64 << (8 * num_octets)) - 1
            } else {
                0
            };
            push_uint(&mut buf, value, num_octets).unwrap();
        }
        buf
    }

    macro_rules! test_oversized_extension {
        ($(($name:ident, $section:expr, $num:expr, $index:expr),)*) => ($(
            #[test]
            fn $name() {
                let descriptor = lookup($section, $num).unwrap();
                let mut buf = fixed_part_with_huge_count(descriptor, $index);
                let fixed_len = buf.len();
                buf.extend([0; 16]);

                let mut pos = 0;
                assert_eq!(
                    descriptor.unpack(&buf, &mut pos, buf.len()),
                    Err(ParseError::UnexpectedEndOfData(fixed_len))
                );

                let mut values = vec![0; descriptor.entries().len()];
                values[$index] = 0xffff_ffff;
                let result = descriptor.pack(&values, &mut Vec::new());
                assert!(matches!(result, Err(EncodeError::ValueOutOfRange(_))));
            }
        )*);
    }

    test_oversized_extension! {
        (huge_number_of_variable_longitudes, 3, 4, 7),
        (huge_number_of_variable_latitudes, 3, 4, 8),
        (huge_number_of_radials, 3, 120, 1),
        (huge_number_of_matrix_coefficients, 5, 1, 10),
        (huge_number_of_time_ranges, 4, 8, 21),
    }

    #[test]
    fn pack_rejects_negative_unsigned_entry() {
        let descriptor = lookup(5, 0).unwrap();
        let mut buf = Vec::new();
        let result = descriptor.pack(&[-1, 0, 0, 0, 0], &mut buf);
        assert!(matches!(result, Err(EncodeError::ValueOutOfRange(_))));
    }

    #[test]
    fn unpack_stops_at_section_end() {
        let descriptor = lookup(5, 0).unwrap();
        let buf = [0u8; 16];
        let mut pos = 8;
        assert_eq!(
            descriptor.unpack(&buf, &mut pos, 12),
            Err(ParseError::UnexpectedEndOfData(12))
        );
    }

    #[test]
    fn unrecognized_template_is_kept_opaque() {
        let buf = [1u8, 2, 3, 4, 5];
        let mut pos = 1;
        let info = TemplateInfo(3, 60000);
        let values = TemplateValues::unpack(info, &buf, &mut pos, 4).unwrap();
        assert_eq!(values, TemplateValues::Opaque(vec![2, 3, 4].into_boxed_slice()));
        assert_eq!(pos, 4);
        assert_eq!(
            values.values(info),
            Err(DecodeError::UnrecognizedTemplate(info))
        );

        let mut out = Vec::new();
        values.pack(info, &mut out).unwrap();
        assert_eq!(out, vec![2, 3, 4]);
    }
}
