use super::{TemplateDescriptor, count_at, repeat_within};

const SIMPLE: [i8; 5] = [4, -2, -2, 1, 1];
const MATRIX: [i8; 15] = [4, -2, -2, 1, 1, 1, 4, 2, 2, 1, 1, 1, 1, 1, 1];
const COMPLEX: [i8; 16] = [4, -2, -2, 1, 1, 1, 1, 4, 4, 4, 1, 1, 4, 1, 4, 1];
const COMPLEX_SPATIAL_DIFF: [i8; 18] = [4, -2, -2, 1, 1, 1, 1, 4, 4, 4, 1, 1, 4, 1, 4, 1, 1, 1];
const IEEE: [i8; 1] = [1];
const JPEG2000: [i8; 7] = [4, -2, -2, 1, 1, 1, 1];
const PNG: [i8; 5] = [4, -2, -2, 1, 1];
const CCSDS: [i8; 8] = [4, -2, -2, 1, 1, 1, 1, 2];
const SPECTRAL_SIMPLE: [i8; 5] = [4, -2, -2, 1, 4];
const SPECTRAL_COMPLEX: [i8; 10] = [4, -2, -2, 1, -4, 2, 2, 2, 4, 1];
const RUN_LENGTH: [i8; 4] = [1, 2, 2, 1];

pub(super) static REPR_TEMPLATES: &[TemplateDescriptor] = &[
    TemplateDescriptor::fixed(5, 0, &SIMPLE),
    TemplateDescriptor::extensible(5, 1, &MATRIX, matrix_coefficients),
    TemplateDescriptor::fixed(5, 2, &COMPLEX),
    TemplateDescriptor::fixed(5, 3, &COMPLEX_SPATIAL_DIFF),
    TemplateDescriptor::fixed(5, 4, &IEEE),
    TemplateDescriptor::fixed(5, 40, &JPEG2000),
    TemplateDescriptor::fixed(5, 41, &PNG),
    TemplateDescriptor::fixed(5, 42, &CCSDS),
    TemplateDescriptor::fixed(5, 50, &SPECTRAL_SIMPLE),
    TemplateDescriptor::fixed(5, 51, &SPECTRAL_COMPLEX),
    TemplateDescriptor::extensible(5, 200, &RUN_LENGTH, level_values),
    // pre-standard numbers of JPEG 2000 and PNG still found in old files
    TemplateDescriptor::fixed(5, 40000, &JPEG2000),
    TemplateDescriptor::fixed(5, 40010, &PNG),
];

// Coefficient values of the first and second dimensions.
fn matrix_coefficients(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    let count = count_at(values, 10).checked_add(count_at(values, 12))?;
    repeat_within(&[4], count, max_octets)
}

// Scaled representative value of each level.
fn level_values(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_within(&[2], count_at(values, 2), max_octets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_numbers_are_unique() {
        let mut nums = REPR_TEMPLATES.iter().map(|t| t.num).collect::<Vec<_>>();
        nums.sort_unstable();
        nums.dedup();
        assert_eq!(nums.len(), REPR_TEMPLATES.len());
    }

    #[test]
    fn every_packing_template_starts_with_reference_value() {
        for t in REPR_TEMPLATES.iter().filter(|t| ![4, 200].contains(&t.num)) {
            assert_eq!(&t.map[..3], &[4, -2, -2], "template 5.{}", t.num);
        }
    }
}
