use super::{TemplateDescriptor, count_at, num_octets, repeat_within};

const LATLON: [i8; 19] = [1, 1, 4, 1, 4, 1, 4, 4, 4, 4, 4, -4, 4, 1, -4, 4, 4, 4, 1];
const ROTATED_LATLON: [i8; 22] = [
    1, 1, 4, 1, 4, 1, 4, 4, 4, 4, 4, -4, 4, 1, -4, 4, 4, 4, 1, -4, 4, 4,
];
const STRETCHED_LATLON: [i8; 22] = [
    1, 1, 4, 1, 4, 1, 4, 4, 4, 4, 4, -4, 4, 1, -4, 4, 4, 4, 1, -4, 4, -4,
];
const STRETCHED_ROTATED_LATLON: [i8; 25] = [
    1, 1, 4, 1, 4, 1, 4, 4, 4, 4, 4, -4, 4, 1, -4, 4, 4, 4, 1, -4, 4, 4, -4, 4, -4,
];
const VARIABLE_LATLON: [i8; 13] = [1, 1, 4, 1, 4, 1, 4, 4, 4, 4, 4, 1, 1];
const VARIABLE_ROTATED_LATLON: [i8; 16] = [1, 1, 4, 1, 4, 1, 4, 4, 4, 4, 4, 1, 1, -4, 4, 4];
const MERCATOR: [i8; 19] = [1, 1, 4, 1, 4, 1, 4, 4, 4, -4, 4, 1, -4, -4, 4, 1, 4, 4, 4];
const TRANSVERSE_MERCATOR: [i8; 22] = [
    1, 1, 4, 1, 4, 1, 4, 4, 4, -4, 4, 1, -4, 4, 4, 1, 4, 4, -4, -4, -4, -4,
];
const POLAR_STEREOGRAPHIC: [i8; 18] = [1, 1, 4, 1, 4, 1, 4, 4, 4, -4, 4, 1, -4, 4, 4, 4, 1, 1];
const LAMBERT: [i8; 22] = [
    1, 1, 4, 1, 4, 1, 4, 4, 4, -4, 4, 1, -4, 4, 4, 4, 1, 1, -4, -4, -4, 4,
];
const SPHERICAL_HARMONICS: [i8; 5] = [4, 4, 4, 1, 1];
const ROTATED_SPHERICAL_HARMONICS: [i8; 8] = [4, 4, 4, 1, 1, -4, 4, 4];
const STRETCHED_SPHERICAL_HARMONICS: [i8; 8] = [4, 4, 4, 1, 1, -4, 4, -4];
const STRETCHED_ROTATED_SPHERICAL_HARMONICS: [i8; 11] = [4, 4, 4, 1, 1, -4, 4, 4, -4, 4, -4];
const SPACE_VIEW: [i8; 21] = [
    1, 1, 4, 1, 4, 1, 4, 4, 4, -4, 4, 1, 4, 4, 4, 4, 1, 4, 4, 4, 4,
];
const TRIANGULAR: [i8; 11] = [1, 1, 2, 1, -4, 4, 4, 1, 1, 1, 4];
const EQUATORIAL_AZIMUTHAL: [i8; 16] = [1, 1, 4, 1, 4, 1, 4, 4, 4, -4, 4, 1, 4, 4, 1, 1];
const AZIMUTH_RANGE: [i8; 7] = [4, 4, -4, 4, 4, 4, 1];
const LAMBERT_AZIMUTHAL: [i8; 17] = [1, 1, 4, 1, 4, 1, 4, 4, 4, -4, 4, 4, 4, 1, 4, 4, 1];
const CROSS_SECTION: [i8; 20] = [
    1, 1, 4, 1, 4, 1, 4, 4, 4, 4, -4, 4, 1, 4, 4, 1, 2, 1, 1, 2,
];
const TIME_SECTION: [i8; 16] = [4, 1, -4, 1, 1, -4, 2, 1, 1, 1, 1, 1, 2, 1, 1, 2];

pub(super) static GRID_TEMPLATES: &[TemplateDescriptor] = &[
    TemplateDescriptor::fixed(3, 0, &LATLON),
    TemplateDescriptor::fixed(3, 1, &ROTATED_LATLON),
    TemplateDescriptor::fixed(3, 2, &STRETCHED_LATLON),
    TemplateDescriptor::fixed(3, 3, &STRETCHED_ROTATED_LATLON),
    TemplateDescriptor::extensible(3, 4, &VARIABLE_LATLON, variable_resolution_axes),
    TemplateDescriptor::extensible(3, 5, &VARIABLE_ROTATED_LATLON, variable_resolution_axes),
    TemplateDescriptor::fixed(3, 10, &MERCATOR),
    TemplateDescriptor::fixed(3, 12, &TRANSVERSE_MERCATOR),
    TemplateDescriptor::fixed(3, 20, &POLAR_STEREOGRAPHIC),
    TemplateDescriptor::fixed(3, 30, &LAMBERT),
    TemplateDescriptor::fixed(3, 31, &LAMBERT),
    TemplateDescriptor::fixed(3, 40, &LATLON),
    TemplateDescriptor::fixed(3, 41, &ROTATED_LATLON),
    TemplateDescriptor::fixed(3, 42, &STRETCHED_LATLON),
    TemplateDescriptor::fixed(3, 43, &STRETCHED_ROTATED_LATLON),
    TemplateDescriptor::fixed(3, 50, &SPHERICAL_HARMONICS),
    TemplateDescriptor::fixed(3, 51, &ROTATED_SPHERICAL_HARMONICS),
    TemplateDescriptor::fixed(3, 52, &STRETCHED_SPHERICAL_HARMONICS),
    TemplateDescriptor::fixed(3, 53, &STRETCHED_ROTATED_SPHERICAL_HARMONICS),
    TemplateDescriptor::fixed(3, 90, &SPACE_VIEW),
    TemplateDescriptor::fixed(3, 100, &TRIANGULAR),
    TemplateDescriptor::fixed(3, 110, &EQUATORIAL_AZIMUTHAL),
    TemplateDescriptor::extensible(3, 120, &AZIMUTH_RANGE, radials),
    TemplateDescriptor::fixed(3, 140, &LAMBERT_AZIMUTHAL),
    TemplateDescriptor::extensible(3, 1000, &CROSS_SECTION, cross_section_levels),
    TemplateDescriptor::extensible(3, 1200, &TIME_SECTION, time_section_levels),
    // NCEP rotated latitude/longitude Arakawa staggered E- and non-E-grids
    TemplateDescriptor::fixed(3, 32768, &LATLON),
    TemplateDescriptor::fixed(3, 32769, &LATLON),
];

// Ni longitudes followed by Nj signed latitudes.
fn variable_resolution_axes(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    let mut ext = repeat_within(&[4], count_at(values, 7), max_octets)?;
    let lats = repeat_within(&[-4], count_at(values, 8), max_octets - num_octets(&ext))?;
    ext.extend(lats);
    Some(ext)
}

// Azimuth and signed azimuthal width per radial.
fn radials(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_within(&[2, -2], count_at(values, 1), max_octets)
}

fn cross_section_levels(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_within(&[4], count_at(values, 19), max_octets)
}

fn time_section_levels(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_within(&[4], count_at(values, 15), max_octets)
}
