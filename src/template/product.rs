use super::{TemplateDescriptor, count_at, repeat_within};

// Entries 0-14 of templates 4.0 to 4.15: parameter, generating process,
// forecast time and the two fixed surfaces.
const ANALYSIS: [i8; 15] = [1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4];
const ENSEMBLE: [i8; 18] = [1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1, 1, 1];
const DERIVED: [i8; 17] = [1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1, 1];
const CLUSTER_RECTANGLE: [i8; 31] = [
    1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1, 1, 1, 1, 1, 1, 1, -4, -4, 4, 4, 1, -1, 4,
    -1, 4,
];
const CLUSTER_CIRCLE: [i8; 30] = [
    1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1, 1, 1, 1, 1, 1, 1, -4, 4, 4, 1, -1, 4, -1,
    4,
];
const PROBABILITY: [i8; 22] = [
    1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1, 1, 1, -1, -4, -1, -4,
];
const PERCENTILE: [i8; 16] = [1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1];
const INTERVAL: [i8; 29] = [
    1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 2, 1, 1, 1, 1, 1, 1, 4, 1, 1, 1, 4, 1, 4,
];
const PROBABILITY_INTERVAL: [i8; 36] = [
    1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1, 1, 1, -1, -4, -1, -4, 2, 1, 1, 1, 1, 1, 1,
    4, 1, 1, 1, 4, 1, 4,
];
const PERCENTILE_INTERVAL: [i8; 30] = [
    1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1, 2, 1, 1, 1, 1, 1, 1, 4, 1, 1, 1, 4, 1, 4,
];
const ENSEMBLE_INTERVAL: [i8; 32] = [
    1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 4, 1, 1, 1, 4,
    1, 4,
];
const DERIVED_INTERVAL: [i8; 31] = [
    1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1, 1, 2, 1, 1, 1, 1, 1, 1, 4, 1, 1, 1, 4, 1,
    4,
];
const SPATIAL_PROCESSING: [i8; 18] = [1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1, 1, 1];
const RADAR: [i8; 19] = [1, 1, 1, 1, 1, -4, 4, 2, 4, 2, 1, 1, 1, 1, 1, 2, 1, 3, 2];
const SATELLITE: [i8; 5] = [1, 1, 1, 1, 1];
const CHEMICAL: [i8; 16] = [1, 1, 2, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4];
const CHEMICAL_ENSEMBLE: [i8; 19] = [1, 1, 2, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1, 1, 1];
const CHEMICAL_INTERVAL: [i8; 30] = [
    1, 1, 2, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 2, 1, 1, 1, 1, 1, 1, 4, 1, 1, 1, 4, 1, 4,
];
const CHEMICAL_ENSEMBLE_INTERVAL: [i8; 33] = [
    1, 1, 2, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 4, 1, 1, 1,
    4, 1, 4,
];
const AEROSOL: [i8; 26] = [
    1, 1, 2, 1, -1, -4, -1, -4, 1, -1, -4, -1, -4, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4,
];
const CCITT_TEXT: [i8; 3] = [1, 1, 4];
const CROSS_SECTION: [i8; 9] = [1, 1, 1, 1, 1, 2, 1, 1, 4];
const CROSS_SECTION_INTERVAL: [i8; 16] = [1, 1, 1, 1, 1, 2, 1, 1, 4, 4, 1, 1, 1, 4, 1, 1];
const HOVMOLLER_INTERVAL: [i8; 22] = [
    1, 1, 1, 1, 1, 2, 1, 1, 4, 1, -1, -4, 1, -1, -4, 4, 1, 1, 1, 4, 1, 1,
];

// Statistical process, time increment type, time range unit and length,
// increment unit and increment.
const TIME_RANGE: [i8; 6] = [1, 1, 1, 4, 1, 4];

pub(super) static PRODUCT_TEMPLATES: &[TemplateDescriptor] = &[
    TemplateDescriptor::fixed(4, 0, &ANALYSIS),
    TemplateDescriptor::fixed(4, 1, &ENSEMBLE),
    TemplateDescriptor::fixed(4, 2, &DERIVED),
    TemplateDescriptor::extensible(4, 3, &CLUSTER_RECTANGLE, cluster_members_rectangle),
    TemplateDescriptor::extensible(4, 4, &CLUSTER_CIRCLE, cluster_members_circle),
    TemplateDescriptor::fixed(4, 5, &PROBABILITY),
    TemplateDescriptor::fixed(4, 6, &PERCENTILE),
    TemplateDescriptor::fixed(4, 7, &ANALYSIS),
    TemplateDescriptor::extensible(4, 8, &INTERVAL, time_ranges_4_8),
    TemplateDescriptor::extensible(4, 9, &PROBABILITY_INTERVAL, time_ranges_4_9),
    TemplateDescriptor::extensible(4, 10, &PERCENTILE_INTERVAL, time_ranges_4_10),
    TemplateDescriptor::extensible(4, 11, &ENSEMBLE_INTERVAL, time_ranges_4_11),
    TemplateDescriptor::extensible(4, 12, &DERIVED_INTERVAL, time_ranges_4_12),
    TemplateDescriptor::fixed(4, 15, &SPATIAL_PROCESSING),
    TemplateDescriptor::fixed(4, 20, &RADAR),
    TemplateDescriptor::extensible(4, 30, &SATELLITE, satellite_bands),
    TemplateDescriptor::extensible(4, 31, &SATELLITE, satellite_bands_with_wide_instrument),
    TemplateDescriptor::fixed(4, 40, &CHEMICAL),
    TemplateDescriptor::fixed(4, 41, &CHEMICAL_ENSEMBLE),
    TemplateDescriptor::extensible(4, 42, &CHEMICAL_INTERVAL, time_ranges_4_42),
    TemplateDescriptor::extensible(4, 43, &CHEMICAL_ENSEMBLE_INTERVAL, time_ranges_4_43),
    TemplateDescriptor::fixed(4, 48, &AEROSOL),
    TemplateDescriptor::fixed(4, 254, &CCITT_TEXT),
    TemplateDescriptor::fixed(4, 1000, &CROSS_SECTION),
    TemplateDescriptor::fixed(4, 1001, &CROSS_SECTION_INTERVAL),
    TemplateDescriptor::fixed(4, 1100, &ANALYSIS),
    TemplateDescriptor::fixed(4, 1101, &HOVMOLLER_INTERVAL),
];

/// The fixed part already holds one time range specification; every further
/// one announced by the count entry is appended.
fn repeat_time_range(values: &[i64], count_index: usize, max_octets: usize) -> Option<Vec<i8>> {
    let count = count_at(values, count_index);
    repeat_within(&TIME_RANGE, count.saturating_sub(1), max_octets)
}

fn time_ranges_4_8(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_time_range(values, 21, max_octets)
}

fn time_ranges_4_9(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_time_range(values, 28, max_octets)
}

fn time_ranges_4_10(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_time_range(values, 22, max_octets)
}

fn time_ranges_4_11(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_time_range(values, 24, max_octets)
}

fn time_ranges_4_12(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_time_range(values, 23, max_octets)
}

fn time_ranges_4_42(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_time_range(values, 22, max_octets)
}

fn time_ranges_4_43(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_time_range(values, 25, max_octets)
}

// One ensemble member number per forecast in the cluster.
fn cluster_members_rectangle(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_within(&[1], count_at(values, 26), max_octets)
}

fn cluster_members_circle(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_within(&[1], count_at(values, 25), max_octets)
}

fn satellite_bands(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_within(&[2, 2, 1, 1, 4], count_at(values, 4), max_octets)
}

fn satellite_bands_with_wide_instrument(values: &[i64], max_octets: usize) -> Option<Vec<i8>> {
    repeat_within(&[2, 2, 2, 1, 4], count_at(values, 4), max_octets)
}
