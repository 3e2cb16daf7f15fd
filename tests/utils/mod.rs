use std::io::{self, Write};

use grib_codec::{
    BitmapSpec, CodecConfig, EncodeError, GridDefinition, Identification, Indicator,
    MessageBuilder, ProdDefinition,
};
use tempfile::NamedTempFile;

pub(crate) const NI: u32 = 5;
pub(crate) const NJ: u32 = 4;

/// Routes the crate's `log` output to the test harness.
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn identification() -> Identification {
    Identification::from_list(&[34, 0, 5, 1, 0, 2016, 8, 22, 2, 0, 0, 0, 2])
        .expect("identification list is valid")
}

/// A 0.5-degree latitude/longitude grid of `NI` x `NJ` points.
pub(crate) fn latlon_grid() -> GridDefinition {
    GridDefinition::new(
        NI * NJ,
        0,
        vec![
            6,
            0,
            0,
            0,
            0,
            0,
            0,
            NI.into(),
            NJ.into(),
            0,
            0xffff_ffff,
            36_000_000,
            135_000_000,
            48,
            34_500_000,
            137_000_000,
            500_000,
            500_000,
            0,
        ],
    )
}

/// Temperature at 2 m above ground.
pub(crate) fn temperature() -> ProdDefinition {
    ProdDefinition::new(0, vec![0, 0, 2, 0, 96, 0, 0, 1, 0, 103, 0, 2, 255, 0, 0])
}

/// A smooth field over the grid, in kelvin with one decimal place.
pub(crate) fn sample_values() -> Vec<f32> {
    (0..NI * NJ)
        .map(|i| {
            let (x, y) = ((i % NI) as f32, (i / NI) as f32);
            (2731.0 + 12.0 * x - 7.0 * y + (x * y) % 5.0) / 10.0
        })
        .collect()
}

pub(crate) struct Field {
    pub(crate) repr_template_num: u16,
    pub(crate) repr_template: Vec<i64>,
    pub(crate) values: Vec<f32>,
    pub(crate) bitmap: BitmapSpec,
}

impl Field {
    pub(crate) fn new(repr_template_num: u16, repr_template: Vec<i64>, values: Vec<f32>) -> Self {
        Self {
            repr_template_num,
            repr_template,
            values,
            bitmap: BitmapSpec::None,
        }
    }

    pub(crate) fn with_bitmap(self, bitmap: BitmapSpec) -> Self {
        Self { bitmap, ..self }
    }
}

/// Builds a message on the lat/lon grid with one submessage per field.
pub(crate) fn build_message(fields: &[Field]) -> Result<Vec<u8>, EncodeError> {
    let config = CodecConfig::default();
    let mut builder = MessageBuilder::new();
    builder.create(&Indicator::new(0), &identification())?;
    builder.add_grid(&latlon_grid())?;
    for field in fields {
        builder.add_field(
            &temperature(),
            field.repr_template_num,
            &field.repr_template,
            &field.values,
            &field.bitmap,
            &config,
        )?;
    }
    builder.end()
}

pub(crate) fn write_to_tempfile(bytes: &[u8]) -> Result<NamedTempFile, io::Error> {
    let mut out = NamedTempFile::new()?;
    out.write_all(bytes)?;
    out.flush()?;
    Ok(out)
}

pub(crate) fn assert_close(actual: &[f32], expected: &[f32], tolerance: f32) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= tolerance,
            "value {i} differs: {a} vs {e}"
        );
    }
}
