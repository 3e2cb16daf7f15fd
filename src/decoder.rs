//! Decoding of the Section 7 payload into grid point values.

pub use self::bitmap::expand_with_bitmap;
use crate::{
    config::CodecConfig,
    datatypes::{GridDefinition, ReprDefinition},
    error::DecodeError,
};

mod bitmap;
#[cfg(feature = "ccsds-unpack-with-libaec")]
pub(crate) mod ccsds;
mod complex;
mod ieee;
#[cfg(feature = "jpeg2000-unpack-with-openjpeg")]
pub(crate) mod jpeg2000;
mod param;
#[cfg(feature = "png-unpack-with-png-crate")]
mod png;
mod run_length;
pub(crate) mod simple;
mod spectral;
mod stream;

/// Decodes the values of the points encoded in a Data Section payload.
///
/// The result holds [`ReprDefinition::num_encoded_points`] values; points
/// masked out by a bit-map are not included (see [`expand_with_bitmap`]).
/// `grid` is consulted only by the codecs that need the grid geometry, such
/// as spectral complex packing.
///
/// # Examples
///
/// ```
/// use grib_codec::{CodecConfig, GridDefinition, ReprDefinition, decoder};
///
/// // simple packing: reference 1.0, E = 0, D = 0, 8 bits
/// let repr = ReprDefinition::new(3, 0, vec![0x3f80_0000, 0, 0, 8, 0]);
/// let grid = GridDefinition::new(3, 65535, Vec::new());
/// let values = decoder::decode(&repr, &[0, 1, 2], &grid, &CodecConfig::default()).unwrap();
/// assert_eq!(values, vec![1.0, 2.0, 3.0]);
/// ```
pub fn decode(
    repr: &ReprDefinition,
    payload: &[u8],
    grid: &GridDefinition,
    config: &CodecConfig,
) -> Result<Vec<f32>, DecodeError> {
    let info = repr.template_info();
    let template = repr.template.values(info)?;
    let num_points = repr.num_encoded_points as usize;

    log::debug!("decoding {num_points} points with template {info}");
    match repr.template_num {
        0 => simple::decode(template, payload, num_points),
        2 => complex::decode(template, payload, num_points, false),
        3 => complex::decode(template, payload, num_points, true),
        4 => ieee::decode(template, payload, num_points),
        40 | 40000 => decode_jpeg2000(template, payload, num_points, config),
        41 | 40010 => decode_png(template, payload, num_points),
        42 => decode_ccsds(template, payload, num_points),
        50 => spectral::decode_simple(template, payload, num_points),
        51 => {
            let truncation = grid.spectral_truncation()?;
            spectral::decode_complex(template, payload, num_points, truncation)
        }
        200 => run_length::decode(template, payload, num_points),
        n => Err(DecodeError::NotSupported(
            "GRIB2 code table 5.0 (data representation template number)",
            n,
        )),
    }
}

#[cfg(feature = "jpeg2000-unpack-with-openjpeg")]
fn decode_jpeg2000(
    template: &[i64],
    payload: &[u8],
    num_points: usize,
    config: &CodecConfig,
) -> Result<Vec<f32>, DecodeError> {
    jpeg2000::decode(template, payload, num_points, config)
}

#[cfg(not(feature = "jpeg2000-unpack-with-openjpeg"))]
fn decode_jpeg2000(
    _template: &[i64],
    _payload: &[u8],
    _num_points: usize,
    _config: &CodecConfig,
) -> Result<Vec<f32>, DecodeError> {
    Err(DecodeError::CodecDisabled("JPEG 2000"))
}

#[cfg(feature = "png-unpack-with-png-crate")]
fn decode_png(template: &[i64], payload: &[u8], num_points: usize) -> Result<Vec<f32>, DecodeError> {
    png::decode(template, payload, num_points)
}

#[cfg(not(feature = "png-unpack-with-png-crate"))]
fn decode_png(_template: &[i64], _payload: &[u8], _num_points: usize) -> Result<Vec<f32>, DecodeError> {
    Err(DecodeError::CodecDisabled("PNG"))
}

#[cfg(feature = "ccsds-unpack-with-libaec")]
fn decode_ccsds(template: &[i64], payload: &[u8], num_points: usize) -> Result<Vec<f32>, DecodeError> {
    ccsds::decode(template, payload, num_points)
}

#[cfg(not(feature = "ccsds-unpack-with-libaec"))]
fn decode_ccsds(
    _template: &[i64],
    _payload: &[u8],
    _num_points: usize,
) -> Result<Vec<f32>, DecodeError> {
    Err(DecodeError::CodecDisabled("CCSDS"))
}

/// Collects exactly `num_points` values, failing if `iter` runs short.
pub(crate) fn collect_points<I>(iter: I, num_points: usize) -> Result<Vec<f32>, DecodeError>
where
    I: Iterator<Item = f32>,
{
    let mut out = Vec::new();
    out.try_reserve_exact(num_points)
        .map_err(|_| DecodeError::AllocationFailed(num_points))?;
    out.extend(iter.take(num_points));
    if out.len() != num_points {
        return Err(DecodeError::LengthMismatch);
    }
    Ok(out)
}
