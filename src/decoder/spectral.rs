//! Decoders for spherical harmonic coefficients.
//!
//! Coefficients are stored as pairs of real and imaginary parts, ordered by
//! zonal wave number `m` and then total wave number `n`.

use crate::{
    datatypes::SpectralTruncation,
    decoder::{
        collect_points,
        param::{SimplePackingParam, SpectralComplexParam, entry},
        simple,
        stream::BitStream,
    },
    error::DecodeError,
    ieee,
};

/// Decodes spectral data, simple packing (template 5.50). The real part of
/// the (0,0) coefficient is kept unpacked in template entry 4.
pub(crate) fn decode_simple(
    template: &[i64],
    payload: &[u8],
    num_points: usize,
) -> Result<Vec<f32>, DecodeError> {
    if num_points == 0 {
        return Ok(Vec::new());
    }
    let param = SimplePackingParam::from_template(template)?;
    let first = ieee::template_value_to_f32(entry(template, 4)?);
    let rest = simple::unpack(&param, payload, num_points - 1);
    collect_points(std::iter::once(first).chain(rest), num_points)
}

/// Decodes spectral data, complex packing (template 5.51).
///
/// Coefficients within the sub-truncation `(Js, Ks, Ms)` are stored first as
/// IEEE values; the rest are packed and scaled back with the Laplacian
/// operator `(n(n+1))^-P`, `P` being template entry 4 times 1e-6.
pub(crate) fn decode_complex(
    template: &[i64],
    payload: &[u8],
    num_points: usize,
    truncation: SpectralTruncation,
) -> Result<Vec<f32>, DecodeError> {
    let simple_param = SimplePackingParam::from_template(template)?;
    let param = SpectralComplexParam::from_template(template)?;
    if param.precision != 1 {
        return Err(DecodeError::NotSupported(
            "GRIB2 code table 5.7 (precision of the unpacked subset)",
            param.precision.into(),
        ));
    }

    let ts = param.ts as usize;
    let unpacked_len = ts * 4;
    if payload.len() < unpacked_len || ts > num_points {
        return Err(DecodeError::LengthMismatch);
    }
    let mut unpacked = ieee::read_f32s(&payload[..unpacked_len]).into_iter();
    let num_packed = num_points - ts;
    let mut packed = BitStream::new(
        &payload[unpacked_len..],
        usize::from(simple_param.nbit),
        num_packed,
    )
    .take(num_packed);

    let bscale = 2_f32.powi(simple_param.exp.into());
    let dscale = 10_f32.powi(-i32::from(simple_param.dig));
    let tscale = param.laplacian_scaling as f32 * 1e-6;
    let SpectralTruncation { j, k, m } = truncation;
    let (js, ks, ms) = (
        u32::from(param.js),
        u32::from(param.ks),
        u32::from(param.ms),
    );

    let mut out = Vec::new();
    out.try_reserve_exact(num_points)
        .map_err(|_| DecodeError::AllocationFailed(num_points))?;

    for wm in 0..=m {
        let nm = if k == j + m { j + wm } else { j };
        let ns = if ks == js + ms { js + wm } else { js };
        for n in wm..=nm {
            if n <= ns && wm <= ms {
                for _ in 0..2 {
                    out.push(unpacked.next().ok_or(DecodeError::LengthMismatch)?);
                }
            } else {
                let pscale = ((n * (n + 1)) as f32).powf(-tscale);
                for _ in 0..2 {
                    let raw = packed.next().ok_or(DecodeError::LengthMismatch)?;
                    out.push((raw as f32 * bscale + simple_param.ref_val) * dscale * pscale);
                }
            }
        }
    }

    if out.len() != num_points {
        return Err(DecodeError::LengthMismatch);
    }
    Ok(out)
}
