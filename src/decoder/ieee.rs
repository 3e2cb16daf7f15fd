use crate::{
    codetables::Table5_7,
    decoder::{collect_points, param::entry},
    error::DecodeError,
    ieee,
};

/// Decodes IEEE floating-point data (template 5.4). Precision 1 is single
/// precision and 2 is double precision, narrowed to `f32`.
pub(crate) fn decode(
    template: &[i64],
    payload: &[u8],
    num_points: usize,
) -> Result<Vec<f32>, DecodeError> {
    let precision = entry(template, 0)?;
    match u8::try_from(precision).map(Table5_7::try_from) {
        Ok(Ok(Table5_7::Single)) => {
            collect_points(ieee::read_f32s(payload).into_iter(), num_points)
        }
        Ok(Ok(Table5_7::Double)) => {
            let values = ieee::read_f64s(payload).into_iter().map(|v| v as f32);
            collect_points(values, num_points)
        }
        _ => Err(DecodeError::NotSupported(
            "GRIB2 code table 5.7 (precision of floating-point numbers)",
            precision as u16,
        )),
    }
}
