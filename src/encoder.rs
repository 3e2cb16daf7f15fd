//! Packing of grid point values into a Section 7 payload.

use crate::{config::CodecConfig, error::EncodeError, template::TemplateInfo};

#[cfg(feature = "ccsds-unpack-with-libaec")]
mod ccsds;
mod complex;
mod ieee;
#[cfg(feature = "jpeg2000-unpack-with-openjpeg")]
mod jpeg2000;
mod param;
#[cfg(feature = "png-unpack-with-png-crate")]
mod png;
mod simple;
mod spectral;

/// Result of packing a field.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedField {
    /// Completed Data Representation template: reference value, scale
    /// factors, number of bits and codec-specific entries as actually used.
    pub template: Vec<i64>,
    /// Section 7 payload.
    pub payload: Vec<u8>,
}

/// Packs `values` with Data Representation template `template_num`.
///
/// `template` supplies the caller's choices, such as the decimal scale factor
/// (entry 2) and, for simple packing and its derivatives, the binary scale
/// factor (entry 1) and number of bits (entry 3), where zero means "work it
/// out". It must have as many entries as the template defines.
///
/// # Examples
///
/// ```
/// use grib_codec::{CodecConfig, encoder};
///
/// let field = encoder::encode(0, &[0, 0, 1, 0, 0], &[1.0, 1.5, 2.0], &CodecConfig::default())
///     .unwrap();
/// // values scaled by 10 range from 10 to 20, which takes 4 bits
/// assert_eq!(field.template[3], 4);
/// assert_eq!(field.payload, vec![0x05, 0xa0]);
/// ```
pub fn encode(
    template_num: u16,
    template: &[i64],
    values: &[f32],
    config: &CodecConfig,
) -> Result<EncodedField, EncodeError> {
    let info = TemplateInfo(5, template_num);
    let descriptor = info
        .descriptor()
        .ok_or(EncodeError::UnrecognizedTemplate(info))?;
    let expected = descriptor.entries().len();
    if !descriptor.needs_extension() && template.len() != expected {
        return Err(EncodeError::TemplateLengthMismatch {
            expected,
            actual: template.len(),
        });
    }

    log::debug!("encoding {} values with template {info}", values.len());
    let (template, payload) = match template_num {
        0 => simple::encode(template, values)?,
        2 => complex::encode(template, values, false)?,
        3 => complex::encode(template, values, true)?,
        4 => ieee::encode(template, values)?,
        40 | 40000 => encode_jpeg2000(template, values, config)?,
        41 | 40010 => encode_png(template, values)?,
        42 => encode_ccsds(template, values, config)?,
        50 => spectral::encode(template, values)?,
        n => {
            return Err(EncodeError::NotSupported(
                "GRIB2 code table 5.0 (data representation template number)",
                n,
            ));
        }
    };
    Ok(EncodedField { template, payload })
}

type Packed = (Vec<i64>, Vec<u8>);

#[cfg(feature = "jpeg2000-unpack-with-openjpeg")]
fn encode_jpeg2000(
    template: &[i64],
    values: &[f32],
    config: &CodecConfig,
) -> Result<Packed, EncodeError> {
    jpeg2000::encode(template, values, config)
}

#[cfg(not(feature = "jpeg2000-unpack-with-openjpeg"))]
fn encode_jpeg2000(
    _template: &[i64],
    _values: &[f32],
    _config: &CodecConfig,
) -> Result<Packed, EncodeError> {
    Err(EncodeError::CodecDisabled("JPEG 2000"))
}

#[cfg(feature = "png-unpack-with-png-crate")]
fn encode_png(template: &[i64], values: &[f32]) -> Result<Packed, EncodeError> {
    png::encode(template, values)
}

#[cfg(not(feature = "png-unpack-with-png-crate"))]
fn encode_png(_template: &[i64], _values: &[f32]) -> Result<Packed, EncodeError> {
    Err(EncodeError::CodecDisabled("PNG"))
}

#[cfg(feature = "ccsds-unpack-with-libaec")]
fn encode_ccsds(
    template: &[i64],
    values: &[f32],
    config: &CodecConfig,
) -> Result<Packed, EncodeError> {
    ccsds::encode(template, values, config)
}

#[cfg(not(feature = "ccsds-unpack-with-libaec"))]
fn encode_ccsds(
    _template: &[i64],
    _values: &[f32],
    _config: &CodecConfig,
) -> Result<Packed, EncodeError> {
    Err(EncodeError::CodecDisabled("CCSDS"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_template() {
        assert_eq!(
            encode(65000, &[], &[1.0], &CodecConfig::default()),
            Err(EncodeError::UnrecognizedTemplate(TemplateInfo(5, 65000)))
        );
    }

    #[test]
    fn template_of_wrong_length() {
        assert_eq!(
            encode(0, &[0, 0, 0], &[1.0], &CodecConfig::default()),
            Err(EncodeError::TemplateLengthMismatch {
                expected: 5,
                actual: 3
            })
        );
    }

    #[test]
    fn decode_only_templates() {
        assert!(matches!(
            encode(51, &[0; 10], &[1.0], &CodecConfig::default()),
            Err(EncodeError::NotSupported(_, 51))
        ));
        assert!(matches!(
            encode(200, &[0, 0, 0, 0], &[1.0], &CodecConfig::default()),
            Err(EncodeError::NotSupported(_, 200))
        ));
    }

    #[test]
    fn simple_packing_identity_with_32_bits() {
        let values = vec![0.0, 1.0, 65_536.0, 16_777_215.0];
        let field = encode(0, &[0, 0, 0, 32, 0], &values, &CodecConfig::default()).unwrap();
        assert_eq!(field.template[3], 32);
        let repr = crate::ReprDefinition::new(4, 0, field.template);
        let grid = crate::GridDefinition::new(4, 65535, Vec::new());
        let actual =
            crate::decoder::decode(&repr, &field.payload, &grid, &CodecConfig::default()).unwrap();
        assert_eq!(actual, values);
    }
}
