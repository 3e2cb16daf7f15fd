use crate::error::EncodeError;

/// Reads template entry `index` as `T`.
pub(crate) fn narrow<T: TryFrom<i64>>(template: &[i64], index: usize) -> Result<T, EncodeError> {
    let value = template
        .get(index)
        .copied()
        .ok_or(EncodeError::TemplateLengthMismatch {
            expected: index + 1,
            actual: template.len(),
        })?;
    T::try_from(value).map_err(|_| {
        EncodeError::ValueOutOfRange(format!("template entry {index} out of range: {value}"))
    })
}
