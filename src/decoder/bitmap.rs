use crate::{decoder::collect_points, error::DecodeError};

/// Spreads packed values over the grid points flagged present, yielding NaN
/// for the other points.
pub(crate) struct BitmapDecodeIterator<B, I> {
    bitmap: B,
    values: I,
}

impl<B, I> BitmapDecodeIterator<B, I> {
    pub(crate) fn new(bitmap: B, values: I) -> Self {
        Self { bitmap, values }
    }
}

impl<B, I> Iterator for BitmapDecodeIterator<B, I>
where
    B: Iterator<Item = bool>,
    I: Iterator<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bitmap.next()? {
            self.values.next()
        } else {
            Some(f32::NAN)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bitmap.size_hint()
    }
}

/// Returns one value per grid point, NaN where `bitmap` flags the point
/// absent. The number of present points must equal the number of `values`.
pub fn expand_with_bitmap(values: &[f32], bitmap: &[bool]) -> Result<Vec<f32>, DecodeError> {
    let num_present = bitmap.iter().filter(|f| **f).count();
    if num_present != values.len() {
        return Err(DecodeError::LengthMismatch);
    }
    let iter = BitmapDecodeIterator::new(bitmap.iter().copied(), values.iter().copied());
    collect_points(iter, bitmap.len())
}
