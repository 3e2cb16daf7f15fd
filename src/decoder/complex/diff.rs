use super::missing::DecodedValue::{self, Normal};
use crate::{error::DecodeError, helpers::grib_int_from_bytes};

/// Extra descriptors at the head of a Section 7 payload packed with spatial
/// differencing: the first `order` original values followed by the overall
/// minimum of the differences, each a sign-magnitude integer of the same
/// octet count.
pub(crate) struct SpatialDifferencingExtraDescriptors<'a> {
    slice: &'a [u8],
    order: usize,
    num_octets: usize,
}

impl<'a> SpatialDifferencingExtraDescriptors<'a> {
    pub(crate) fn new(
        parent_slice: &'a [u8],
        spdiff_order: u8,
        num_octets: u8,
    ) -> Result<Self, DecodeError> {
        if !(1..=2).contains(&spdiff_order) {
            return Err(DecodeError::NotSupported(
                "GRIB2 code table 5.6 (order of spatial differencing)",
                spdiff_order.into(),
            ));
        }
        if num_octets > 8 {
            return Err(DecodeError::NotSupported(
                "number of octets for extra descriptors",
                num_octets.into(),
            ));
        }
        let num_octets = usize::from(num_octets);
        let byte_length = usize::from(spdiff_order + 1) * num_octets;
        let slice = parent_slice
            .get(..byte_length)
            .ok_or(DecodeError::LengthMismatch)?;

        Ok(Self {
            slice,
            order: usize::from(spdiff_order),
            num_octets,
        })
    }

    // total number of octets for descriptors
    pub(crate) fn len(&self) -> usize {
        self.slice.len()
    }

    // overall minimum of the differences
    pub(crate) fn minimum(&self) -> i64 {
        grib_int_from_bytes(&self.slice[self.first_value_end_pos()..])
    }

    pub(crate) fn first_values(&self) -> Vec<i64> {
        if self.num_octets == 0 {
            return vec![0; self.order];
        }
        self.slice[..self.first_value_end_pos()]
            .chunks_exact(self.num_octets)
            .map(grib_int_from_bytes)
            .collect()
    }

    fn first_value_end_pos(&self) -> usize {
        self.len() - self.num_octets
    }
}

pub(crate) enum SpatialDiffDecodeIterator<I, J> {
    FirstOrder(SpatialDiff1stOrderDecodeIterator<I, J>),
    SecondOrder(SpatialDiff2ndOrderDecodeIterator<I, J>),
}

impl<I, J> SpatialDiffDecodeIterator<I, J>
where
    I: Iterator<Item = DecodedValue>,
    J: Iterator<Item = i64>,
{
    pub(crate) fn new(order: u8, iter: I, first_values: J) -> Self {
        if order == 1 {
            Self::FirstOrder(SpatialDiff1stOrderDecodeIterator::new(iter, first_values))
        } else {
            Self::SecondOrder(SpatialDiff2ndOrderDecodeIterator::new(iter, first_values))
        }
    }
}

impl<I, J> Iterator for SpatialDiffDecodeIterator<I, J>
where
    I: Iterator<Item = DecodedValue>,
    J: Iterator<Item = i64>,
{
    type Item = DecodedValue;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::FirstOrder(iter) => iter.next(),
            Self::SecondOrder(iter) => iter.next(),
        }
    }
}

// Missing values pass through untouched and do not take part in the
// summation.
pub(crate) struct SpatialDiff1stOrderDecodeIterator<I, J> {
    iter: I,
    first_values: J,
    count: u32,
    prev: i64,
}

impl<I, J> SpatialDiff1stOrderDecodeIterator<I, J> {
    pub(crate) fn new(iter: I, first_values: J) -> Self {
        Self {
            iter,
            first_values,
            count: 0,
            prev: 0,
        }
    }
}

impl<I, J> Iterator for SpatialDiff1stOrderDecodeIterator<I, J>
where
    I: Iterator<Item = DecodedValue>,
    J: Iterator<Item = i64>,
{
    type Item = DecodedValue;

    fn next(&mut self) -> Option<Self::Item> {
        match self.iter.next()? {
            Normal(v) => {
                let v = if self.count == 0 {
                    self.count += 1;
                    self.first_values.next()?
                } else {
                    v + self.prev
                };
                self.prev = v;
                Some(Normal(v))
            }
            missing => Some(missing),
        }
    }
}

pub(crate) struct SpatialDiff2ndOrderDecodeIterator<I, J> {
    iter: I,
    first_values: J,
    count: u32,
    prev1: i64,
    prev2: i64,
}

impl<I, J> SpatialDiff2ndOrderDecodeIterator<I, J> {
    pub(crate) fn new(iter: I, first_values: J) -> Self {
        Self {
            iter,
            first_values,
            count: 0,
            prev1: 0,
            prev2: 0,
        }
    }
}

impl<I, J> Iterator for SpatialDiff2ndOrderDecodeIterator<I, J>
where
    I: Iterator<Item = DecodedValue>,
    J: Iterator<Item = i64>,
{
    type Item = DecodedValue;

    fn next(&mut self) -> Option<Self::Item> {
        match self.iter.next()? {
            Normal(v) => {
                let v = if self.count < 2 {
                    self.count += 1;
                    self.first_values.next()?
                } else {
                    v + 2 * self.prev1 - self.prev2
                };
                self.prev2 = self.prev1;
                self.prev1 = v;
                Some(Normal(v))
            }
            missing => Some(missing),
        }
    }
}
