use num::ToPrimitive;

use crate::{
    decoder::{
        collect_points,
        param::SimplePackingParam,
        stream::{FixedValueIterator, NBitwiseIterator},
    },
    error::*,
};

pub(crate) enum SimplePackingDecoder<I> {
    // If nbits equals 0, every grid point takes the reference value as it is.
    ZeroLength(FixedValueIterator<f32>),
    NonZeroLength(NonZeroSimplePackingDecoder<I>),
}

impl<I, N> Iterator for SimplePackingDecoder<I>
where
    I: Iterator<Item = N>,
    N: ToPrimitive,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::ZeroLength(inner) => inner.next(),
            Self::NonZeroLength(inner) => inner.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::ZeroLength(inner) => inner.size_hint(),
            Self::NonZeroLength(inner) => inner.size_hint(),
        }
    }
}

pub(crate) fn decode(
    template: &[i64],
    payload: &[u8],
    num_points: usize,
) -> Result<Vec<f32>, DecodeError> {
    SimplePackingParam::check_orig_field_type(template)?;
    let param = SimplePackingParam::from_template(template)?;
    collect_points(unpack(&param, payload, num_points), num_points)
}

/// Reconstructs values packed with `param` from the payload octets.
pub(crate) fn unpack<'a>(
    param: &SimplePackingParam,
    payload: &'a [u8],
    num_points: usize,
) -> SimplePackingDecoder<NBitwiseIterator<&'a [u8]>> {
    if param.nbit == 0 {
        SimplePackingDecoder::ZeroLength(FixedValueIterator::new(param.ref_val, num_points))
    } else {
        let iter = NBitwiseIterator::new(payload, usize::from(param.nbit));
        SimplePackingDecoder::NonZeroLength(NonZeroSimplePackingDecoder::new(iter, param))
    }
}

pub(crate) struct NonZeroSimplePackingDecoder<I> {
    iter: I,
    ref_val: f32,
    bscale: f32,
    dscale: f32,
}

impl<I> NonZeroSimplePackingDecoder<I> {
    pub(crate) fn new(iter: I, param: &SimplePackingParam) -> Self {
        Self {
            iter,
            ref_val: param.ref_val,
            bscale: 2_f32.powi(param.exp.into()),
            dscale: 10_f32.powi(-i32::from(param.dig)),
        }
    }
}

impl<I: Iterator<Item = N>, N: ToPrimitive> Iterator for NonZeroSimplePackingDecoder<I> {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let encoded = self.iter.next()?.to_f32()?;
        Some((encoded * self.bscale + self.ref_val) * self.dscale)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}
