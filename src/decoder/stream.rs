use crate::bits::get_bits;

/// Values of a sequence of fields that may be zero bits wide, in which case
/// every field reads as 0 and no data is consumed.
pub(crate) enum BitStream<T> {
    ZeroSized(FixedValueIterator<u32>),
    NonZeroSized(NBitwiseIterator<T>),
}

impl<T> BitStream<T> {
    pub(crate) fn new(data: T, unit_size: usize, length: usize) -> Self {
        if unit_size == 0 {
            Self::ZeroSized(FixedValueIterator::new(0, length))
        } else {
            Self::NonZeroSized(NBitwiseIterator::new(data, unit_size))
        }
    }
}

impl<T> Iterator for BitStream<T>
where
    T: AsRef<[u8]>,
{
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::ZeroSized(z) => z.next(),
            Self::NonZeroSized(n) => n.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::ZeroSized(z) => z.size_hint(),
            Self::NonZeroSized(n) => n.size_hint(),
        }
    }
}

pub(crate) struct FixedValueIterator<T> {
    val: T,
    length: usize,
    pos: usize,
}

impl<T> FixedValueIterator<T> {
    pub(crate) fn new(val: T, length: usize) -> Self {
        Self {
            val,
            length,
            pos: 0,
        }
    }
}

impl<T> Iterator for FixedValueIterator<T>
where
    T: Copy,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos < self.length {
            self.pos += 1;
            Some(self.val)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.length - self.pos;
        (size, Some(size))
    }
}

/// Iterates over consecutive `size`-bit fields (1 to 32 bits) of a buffer.
/// A trailing partial field is not yielded.
#[derive(Clone)]
pub(crate) struct NBitwiseIterator<T> {
    data: T,
    size: usize,
    pos: usize,
}

impl<T> NBitwiseIterator<T> {
    pub(crate) fn new(data: T, size: usize) -> Self {
        Self { data, size, pos: 0 }
    }
}

impl<T> NBitwiseIterator<T>
where
    T: AsRef<[u8]>,
{
    fn remaining(&self) -> usize {
        if self.size == 0 {
            return 0;
        }
        let len_bits = self.data.as_ref().len() * 8;
        len_bits.saturating_sub(self.pos) / self.size
    }
}

impl<T> Iterator for NBitwiseIterator<T>
where
    T: AsRef<[u8]>,
{
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining() == 0 {
            return None;
        }
        let val = get_bits(self.data.as_ref(), self.pos, self.size);
        self.pos += self.size;
        Some(val as u32)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.remaining();
        (size, Some(size))
    }
}
