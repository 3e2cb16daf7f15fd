use self::DecodedValue::{Missing1, Missing2, Normal};

/// An integer unpacked from a complex packing payload, or one of the two
/// missing-value markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodedValue {
    Normal(i64),
    Missing1,
    Missing2,
}

impl DecodedValue {
    /// Classifies `value` read from a field of `width` bits. Under missing
    /// value management 1 the all-ones pattern is the primary missing value;
    /// management 2 additionally reserves the pattern just below it.
    pub(crate) fn classify(value: u64, width: usize, management: u8, offset: i64) -> Self {
        let missing1 = if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        let missing2 = missing1.wrapping_sub(1);
        if management > 0 && value == missing1 {
            Missing1
        } else if management == 2 && value == missing2 {
            Missing2
        } else {
            Normal(value as i64 + offset)
        }
    }

    pub(crate) fn to_f32<F>(self, reconstruct: F, substitutes: (f32, f32)) -> f32
    where
        F: FnOnce(i64) -> f32,
    {
        match self {
            Normal(v) => reconstruct(v),
            Missing1 => substitutes.0,
            Missing2 => substitutes.1,
        }
    }
}
