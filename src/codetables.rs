//! Code tables consulted by the data codecs.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Code Table 5.6: Order of spatial differencing
#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Table5_6 {
    FirstOrder = 1,
    SecondOrder,
    Missing = 255,
}

/// Code Table 5.7: Precision of floating-point numbers
#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Table5_7 {
    Single = 1,
    Double,
    Quadruple,
    Missing = 255,
}

/// Code Table 5.40: Type of compression
#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Table5_40 {
    Lossless = 0,
    Lossy,
    Missing = 255,
}
