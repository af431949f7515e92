//! Supported element, value, and index types
//!
//! The sets of types the runtime instantiates kernels for are closed and
//! registered here, so the supported combinations are visible in one place
//! rather than generated by macro expansion at every use site.

use num_traits::{Float, NumAssignOps, PrimInt};
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Anything an [`Array`](crate::array::Array) can hold
///
/// Elements are plain copyable data: they move between executors as raw
/// bytes, so they must not own heap storage.
pub trait Element: Copy + Default + PartialEq + Debug + Send + Sync + 'static {}

macro_rules! impl_element {
    ($($t:ty),* $(,)?) => {
        $(impl Element for $t {})*
    };
}

impl_element!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

/// Floating-point value types kernels are instantiated for
pub trait Value: Element + Float + NumAssignOps + Sum + Display {
    /// Backend-independent name, used in log output
    const NAME: &'static str;
}

impl Value for f32 {
    const NAME: &'static str = "f32";
}

impl Value for f64 {
    const NAME: &'static str = "f64";
}

/// Integer index types for sparse storage
pub trait Index: Element + PrimInt + Display {
    /// Widen to usize for slice indexing
    fn as_usize(self) -> usize;

    /// Narrow from usize; panics on overflow, which for supported index
    /// types only happens past 2^31 rows
    fn from_usize(i: usize) -> Self;
}

impl Index for i32 {
    fn as_usize(self) -> usize {
        self as usize
    }

    fn from_usize(i: usize) -> Self {
        i as i32
    }
}

impl Index for i64 {
    fn as_usize(self) -> usize {
        self as usize
    }

    fn from_usize(i: usize) -> Self {
        i as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_types_are_registered() {
        fn assert_value<V: Value>() {}
        assert_value::<f32>();
        assert_value::<f64>();
    }

    #[test]
    fn index_round_trips_through_usize() {
        assert_eq!(i32::from_usize(41).as_usize(), 41);
        assert_eq!(i64::from_usize(0).as_usize(), 0);
    }
}
