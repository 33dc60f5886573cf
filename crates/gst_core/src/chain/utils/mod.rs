use std::ops::{Add, Div, Rem};

use crate::chain::error::ChainError;

mod usage_accumulator;
pub use usage_accumulator::*;

#[inline]
pub fn gst_assert<T>(condition: bool, error: T) -> Result<(), T> {
    if condition { Ok(()) } else { Err(error) }
}

pub fn integer_divide_ceil<T>(num: T, den: T) -> T
where
    T: Copy + PartialOrd + Div<Output = T> + Rem<Output = T> + Add<Output = T> + From<u8>,
{
    let div = num / den;
    let rem = num % den;
    if rem > T::from(0) {
        div + T::from(1)
    } else {
        div
    }
}

/// Narrow a 128-bit intermediate back into the signed 64-bit range callers
/// expect. Values outside the range mean a totals invariant has been broken.
pub fn downgrade_cast(value: u128) -> Result<i64, ChainError> {
    i64::try_from(value).map_err(|_| {
        ChainError::RateLimitingStateInconsistent(
            "cast exceeds the range of the destination type".to_string(),
        )
    })
}
