use std::ops::Mul;

use gst_proc_macros::{NumBytes, Read, Write};

use crate::chain::{
    config::RATE_LIMITING_PRECISION,
    error::ChainError,
    utils::{gst_assert, integer_divide_ceil},
};

#[derive(Debug, Clone, Copy, PartialEq, Read, Write, NumBytes, Default, Eq, Hash)]
pub struct Ratio<T> {
    pub numerator: T,
    pub denominator: T,
}

pub fn make_ratio<T>(n: T, d: T) -> Ratio<T> {
    Ratio {
        numerator: n,
        denominator: d,
    }
}

impl Mul<Ratio<u128>> for u128 {
    type Output = Result<u128, ChainError>;

    fn mul(self, r: Ratio<u128>) -> Self::Output {
        let product = self.checked_mul(r.numerator).ok_or_else(|| {
            ChainError::InvalidArgument(
                "usage exceeds maximum value representable after extending for precision"
                    .to_string(),
            )
        })?;
        Ok(product / r.denominator)
    }
}

/// A decaying average over a sliding window of ordinals. `value_ex` holds the
/// average pre-multiplied by `RATE_LIMITING_PRECISION`; `consumed` holds the
/// raw units of the most recent sample. Callers must pass non-decreasing
/// ordinals.
#[derive(Debug, Clone, Copy, NumBytes, Read, Write, Default, PartialEq, Eq, Hash)]
pub struct UsageAccumulator {
    pub last_ordinal: u64,
    pub value_ex: u128,
    pub consumed: u64,
}

impl UsageAccumulator {
    pub fn average(&self) -> u64 {
        (self.value_ex / RATE_LIMITING_PRECISION as u128) as u64
    }

    pub fn add(&mut self, units: u64, ordinal: u64, window_size: u64) -> Result<(), ChainError> {
        gst_assert(
            window_size > 0,
            ChainError::InvalidArgument("usage window cannot be zero".to_string()),
        )?;

        if self.last_ordinal != ordinal {
            gst_assert(
                ordinal > self.last_ordinal,
                ChainError::InvalidArgument(
                    "new ordinal cannot be less than the previous ordinal".to_string(),
                ),
            )?;

            let delta = ordinal - self.last_ordinal;
            if delta < window_size {
                let decay = make_ratio((window_size - delta) as u128, window_size as u128);
                self.value_ex = (self.value_ex * decay)?;
            } else {
                self.value_ex = 0;
            }

            self.last_ordinal = ordinal;
        }

        let value_ex_contrib = integer_divide_ceil(
            units as u128 * RATE_LIMITING_PRECISION as u128,
            window_size as u128,
        );
        self.value_ex = self.value_ex.checked_add(value_ex_contrib).ok_or_else(|| {
            ChainError::InvalidArgument(
                "overflow in accumulated value when adding usage".to_string(),
            )
        })?;
        self.consumed = units;

        Ok(())
    }
}
