// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use std::sync::atomic::{AtomicU32, Ordering};

/// Significant decimal digits used for reals unless overridden per call.
pub const DEFAULT_REAL_PRECISION: u32 = 10;

static REAL_PRECISION: AtomicU32 = AtomicU32::new(DEFAULT_REAL_PRECISION);

/// The process-wide decimal precision for `real` values.
pub fn real_precision() -> u32 {
    REAL_PRECISION.load(Ordering::SeqCst)
}

/// Set the process-wide decimal precision for `real` values.
///
/// A precision of zero is treated as one significant digit.
pub fn set_real_precision(digits: u32) {
    REAL_PRECISION.store(digits.max(1), Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_round_trips_and_clamps() {
        let before = real_precision();
        set_real_precision(25);
        assert_eq!(real_precision(), 25);
        set_real_precision(0);
        assert_eq!(real_precision(), 1);
        set_real_precision(before);
    }
}
