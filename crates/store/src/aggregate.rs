//! Numeric kinds usable in sum/average projections.

/// A numeric projection target for `sum` and `average`.
///
/// Implemented for `i32`, `i64`, `i128`, `f32` and `f64`. Fixed-point
/// amounts follow the workspace convention of scaled smallest-unit integers
/// (e.g. cents in `i64`, accumulated in `i128` when totals may overflow);
/// implement this trait for your own value type if you carry one.
pub trait Numeric: Copy + Send + Sync + 'static {
    /// Result type of an average over this kind.
    type Avg;

    fn zero() -> Self;

    fn add(self, rhs: Self) -> Self;

    /// Average of a non-empty set: `sum` divided by `count`.
    fn average(sum: Self, count: u64) -> Self::Avg;
}

impl Numeric for i32 {
    type Avg = f64;

    fn zero() -> Self {
        0
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn average(sum: Self, count: u64) -> f64 {
        f64::from(sum) / count as f64
    }
}

impl Numeric for i64 {
    type Avg = f64;

    fn zero() -> Self {
        0
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn average(sum: Self, count: u64) -> f64 {
        sum as f64 / count as f64
    }
}

impl Numeric for i128 {
    type Avg = f64;

    fn zero() -> Self {
        0
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn average(sum: Self, count: u64) -> f64 {
        sum as f64 / count as f64
    }
}

impl Numeric for f32 {
    type Avg = f32;

    fn zero() -> Self {
        0.0
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn average(sum: Self, count: u64) -> f32 {
        sum / count as f32
    }
}

impl Numeric for f64 {
    type Avg = f64;

    fn zero() -> Self {
        0.0
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn average(sum: Self, count: u64) -> f64 {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_average_is_double_precision() {
        assert_eq!(<i64 as Numeric>::average(3, 2), 1.5);
    }

    #[test]
    fn wide_integer_sums_avoid_narrow_overflow() {
        let sum = <i128 as Numeric>::add(i64::MAX as i128, i64::MAX as i128);
        assert_eq!(sum, 2 * i64::MAX as i128);
    }
}
