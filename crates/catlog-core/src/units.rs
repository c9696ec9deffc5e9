//! Conversion of duration values between time units.

use catlog_types::TimeUnit;

/// Convert `value` expressed in `from` into the equivalent count of `to`.
///
/// Same-unit conversions return `value` untouched, so no precision is lost
/// on the identity path.
///
/// # Example
///
/// ```
/// use catlog_core::units::convert;
/// use catlog_types::TimeUnit;
///
/// assert_eq!(convert(1500.0, TimeUnit::Milliseconds, TimeUnit::Seconds), 1.5);
/// assert_eq!(convert(2.0, TimeUnit::Hours, TimeUnit::Minutes), 120.0);
/// ```
pub fn convert(value: f64, from: TimeUnit, to: TimeUnit) -> f64 {
    if from == to {
        return value;
    }
    let nanos = value * from.nanos_per_unit() as f64;
    nanos / to.nanos_per_unit() as f64
}

/// A numeric duration accepted by the duration logging calls.
///
/// Implemented for the primitive integer and floating-point types so that
/// `log_time` takes either without a cast at the call site.
pub trait DurationValue: Copy {
    /// The value as a double.
    fn as_f64(self) -> f64;
}

macro_rules! duration_value {
    ($($t:ty),*) => {
        $(
            impl DurationValue for $t {
                fn as_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

duration_value!(i32, i64, u32, u64, usize, u128, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit() -> impl Strategy<Value = TimeUnit> {
        prop::sample::select(TimeUnit::ALL.to_vec())
    }

    #[test]
    fn test_known_conversions() {
        assert_eq!(convert(1.0, TimeUnit::Seconds, TimeUnit::Nanoseconds), 1e9);
        assert_eq!(convert(90.0, TimeUnit::Minutes, TimeUnit::Hours), 1.5);
        assert_eq!(convert(3.0, TimeUnit::Milliseconds, TimeUnit::Nanoseconds), 3e6);
        assert_eq!(convert(1.0, TimeUnit::Hours, TimeUnit::Seconds), 3600.0);
    }

    #[test]
    fn test_identity_is_exact_for_awkward_values() {
        for u in TimeUnit::ALL {
            for x in [0.1, 1.0 / 3.0, f64::MIN_POSITIVE, 123_456_789.987_654_3] {
                assert_eq!(convert(x, u, u), x);
            }
        }
    }

    #[test]
    fn test_duration_value() {
        assert_eq!(7i64.as_f64(), 7.0);
        assert_eq!(2.5f32.as_f64(), 2.5);
        assert_eq!(3u128.as_f64(), 3.0);
    }

    proptest! {
        #[test]
        fn prop_identity_conversion(x in any::<f64>(), u in unit()) {
            let y = convert(x, u, u);
            prop_assert!(y == x || (x.is_nan() && y.is_nan()));
        }

        #[test]
        fn prop_round_trip_within_tolerance(x in -1e9f64..1e9f64, a in unit(), b in unit()) {
            let back = convert(convert(x, a, b), b, a);
            let tolerance = x.abs().max(1.0) * 1e-12;
            prop_assert!((back - x).abs() <= tolerance, "{} -> {} -> {}", x, back, tolerance);
        }
    }
}
