//! Property-based tests for the float backend.

#[cfg(test)]
mod tests {
    use dashu::integer::IBig;
    use proptest::prelude::*;

    use crate::Mpf;

    // Strategy for generating non-zero mantissa values
    fn non_zero_i64() -> impl Strategy<Value = i64> {
        prop_oneof![(i64::MIN / 2..=-1i64), (1i64..=i64::MAX / 2)]
    }

    proptest! {
        #[test]
        fn rounding_error_stays_below_one_ulp(v in non_zero_i64(), prec in 4i64..200i64) {
            let x = Mpf::from_i64(v);
            let rounded = x.normalized(prec);
            let diff = x.sub(&rounded, 300).abs();
            // round-to-nearest keeps the error under half an ulp at `prec`
            prop_assert!(diff.is_zero() || diff.mag() <= x.mag() - prec + 1);
        }

        #[test]
        fn addition_commutes_exactly(a in any::<i32>(), b in any::<i32>()) {
            let x = Mpf::from_i64(i64::from(a));
            let y = Mpf::from_i64(i64::from(b));
            prop_assert_eq!(x.add(&y, 120), y.add(&x, 120));
        }

        #[test]
        fn multiplication_by_one_is_exact(v in non_zero_i64()) {
            let x = Mpf::from_i64(v);
            prop_assert!(x.mul(&Mpf::one(), 120).sub(&x, 200).is_zero());
        }

        #[test]
        fn integers_round_trip_through_nearest(n in any::<i32>()) {
            let x = Mpf::from_i64(i64::from(n));
            prop_assert_eq!(x.to_ibig_nearest(), IBig::from(i64::from(n)));
        }

        #[test]
        fn sqrt_of_a_perfect_square_recovers_the_root(n in 1i64..50_000i64) {
            let root = Mpf::from_i64(n * n).sqrt(80);
            let exact = Mpf::from_i64(n);
            let diff = root.sub(&exact, 200).abs();
            prop_assert!(diff.is_zero() || diff.mag() < exact.mag() - 75);
        }

        #[test]
        fn from_ratio_agrees_with_division(num in non_zero_i64(), den in 1i64..1_000_000i64) {
            let direct = Mpf::from_ratio(&IBig::from(num), &IBig::from(den), 80);
            let divided = Mpf::from_i64(num).div(&Mpf::from_i64(den), 80);
            let diff = direct.sub(&divided, 200).abs();
            prop_assert!(diff.is_zero() || diff.mag() <= direct.mag() - 78);
        }
    }
}
