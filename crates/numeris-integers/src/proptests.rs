//! Property-based tests for the exact number layer.

#[cfg(test)]
mod tests {
    use num_traits::Zero;
    use proptest::prelude::*;

    use crate::{Integer, Rational};

    // Strategy for generating small integers
    fn small_int() -> impl Strategy<Value = i64> {
        -1000i64..1000i64
    }

    // Strategy for generating non-zero integers
    fn non_zero_int() -> impl Strategy<Value = i64> {
        prop_oneof![(-1000i64..=-1i64), (1i64..=1000i64)]
    }

    proptest! {
        #[test]
        fn integer_add_commutative(a in small_int(), b in small_int()) {
            let a = Integer::new(a);
            let b = Integer::new(b);
            prop_assert_eq!(a.clone() + b.clone(), b + a);
        }

        #[test]
        fn integer_mul_associative(a in small_int(), b in small_int(), c in small_int()) {
            let a = Integer::new(a);
            let b = Integer::new(b);
            let c = Integer::new(c);
            prop_assert_eq!(
                (a.clone() * b.clone()) * c.clone(),
                a * (b * c)
            );
        }

        #[test]
        fn integer_bit_len_matches_log2(a in 1i64..1_000_000i64) {
            let n = Integer::new(a);
            let bits = n.bit_len() as u32;
            prop_assert!(a >= 1i64 << (bits - 1));
            prop_assert!(a < 1i64 << bits);
        }

        #[test]
        fn rational_always_lowest_terms(p in small_int(), q in non_zero_int()) {
            let r = Rational::from_i64(p, q);
            let num = r.numerator();
            let den = r.denominator();
            prop_assert!(!den.is_negative());
            // p/q == num/den exactly, checked by cross-multiplication
            prop_assert_eq!(Integer::new(p) * den, num * Integer::new(q));
        }

        #[test]
        fn rational_add_sub_roundtrip(p1 in small_int(), q1 in non_zero_int(),
                                      p2 in small_int(), q2 in non_zero_int()) {
            let a = Rational::from_i64(p1, q1);
            let b = Rational::from_i64(p2, q2);
            prop_assert_eq!((a.clone() + b.clone()) - b, a);
        }

        #[test]
        fn rational_recip_involution(p in non_zero_int(), q in non_zero_int()) {
            let r = Rational::from_i64(p, q);
            prop_assert_eq!(r.recip().recip(), r.clone());
            prop_assert!((r.clone() * r.recip() - Rational::from(1)).is_zero());
        }
    }
}
