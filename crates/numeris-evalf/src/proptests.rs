//! Property-based tests for the evaluation engine.

#[cfg(test)]
mod tests {
    use numeris_core::ExprArena;
    use numeris_float::Mpf;
    use numeris_integers::Rational;
    use proptest::prelude::*;
    use smallvec::smallvec;

    use crate::{evaluate, CertifiedValue, EvalOptions};

    // Strategy for generating small non-zero denominators
    fn non_zero_int() -> impl Strategy<Value = i64> {
        prop_oneof![(-1000i64..=-1i64), (1i64..=1000i64)]
    }

    // Bits of the claimed accuracy actually honored by the value.
    // Compares against a 400-bit reference and checks the error stays
    // under one unit in the last certified place.
    fn honors_claim(v: &CertifiedValue, reference: &Mpf) -> bool {
        match &v.re {
            None => reference.is_zero() || reference.mag() < -300,
            Some((value, p)) => {
                let diff = value.sub(reference, 400).abs();
                diff.is_zero() || diff.mag() <= value.mag() - p + 1
            }
        }
    }

    proptest! {
        #[test]
        fn rational_evaluation_honors_claimed_accuracy(
            num in -10_000i64..10_000i64,
            den in non_zero_int(),
            digits in 3u32..40u32,
        ) {
            let mut arena = ExprArena::new();
            let q = arena.rational(num, den);
            let v = evaluate(&mut arena, q, digits, &mut EvalOptions::new()).unwrap();
            let reference = Mpf::from_rational(&Rational::from_i64(num, den), 400);
            prop_assert!(honors_claim(&v, &reference));
        }

        #[test]
        fn integer_sums_are_exact(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64,
            c in -1_000_000i64..1_000_000i64,
        ) {
            let mut arena = ExprArena::new();
            let ha = arena.integer(a);
            let hb = arena.integer(b);
            let hc = arena.integer(c);
            let s = arena.add(smallvec![ha, hb, hc]);
            let v = evaluate(&mut arena, s, 20, &mut EvalOptions::new()).unwrap();
            let total = a + b + c;
            if total == 0 {
                prop_assert!(v.is_zero());
            } else {
                prop_assert_eq!(v.real().unwrap().clone(), Mpf::from_i64(total));
            }
        }

        #[test]
        fn integer_products_are_exact(
            a in -10_000i64..10_000i64,
            b in -10_000i64..10_000i64,
        ) {
            let mut arena = ExprArena::new();
            let ha = arena.integer(a);
            let hb = arena.integer(b);
            let m = arena.mul(smallvec![ha, hb]);
            let v = evaluate(&mut arena, m, 20, &mut EvalOptions::new()).unwrap();
            if a * b == 0 {
                prop_assert!(v.is_zero());
            } else {
                prop_assert_eq!(v.real().unwrap().clone(), Mpf::from_i64(a * b));
            }
        }

        #[test]
        fn sqrt_squared_recovers_the_input(
            n in 1i64..100_000i64,
            digits in 5u32..30u32,
        ) {
            let mut arena = ExprArena::new();
            let base = arena.integer(n);
            let half = arena.rational(1, 2);
            let root = arena.pow(base, half);
            let two = arena.integer(2);
            let squared = arena.pow(root, two);
            let v = evaluate(&mut arena, squared, digits, &mut EvalOptions::new()).unwrap();
            prop_assert!(honors_claim(&v, &Mpf::from_i64(n)));
        }

        #[test]
        fn requesting_more_digits_never_loses_certified_bits(
            num in 1i64..1000i64,
            den in 2i64..1000i64,
        ) {
            let mut arena = ExprArena::new();
            let q = arena.rational(num, den);
            let mut last = 0i64;
            for digits in [5u32, 10, 20, 40] {
                let v = evaluate(&mut arena, q, digits, &mut EvalOptions::new()).unwrap();
                let p = v.re.as_ref().map_or(i64::MAX, |(_, p)| *p);
                prop_assert!(p >= last, "certified bits shrank: {last} -> {p}");
                last = p;
            }
        }

        #[test]
        fn floor_plus_fraction_matches_integer_division(
            num in -10_000i64..10_000i64,
            den in non_zero_int(),
        ) {
            use numeris_core::functions;
            let mut arena = ExprArena::new();
            let q = arena.rational(num, den);
            let fl = arena.func(functions::FLOOR, smallvec![q]);
            let v = evaluate(&mut arena, fl, 15, &mut EvalOptions::new()).unwrap();
            // div_euclid rounds toward negative infinity only for a
            // positive divisor; normalize the sign first
            let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
            let want = num.div_euclid(den);
            if want == 0 {
                prop_assert!(v.is_zero());
            } else {
                prop_assert_eq!(v.real().unwrap().clone(), Mpf::from_i64(want));
            }
        }
    }
}
