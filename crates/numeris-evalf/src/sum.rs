//! Guarded summation of approximate terms.
//!
//! This is the error-propagation workhorse shared by addition and by
//! multiplication's cross-term recombination: terms are aligned into a
//! single wide integer accumulator while the worst absolute error
//! contributed by any input is tracked alongside, so the reported accuracy
//! honestly degrades when cancellation shrinks the sum.

use dashu::base::BitTest;
use dashu::integer::IBig;
use numeris_float::Mpf;

use crate::value::{scaled_zero, ACC_NEG_INF};

/// Sums `(value, accuracy)` terms at working precision `prec`, rounding
/// the result to `target_prec`.
///
/// Returns the sum and its accuracy. `None` means the sum is exactly
/// zero with nothing to track; a present value with accuracy −1 is a
/// scaled zero produced by complete cancellation, whose magnitude bounds
/// the absolute error of the inputs.
pub(crate) fn add_terms(
    terms: &[(Mpf, i64)],
    prec: i64,
    target_prec: i64,
) -> (Option<Mpf>, i64) {
    let live: Vec<&(Mpf, i64)> = terms.iter().filter(|(x, _)| !x.is_zero()).collect();
    if live.is_empty() {
        return (None, ACC_NEG_INF);
    }
    if live.len() == 1 {
        let (x, acc) = live[0];
        return (Some(x.clone()), *acc);
    }

    // Terms further than this from the running sum cannot influence the
    // rounded result; their own accuracy already covers the omission.
    let window = 4 * prec;
    let mut sum_man = IBig::ZERO;
    let mut sum_exp = 0i64;
    let mut absolute_error = ACC_NEG_INF;

    for (x, acc) in live {
        absolute_error = absolute_error.max(x.mag() - acc);
        let man = x.signed_mantissa();
        let delta = x.exponent() - sum_exp;
        if delta >= 0 {
            // running sum negligible next to this term?
            let sum_bits = sum_man.bit_len() as i64;
            if delta > window && (sum_man == IBig::ZERO || delta - sum_bits > window) {
                sum_man = man;
                sum_exp = x.exponent();
            } else {
                sum_man = (man << (delta as usize)) + sum_man;
            }
        } else {
            let delta = -delta;
            // term negligible next to the running sum?
            if delta - x.bit_count() > window && sum_man != IBig::ZERO {
                continue;
            }
            sum_man = (sum_man << (delta as usize)) + man;
            sum_exp = x.exponent();
        }
    }

    if sum_man == IBig::ZERO {
        if absolute_error == ACC_NEG_INF {
            // exact inputs cancelled exactly
            return (None, ACC_NEG_INF);
        }
        return (Some(scaled_zero(absolute_error)), -1);
    }
    let sum = Mpf::from_man_exp(&sum_man, sum_exp);
    let mut sum_acc = sum.mag() - absolute_error;
    let rounded = sum.normalized(target_prec);
    // rounding the accumulator is itself an error source: a claim above
    // the rounding precision would be dishonest when bits were dropped
    if rounded != sum {
        sum_acc = sum_acc.min(target_prec);
    }
    (Some(rounded), sum_acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ACC_INF;

    fn t(v: i64, acc: i64) -> (Mpf, i64) {
        (Mpf::from_i64(v), acc)
    }

    #[test]
    fn test_empty_and_single() {
        assert!(add_terms(&[], 53, 53).0.is_none());
        let (v, acc) = add_terms(&[t(7, 40)], 53, 53);
        assert_eq!(v.unwrap(), Mpf::from_i64(7));
        assert_eq!(acc, 40);
        let (v, _) = add_terms(&[t(0, ACC_INF), t(5, 40)], 53, 53);
        assert_eq!(v.unwrap(), Mpf::from_i64(5));
    }

    #[test]
    fn test_simple_sum_accuracy() {
        // 3 + 5 = 8, each term accurate to 50 bits: absolute error
        // max(2-50, 3-50) = -47; sum mag 4 -> accuracy 51
        let (v, acc) = add_terms(&[t(3, 50), t(5, 50)], 53, 53);
        assert_eq!(v.unwrap(), Mpf::from_i64(8));
        assert_eq!(acc, 51);
    }

    #[test]
    fn test_cancellation_degrades_accuracy() {
        // 1025 - 1024 = 1: inputs carry absolute error 2^(11-50); the
        // unit-sized result keeps only ~40 bits
        let (v, acc) = add_terms(&[t(1025, 50), t(-1024, 50)], 53, 53);
        assert_eq!(v.unwrap(), Mpf::one());
        assert_eq!(acc, 1 - (11 - 50));
    }

    #[test]
    fn test_full_cancellation_yields_scaled_zero() {
        let (v, acc) = add_terms(&[t(12, 40), t(-12, 40)], 53, 53);
        let z = v.unwrap();
        assert!(!z.is_zero());
        assert_eq!(acc, -1);
        // magnitude bounded by the inputs' absolute error 2^(4-40)
        assert_eq!(z.mag(), 4 - 40 + 1);
    }

    #[test]
    fn test_exact_cancellation_is_exact_zero() {
        let (v, acc) = add_terms(&[t(12, ACC_INF), t(-12, ACC_INF)], 53, 53);
        assert!(v.is_none());
        assert_eq!(acc, ACC_NEG_INF);
    }

    #[test]
    fn test_negligible_term_dropped() {
        let tiny = Mpf::one().shifted(-4000);
        let (v, acc) = add_terms(&[t(1, 500), (tiny, 500)], 53, 53);
        assert_eq!(v.unwrap(), Mpf::one());
        assert!(acc > 0);
    }

    #[test]
    fn test_mixed_exponent_alignment() {
        // 1/2 + 1/4 + 1/4 = 1 exactly
        let h = Mpf::half();
        let q = Mpf::half().shifted(-1);
        let (v, _) = add_terms(&[(h, 60), (q.clone(), 60), (q, 60)], 60, 60);
        assert_eq!(v.unwrap(), Mpf::one());
    }
}
