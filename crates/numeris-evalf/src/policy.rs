//! Retry policies.
//!
//! Every operator shares the same escalate-and-retry shape; the step
//! schedules live here so they can be tuned and unit-tested independently
//! of any particular evaluator.

/// Working-precision escalation schedule for retry loops.
#[derive(Clone, Copy, Debug)]
pub struct EscalationPolicy {
    /// Base increment added to the geometric term on every retry.
    pub base_step: i64,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self { base_step: 10 }
    }
}

impl EscalationPolicy {
    /// Precision increment for retry number `attempt` (0-based) given the
    /// measured accuracy shortfall: the shortfall itself, but never less
    /// than a geometrically growing minimum so stalled loops still make
    /// progress.
    #[must_use]
    pub fn step(&self, attempt: u32, shortfall: i64) -> i64 {
        let floor = self.base_step + (1i64 << attempt.min(40));
        floor.max(shortfall)
    }

    /// Precision increment for quadrature retries: the full target minus
    /// the achieved accuracy, with the achieved value clamped below by a
    /// geometrically falling floor so wildly negative estimates cannot
    /// demand absurd jumps at once.
    #[must_use]
    pub fn integral_step(&self, attempt: u32, target: i64, achieved: i64) -> i64 {
        (target - achieved.max(-(1i64 << attempt.min(40)))).max(1)
    }
}

/// Thresholds for floor/ceiling integer determination.
///
/// The residual certification step historically used fixed constants (a
/// 10-bit residual evaluation checked at 3 bits); they are parameters
/// here because the fixed values are a heuristic, not a proven bound.
#[derive(Clone, Copy, Debug)]
pub struct IntegerPartPolicy {
    /// Precision of the initial size probe.
    pub probe_prec: i64,
    /// Probe gaps above `-margin` trigger a boosted re-evaluation.
    pub margin: i64,
    /// Precision at which the exact residual is evaluated.
    pub residual_prec: i64,
    /// Accuracy the residual must certify to fix the rounding direction.
    pub residual_target: i64,
}

impl Default for IntegerPartPolicy {
    fn default() -> Self {
        Self {
            probe_prec: 30,
            margin: 10,
            residual_prec: 10,
            residual_target: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_grows_geometrically() {
        let p = EscalationPolicy::default();
        assert_eq!(p.step(0, 0), 11);
        assert_eq!(p.step(1, 0), 12);
        assert_eq!(p.step(4, 0), 26);
        assert_eq!(p.step(6, 0), 74);
    }

    #[test]
    fn test_step_honors_shortfall() {
        let p = EscalationPolicy::default();
        assert_eq!(p.step(0, 500), 500);
        assert_eq!(p.step(3, 17), 18);
    }

    #[test]
    fn test_integral_step() {
        let p = EscalationPolicy::default();
        // achieved 20 of 50: ask for the missing 30
        assert_eq!(p.integral_step(0, 50, 20), 30);
        // hopeless estimate clamped by the geometric floor
        assert_eq!(p.integral_step(0, 50, -1000), 51);
        assert_eq!(p.integral_step(3, 50, -1000), 58);
    }
}
