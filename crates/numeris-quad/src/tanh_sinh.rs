//! Tanh-sinh quadrature with level refinement.

use numeris_float::Mpf;

/// Result of a quadrature run.
#[derive(Clone, Debug)]
pub struct QuadResult {
    /// Real part of the computed integral.
    pub re: Mpf,
    /// Imaginary part of the computed integral.
    pub im: Mpf,
    /// Estimated absolute error (difference of the last two levels).
    pub error: Mpf,
    /// Total number of integrand evaluations.
    pub evaluations: usize,
}

impl QuadResult {
    /// Whether the error estimate certifies roughly `prec` bits.
    #[must_use]
    pub fn converged(&self, prec: i64) -> bool {
        let scale = self.re.mag().max(self.im.mag()).max(0);
        self.error.is_zero() || self.error.mag() < scale - prec
    }
}

/// Tanh-sinh rule sized for a target bit precision.
///
/// Each refinement level halves the step `h = 2^-m` and roughly doubles
/// the number of correct digits, so `max_level` is a hard cap rather
/// than a tuning knob.
#[derive(Clone, Copy, Debug)]
pub struct TanhSinh {
    prec: i64,
    max_level: u32,
}

impl TanhSinh {
    /// Creates a rule targeting `prec` bits of accuracy.
    #[must_use]
    pub fn new(prec: i64) -> Self {
        Self {
            prec,
            max_level: 12,
        }
    }

    /// Overrides the refinement-level cap.
    #[must_use]
    pub fn with_max_level(mut self, max_level: u32) -> Self {
        self.max_level = max_level;
        self
    }

    /// Integrates a complex-valued function over the finite interval
    /// `[a, b]`.
    ///
    /// The integrand receives abscissas strictly inside the interval,
    /// which is what lets integrable endpoint singularities through.
    pub fn integrate<F>(&self, mut f: F, a: &Mpf, b: &Mpf) -> QuadResult
    where
        F: FnMut(&Mpf) -> (Mpf, Mpf),
    {
        let wp = self.prec + 30;
        let center = a.add(b, wp).shifted(-1);
        let halfwidth = b.sub(a, wp).shifted(-1);
        if halfwidth.is_zero() {
            return QuadResult {
                re: Mpf::zero(),
                im: Mpf::zero(),
                error: Mpf::zero(),
                evaluations: 0,
            };
        }

        let evaluations = std::cell::Cell::new(0usize);
        let mut sample = |t: &Mpf| {
            let x = center.add(&halfwidth.mul(t, wp), wp);
            evaluations.set(evaluations.get() + 1);
            f(&x)
        };

        // Level 0 is the unit-step grid t = 0, 1, 2, ...; every later
        // level halves the step and only adds the odd multiples, so the
        // running sums stay valid across levels.
        let (re0, im0) = sample(&Mpf::zero());
        let w0 = Mpf::pi(wp).shifted(-1);
        let mut sum_re = w0.mul(&re0, wp);
        let mut sum_im = w0.mul(&im0, wp);

        let mut prev: Option<(Mpf, Mpf)> = None;
        let mut error = Mpf::one();
        let mut result = (Mpf::zero(), Mpf::zero());

        for level in 0..=self.max_level {
            let (first, step) = if level == 0 { (1, 1) } else { (1, 2) };
            let mut k = first;
            loop {
                let t = Mpf::from_i64(k).shifted(-i64::from(level));
                let Some(node) = node_at(&t, wp) else { break };
                let (rp, ip) = sample(&node.abscissa);
                let (rm, im) = sample(&node.abscissa.neg());
                sum_re = sum_re.add(&node.weight.mul(&rp.add(&rm, wp), wp), wp);
                sum_im = sum_im.add(&node.weight.mul(&ip.add(&im, wp), wp), wp);
                k += step;
            }

            let h_shift = -i64::from(level);
            let s_re = halfwidth.mul(&sum_re.shifted(h_shift), wp);
            let s_im = halfwidth.mul(&sum_im.shifted(h_shift), wp);
            if let Some((p_re, p_im)) = prev {
                let d_re = s_re.sub(&p_re, wp).abs();
                let d_im = s_im.sub(&p_im, wp).abs();
                error = if d_re >= d_im { d_re } else { d_im };
            }
            result = (s_re.clone(), s_im.clone());
            prev = Some((s_re, s_im));

            let scale = result.0.mag().max(result.1.mag()).max(0);
            if error.is_zero() || error.mag() < scale - (self.prec + 10) {
                break;
            }
            log::trace!(
                "tanh-sinh level {level}: {} evaluations, error magnitude {}",
                evaluations.get(),
                error.mag()
            );
        }

        QuadResult {
            re: result.0.normalized(self.prec),
            im: result.1.normalized(self.prec),
            error,
            evaluations: evaluations.get(),
        }
    }
}

struct Node {
    abscissa: Mpf,
    weight: Mpf,
}

/// Computes the tanh-sinh node and weight at parameter `t > 0`:
/// abscissa `tanh(q)` and weight `(pi/2 cosh t) / cosh^2(q)` for
/// `q = pi/2 sinh t`. Returns `None` once the weight is negligible at
/// the working precision.
fn node_at(t: &Mpf, wp: i64) -> Option<Node> {
    let one = Mpf::one();
    let et = t.exp(wp);
    let eti = one.div(&et, wp);
    let cosh_t = et.add(&eti, wp).shifted(-1);
    let sinh_t = et.sub(&eti, wp).shifted(-1);

    let q = Mpf::pi(wp).shifted(-1).mul(&sinh_t, wp);
    let eq = q.exp(wp);
    let eqi = one.div(&eq, wp);
    let cosh_q = eq.add(&eqi, wp).shifted(-1);

    let weight_num = Mpf::pi(wp).shifted(-1).mul(&cosh_t, wp);
    let weight = weight_num.div(&cosh_q.mul(&cosh_q, wp), wp);
    if weight.is_zero() || weight.mag() < -(wp + 10) {
        return None;
    }
    let abscissa = eq.sub(&eqi, wp).div(&eq.add(&eqi, wp), wp);
    Some(Node { abscissa, weight })
}
