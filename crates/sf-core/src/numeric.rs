use crate::SfError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, SfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SfError::NonFinite { what, value: v })
    }
}

/// Relative change between two iterates of one unknown.
///
/// Returns 0 when the values are identical (including both zero), otherwise
/// `|new - old| / max(|old|, |new|)`. Non-finite inputs propagate as NaN/Inf.
pub fn relative_change(old: Real, new: Real) -> Real {
    let diff = (new - old).abs();
    if diff == 0.0 {
        return 0.0;
    }
    diff / old.abs().max(new.abs())
}

/// Bernoulli function `B(x) = x / (exp(x) - 1)`, with `B(0) = 1`.
///
/// Uses a series expansion near zero and the asymptotic forms for large
/// arguments so it stays finite across the full range used by
/// Scharfetter-Gummel fluxes.
pub fn bernoulli(x: Real) -> Real {
    let ax = x.abs();
    if ax < 1e-3 {
        // 1 - x/2 + x^2/12 - x^4/720
        let x2 = x * x;
        1.0 - 0.5 * x + x2 / 12.0 - x2 * x2 / 720.0
    } else if x > 700.0 {
        x * (-x).exp()
    } else if x < -700.0 {
        -x
    } else {
        x / x.exp_m1()
    }
}
