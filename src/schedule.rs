//! Per-axis schedule evaluation (C2): the classic `c(k)`/`a(k)` curves and
//! the `R = a/c^2` identity they imply. Consulted by both the dispatch
//! engine (C4, for `c` only) and the update engine (C5, for `c` and,
//! under the classic variant or the schedule-free legacy fallback, `a`).

/// `base^exponent` computed via `exp(exponent * ln(base))`, as required so
/// that `k^gamma` and `(A+k)^alpha` stay numerically well-behaved for the
/// fractional exponents this schedule uses. `base` must be strictly
/// positive, which holds for every reachable `k >= 1`.
pub fn stable_pow(base: f64, exponent: f64) -> f64 {
    (exponent * base.ln()).exp()
}

/// `c_i(k) = c_base / k^gamma`.
pub fn c_at(c_base: f64, gamma: f64, k: f64) -> f64 {
    c_base / stable_pow(k, gamma)
}

/// `a_i(k) = a_base / (A + k)^alpha`. The exponent is applied after adding
/// `A`, preserved bit-for-bit per the source's open question.
pub fn a_at(a_base: f64, alpha: f64, a_const: f64, k: f64) -> f64 {
    a_base / stable_pow(a_const + k, alpha)
}

/// `R_i(k) = a_i(k) / c_i(k)^2`.
pub fn r_at(a: f64, c: f64) -> f64 {
    a / (c * c)
}

/// Base `c` at run creation: `c_end * num_iter^gamma`.
pub fn base_c(c_end: f64, gamma: f64, num_iter: u64) -> f64 {
    c_end * stable_pow(num_iter as f64, gamma)
}

/// Base `a` at run creation: `r_end * c_end^2 * (A + num_iter)^alpha`.
pub fn base_a(r_end: f64, c_end: f64, alpha: f64, a_const: f64, num_iter: u64) -> f64 {
    r_end * c_end * c_end * stable_pow(a_const + num_iter as f64, alpha)
}
