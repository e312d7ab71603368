//! Closed form eigen decomposition of the symmetric matrix `[[a, b], [b, c]]`.
//!
//! The eigen values are returned as `rt1 >= rt2` (LAPACK's `dlaev2` orders
//! them by magnitude instead). `(cs, sn)` is the unit eigen vector associated
//! with `rt1`, `(-sn, cs)` the one associated with `rt2`.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sym2x2 {
    pub rt1: f64,
    pub rt2: f64,
    pub cs: f64,
    pub sn: f64,
}

/// Returns `(rt1, rt2)` with `rt1 >= rt2`.
pub fn eigen_values(a: f64, b: f64, c: f64) -> (f64, f64) {
    let sm = a + c;
    let df = a - c;
    let rt = (df * df + 4.0 * b * b).sqrt();
    // the root of largest magnitude is computed first, the other one from
    // the determinant
    if sm > 0.0 {
        let rt1 = 0.5 * (sm + rt);
        let t = 1.0 / rt1;
        (rt1, (a * t) * c - (b * t) * b)
    } else if sm < 0.0 {
        let rt2 = 0.5 * (sm - rt);
        let t = 1.0 / rt2;
        ((a * t) * c - (b * t) * b, rt2)
    } else {
        (0.5 * rt, -0.5 * rt)
    }
}

pub fn eigen_decomposition(a: f64, b: f64, c: f64) -> Sym2x2 {
    let (rt1, rt2) = eigen_values(a, b, c);
    let df = a - c;
    let rt = (df * df + 4.0 * b * b).sqrt();
    let mut cs = if df > 0.0 { df + rt } else { df - rt };
    let mut sn;
    if cs.abs() > 2.0 * b.abs() {
        let t = -2.0 * b / cs;
        sn = 1.0 / (1.0 + t * t).sqrt();
        cs = t * sn;
    } else if b == 0.0 {
        cs = 1.0;
        sn = 0.0;
    } else {
        let t = -0.5 * cs / b;
        cs = 1.0 / (1.0 + t * t).sqrt();
        sn = t * cs;
    }
    if df > 0.0 {
        let t = cs;
        cs = -sn;
        sn = t;
    }
    Sym2x2 { rt1, rt2, cs, sn }
}
