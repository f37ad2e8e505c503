//! Stumpff functions `C(z)` and `S(z)`.
//!
//! Closed forms lose all precision as `z → 0`, so a five-term Taylor series is used inside
//! `|z| <= SERIES_BAND`.

/// Half-width of the band around zero where the series expansion is used.
pub const SERIES_BAND: f64 = 1e-7;

/// `C(z) = (1 − cos √z) / z`, continued analytically for `z < 0`.
pub fn c(z: f64) -> f64 {
    if z > SERIES_BAND {
        (1.0 - z.sqrt().cos()) / z
    } else if z < -SERIES_BAND {
        ((-z).sqrt().cosh() - 1.0) / -z
    } else {
        1.0 / 2.0 - z / 24.0 + z * z / 720.0 - z.powi(3) / 40_320.0 + z.powi(4) / 3_628_800.0
    }
}

/// `S(z) = (√z − sin √z) / z^{3/2}`, continued analytically for `z < 0`.
pub fn s(z: f64) -> f64 {
    if z > SERIES_BAND {
        let sz = z.sqrt();
        (sz - sz.sin()) / sz.powi(3)
    } else if z < -SERIES_BAND {
        let sz = (-z).sqrt();
        (sz.sinh() - sz) / sz.powi(3)
    } else {
        1.0 / 6.0 - z / 120.0 + z * z / 5_040.0 - z.powi(3) / 362_880.0 + z.powi(4) / 39_916_800.0
    }
}
