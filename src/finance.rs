//! General functions related to finance.
use crate::units::Dimensionless;

/// Calculates the annuity factor for a given depreciation period and cost of capital.
///
/// This converts an overnight investment cost into an equivalent annual payment.
pub fn annuity_factor(depreciation: u32, wacc: Dimensionless) -> Dimensionless {
    if depreciation == 0 {
        return Dimensionless(0.0);
    }
    if wacc == Dimensionless(0.0) {
        return Dimensionless(1.0) / Dimensionless(depreciation as f64);
    }
    let factor = (Dimensionless(1.0) + wacc).powi(depreciation as i32);
    (wacc * factor) / (factor - Dimensionless(1.0))
}
