//! # Minting Curve
//!
//! The mint rate follows a cubic curve over *normalized time*, a progress
//! variable that runs from 0 at genesis to 10 at the end of emissions.
//! Its antiderivative gives the cumulative amount minted, in millions of
//! whole tokens:
//!
//! ```text
//! F(t) = 0.6·t³ − 26.5·t² + 358·t
//!
//! F(0)     =    0
//! F(10)    = 1530     (emissions stop here)
//! F(10.48) ≈ 1531.95  (extremum, decreasing afterwards)
//! ```
//!
//! One block advances normalized time by `10 / (blocks_per_day · 3652)`,
//! i.e. the schedule spans 3652 days assuming one block every 5 seconds.
//! Chains producing blocks more slowly keep minting past the 10-year mark.

use crate::decimal::Dec;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// Coefficients and horizon of the minting curve
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveConstants {
    /// Coefficient of t³
    pub cubic: Dec,
    /// Coefficient of t² (subtracted)
    pub quadratic: Dec,
    /// Coefficient of t
    pub linear: Dec,
    /// Normalized time after which nothing is minted
    pub final_norm_time_passed: Dec,
    /// Length of the emission schedule in days
    pub total_days: i64,
    /// Curve output is in millions of whole tokens; 10^24 converts it to base units
    pub scale_exponent: u32,
}

impl Default for CurveConstants {
    fn default() -> Self {
        Self {
            cubic: Dec::from_raw(BigInt::from(600_000_000_000_000_000u64)),
            quadratic: Dec::from_raw(BigInt::from(26_500_000_000_000_000_000u128)),
            linear: Dec::from_int(358),
            final_norm_time_passed: Dec::from_int(10),
            total_days: 3652,
            scale_exponent: 24,
        }
    }
}

/// Minting curve bound to a fixed set of constants
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MintCurve {
    constants: CurveConstants,
}

impl MintCurve {
    pub fn new(constants: CurveConstants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &CurveConstants {
        &self.constants
    }

    /// Normalized time at which emissions stop
    pub fn cap(&self) -> &Dec {
        &self.constants.final_norm_time_passed
    }

    /// Cumulative mint `F(t)` in millions of whole tokens
    pub fn integral(&self, t: &Dec) -> Dec {
        let c = &self.constants;
        c.cubic
            .mul(&t.power(3))
            .sub(&c.quadratic.mul(&t.power(2)))
            .add(&c.linear.mul(t))
    }

    /// `F(min(t, cap))`
    pub fn capped_integral(&self, t: &Dec) -> Dec {
        self.integral(&t.clone().min(self.cap().clone()))
    }

    /// Normalized-time delta contributed by a single block
    ///
    /// Returns zero for a non-positive `blocks_per_day`; callers validate it
    /// through [`crate::minting::MintGenesisState`].
    pub fn normalized_increment(&self, blocks_per_day: i64) -> Dec {
        let total_blocks = BigInt::from(blocks_per_day) * BigInt::from(self.constants.total_days);
        match Dec::one().quo_int(&total_blocks) {
            Ok(step) => step.mul(self.cap()),
            Err(_) => Dec::zero(),
        }
    }

    /// Multiplier converting curve output into base-denomination units
    pub fn unit_scale(&self) -> BigInt {
        BigInt::from(10u32).pow(self.constants.scale_exponent)
    }
}
