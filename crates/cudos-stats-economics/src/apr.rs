//! # Staking APR
//!
//! ```text
//! minted   = tokens minted over the next average month (30.43 days)
//! apr      = minted / bonded · 12 · (1 − community_tax)
//! annual   = minted · 12
//! ```
//!
//! The community-tax factor is only applied while it is positive, so a tax
//! of 100% or more leaves the gross figure untouched.

use crate::decimal::Dec;
use crate::error::{EconomicsError, Result};
use crate::minting::{MintGenesisState, MintedSupplyCalculator};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// Months per year used to annualize a monthly figure
pub const MONTHS_PER_YEAR: i64 = 12;

/// Average month length in days (365.25 / 12, rounded)
pub fn average_month_days() -> Dec {
    Dec::from_raw(BigInt::from(30_430_000_000_000_000_000u128))
}

/// Annualized staking yield
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AprOutcome {
    /// Yield paid to stakers
    pub apr: Dec,
    /// Tokens minted over a year at the current rate
    pub annual_provisions: Dec,
    /// Tokens minted over the sampled month
    pub monthly_minted: BigInt,
}

/// Derives APR from the minting curve and staking state
#[derive(Clone, Debug)]
pub struct AprCalculator {
    minted: MintedSupplyCalculator,
    period_days: Dec,
}

impl Default for AprCalculator {
    fn default() -> Self {
        Self::new(MintedSupplyCalculator::default(), average_month_days())
    }
}

impl AprCalculator {
    pub fn new(minted: MintedSupplyCalculator, period_days: Dec) -> Self {
        Self { minted, period_days }
    }

    pub fn minted(&self) -> &MintedSupplyCalculator {
        &self.minted
    }

    pub fn period_days(&self) -> &Dec {
        &self.period_days
    }

    /// APR at `latest_height` for a chain that was at `genesis` at `initial_height`
    pub fn compute_apr(
        &self,
        genesis: &MintGenesisState,
        initial_height: i64,
        latest_height: i64,
        bonded_tokens: &Dec,
        community_tax: &str,
    ) -> Result<AprOutcome> {
        let minted = self
            .minted
            .minted_tokens_since(genesis, initial_height, latest_height, &self.period_days);
        annualize(&minted, bonded_tokens, community_tax)
    }
}

/// Turn one month of minting into APR and annual provisions
pub fn annualize(monthly_minted: &BigInt, bonded_tokens: &Dec, community_tax: &str) -> Result<AprOutcome> {
    if !bonded_tokens.is_positive() {
        return Err(EconomicsError::DivisionByZero("bonded tokens"));
    }
    let community_tax: Dec = community_tax.parse()?;

    let minted = Dec::from_integer(monthly_minted);
    let mut apr = minted.quo(bonded_tokens)?.mul_int64(MONTHS_PER_YEAR);

    let distributed = Dec::one().sub(&community_tax);
    if distributed.is_positive() {
        apr = apr.mul(&distributed);
    }

    Ok(AprOutcome {
        apr,
        annual_provisions: minted.mul_int64(MONTHS_PER_YEAR),
        monthly_minted: monthly_minted.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annualize_with_community_tax() {
        let outcome = annualize(&BigInt::from(10_000), &Dec::from_int(1_000_000), "0.02").unwrap();
        assert_eq!(outcome.apr.to_string(), "0.117600000000000000");
        assert_eq!(outcome.annual_provisions.to_string(), "120000.000000000000000000");
    }

    #[test]
    fn test_full_tax_leaves_gross_apr() {
        let outcome = annualize(&BigInt::from(10_000), &Dec::from_int(1_000_000), "1").unwrap();
        assert_eq!(outcome.apr.to_string(), "0.120000000000000000");
    }

    #[test]
    fn test_annualize_rejects_bad_input() {
        assert_eq!(
            annualize(&BigInt::from(10_000), &Dec::zero(), "0.02"),
            Err(EconomicsError::DivisionByZero("bonded tokens"))
        );
        assert!(matches!(
            annualize(&BigInt::from(10_000), &Dec::from_int(5), "two percent"),
            Err(EconomicsError::InvalidDecimal(_))
        ));
    }

    #[test]
    fn test_compute_apr_exhausted_curve() {
        let calc = AprCalculator::default();
        let genesis = MintGenesisState::new(Dec::from_int(11), 17280).unwrap();
        let outcome = calc
            .compute_apr(&genesis, 1, 1_000, &Dec::from_int(1_000_000), "0.02")
            .unwrap();
        assert!(outcome.apr.is_zero());
        assert!(outcome.annual_provisions.is_zero());
    }

    #[test]
    fn test_average_month() {
        assert_eq!(average_month_days().to_string(), "30.430000000000000000");
    }
}
