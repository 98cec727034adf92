//! Supply arithmetic and display helpers

use crate::apr::{average_month_days, MONTHS_PER_YEAR};
use crate::decimal::{parse_int, Dec};
use crate::error::{EconomicsError, Result};
use crate::constants::ONE_TOKEN;
use num_bigint::BigInt;

/// Whole tokens in a base-unit amount, truncated, as text
///
/// `"1234567890123456789000"` becomes `"1234"`.
pub fn format_supply(base_units: &str) -> Result<String> {
    let amount = parse_int(base_units)?;
    Ok((amount / BigInt::from(ONE_TOKEN)).to_string())
}

/// Days in the year used to annualize a window: twelve average months
pub fn days_per_year() -> Dec {
    average_month_days().mul_int64(MONTHS_PER_YEAR)
}

/// Yearly inflation implied by `minted` base units over `period_days` days
///
/// The window is scaled to [`days_per_year`], so an average month is
/// multiplied by exactly 12.
pub fn annualized_inflation(minted: &BigInt, period_days: &Dec, circulating: &BigInt) -> Result<Dec> {
    if !period_days.is_positive() {
        return Err(EconomicsError::DivisionByZero("period days"));
    }
    let circulating = Dec::from_integer(circulating);
    if !circulating.is_positive() {
        return Err(EconomicsError::DivisionByZero("circulating supply"));
    }
    Dec::from_integer(minted)
        .mul(&days_per_year())
        .quo(period_days)?
        .quo(&circulating)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minting::{MintGenesisState, MintedSupplyCalculator};

    #[test]
    fn test_format_supply() {
        assert_eq!(format_supply("1234567890123456789000").unwrap(), "1234");
        assert_eq!(format_supply("999999999999999999").unwrap(), "0");
        assert_eq!(format_supply("1000000000000000000").unwrap(), "1");
        assert!(format_supply("12.5").is_err());
        assert!(format_supply("").is_err());
    }

    #[test]
    fn test_annualized_inflation() {
        let one_pct_month = BigInt::from(1_000u32);
        let month = average_month_days();
        let rate = annualized_inflation(&one_pct_month, &month, &BigInt::from(100_000u32)).unwrap();
        assert_eq!(rate.to_string(), "0.120000000000000000");

        assert!(annualized_inflation(&one_pct_month, &month, &BigInt::from(0)).is_err());
        assert!(annualized_inflation(&one_pct_month, &Dec::zero(), &BigInt::from(1)).is_err());
    }

    #[test]
    fn test_days_per_year() {
        assert_eq!(days_per_year().to_string(), "365.160000000000000000");
    }

    #[test]
    fn test_inflation_independent_of_window() {
        let calc = MintedSupplyCalculator::default();
        let genesis = MintGenesisState::new(Dec::zero(), 17280).unwrap();
        let circulating = BigInt::from(10u32).pow(27);

        let rate = |days: &str| {
            let days: Dec = days.parse().unwrap();
            let minted = calc.minted_tokens_since(&genesis, 1, 1, &days);
            annualized_inflation(&minted, &days, &circulating).unwrap()
        };

        let day = rate("1");
        let week = rate("7");
        let month = rate("30.43");

        // the minting rate decays by well under 1% over the first month
        for other in [&week, &month] {
            let drift = day.sub(other).quo(&day).unwrap();
            assert!(drift.is_positive() || drift.is_zero());
            assert!(drift < "0.01".parse().unwrap(), "{} vs {}", day, other);
        }
        assert!(month > "0.3".parse().unwrap() && month < "0.4".parse().unwrap());
    }
}
