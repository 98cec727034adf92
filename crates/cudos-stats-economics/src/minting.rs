//! # Minted Supply
//!
//! Integrates the minting curve block by block to find how many base units
//! the chain mints over a period.
//!
//! ```text
//! genesis t0 ──fast-forward (to − from blocks)──▶ t ──period blocks──▶ t + n·inc
//!                                                   Σ trunc((F(t+inc) − F(t)) · 10^24)
//! ```
//!
//! Every block's contribution is truncated on its own so rounding stays
//! local to the block, and `F` is evaluated at `min(t, cap)` so the final
//! block before the cap only mints up to the cap.

use crate::curve::MintCurve;
use crate::decimal::{parse_int, Dec};
use crate::error::{EconomicsError, Result};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

/// Position of the chain on the minting curve
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintGenesisState {
    /// Normalized time already elapsed at the reference height
    pub norm_time_passed: Dec,
    /// Expected blocks per day
    pub blocks_per_day: i64,
}

impl MintGenesisState {
    /// Create a validated genesis state
    pub fn new(norm_time_passed: Dec, blocks_per_day: i64) -> Result<Self> {
        if norm_time_passed.is_negative() {
            return Err(EconomicsError::InvalidGenesis {
                name: "norm_time_passed",
                reason: format!("must not be negative, got {}", norm_time_passed),
            });
        }
        if blocks_per_day <= 0 {
            return Err(EconomicsError::InvalidGenesis {
                name: "blocks_per_day",
                reason: format!("must be positive, got {}", blocks_per_day),
            });
        }
        if MintCurve::default().normalized_increment(blocks_per_day).is_zero() {
            return Err(EconomicsError::InvalidGenesis {
                name: "blocks_per_day",
                reason: format!("increment must be positive, {} blocks per day is too many", blocks_per_day),
            });
        }

        Ok(Self {
            norm_time_passed,
            blocks_per_day,
        })
    }

    /// Parse the textual form used in configuration files
    pub fn parse(norm_time_passed: &str, blocks_per_day: &str) -> Result<Self> {
        let norm_time_passed: Dec = norm_time_passed.parse()?;
        let blocks_per_day = parse_int(blocks_per_day)?;
        let blocks_per_day = i64::try_from(blocks_per_day).map_err(|e| EconomicsError::InvalidGenesis {
            name: "blocks_per_day",
            reason: e.to_string(),
        })?;
        Self::new(norm_time_passed, blocks_per_day)
    }
}

/// Computes minted amounts from a [`MintCurve`]
#[derive(Clone, Debug, Default)]
pub struct MintedSupplyCalculator {
    curve: MintCurve,
}

impl MintedSupplyCalculator {
    pub fn new(curve: MintCurve) -> Self {
        Self { curve }
    }

    pub fn curve(&self) -> &MintCurve {
        &self.curve
    }

    /// Whether the genesis state already sits past the end of emissions
    pub fn is_exhausted(&self, genesis: &MintGenesisState) -> bool {
        genesis.norm_time_passed > *self.curve.cap()
    }

    /// Normalized time after advancing one increment per block in `from_height..to_height`
    pub fn advance(&self, genesis: &MintGenesisState, from_height: i64, to_height: i64) -> Dec {
        let blocks = (to_height - from_height).max(0);
        let increment = self.curve.normalized_increment(genesis.blocks_per_day);
        genesis.norm_time_passed.add(&increment.mul_int64(blocks))
    }

    /// Base units minted during `period_days` days starting at `to_height`,
    /// given that the chain was at `genesis` when it reached `from_height`
    pub fn minted_tokens_since(
        &self,
        genesis: &MintGenesisState,
        from_height: i64,
        to_height: i64,
        period_days: &Dec,
    ) -> BigInt {
        if self.is_exhausted(genesis) {
            return BigInt::zero();
        }

        let cap = self.curve.cap();
        let increment = self.curve.normalized_increment(genesis.blocks_per_day);
        let unit_scale = self.curve.unit_scale();
        let total_blocks = Dec::from_int(genesis.blocks_per_day).mul(period_days).truncate_int();
        let total_blocks = if total_blocks.is_negative() {
            0
        } else {
            total_blocks.to_u64().unwrap_or(u64::MAX)
        };

        let mut t = self.advance(genesis, from_height, to_height);
        let mut previous = self.curve.capped_integral(&t);
        let mut minted = BigInt::zero();
        let mut blocks = 0u64;

        while blocks < total_blocks {
            if t > *cap {
                break;
            }

            let next_t = t.add(&increment);
            let next = self.curve.capped_integral(&next_t);
            minted += next.sub(&previous).mul_int(&unit_scale).truncate_int();

            previous = next;
            t = next_t;
            blocks += 1;
        }

        tracing::debug!(
            from_height,
            to_height,
            blocks,
            norm_time_passed = %t,
            minted = %minted,
            "integrated minting curve"
        );

        minted
    }
}
