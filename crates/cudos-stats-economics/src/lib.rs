//! # Cudos Stats Economics - Minting Curve & Staking Yield
//!
//! Pure economic model behind the Cudos network statistics service. Nothing
//! here performs I/O; the service crate feeds chain data in and caches what
//! comes out.
//!
//! ## Key Features
//!
//! - **Fixed-point decimals**: 18-digit `Dec` with the chain's rounding rules
//! - **Minting curve**: cubic emission model over normalized time
//! - **Minted supply**: block-by-block integration over a period
//! - **APR**: monthly minting annualized against bonded stake
//!
//! ## Emission Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     CUDOS MINTING CURVE                             │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  Normalized time:   0 ──────────────────────────────────▶ 10        │
//! │  Horizon:           3652 days at one block every 5 seconds          │
//! │  Cumulative mint:   F(t) = 0.6·t³ − 26.5·t² + 358·t  (millions)     │
//! │  Total emission:    F(10) = 1530 million CUDOS                      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Quantity | Formula |
//! |----------|---------|
//! | Per-block step | `10 / (blocks_per_day · 3652)` |
//! | Minted per block | `(F(t + step) − F(t)) · 10^24` acudos |
//! | APR | `minted_month / bonded · 12 · (1 − community_tax)` |
//! | Inflation | `minted_window · (365.16 / window_days) / circulating` |

pub mod apr;
pub mod curve;
pub mod decimal;
pub mod error;
pub mod minting;
pub mod supply;

// Re-exports
pub use apr::{annualize, average_month_days, AprCalculator, AprOutcome, MONTHS_PER_YEAR};
pub use curve::{CurveConstants, MintCurve};
pub use decimal::{parse_int, Dec, PRECISION};
pub use error::{EconomicsError, Result};
pub use minting::{MintGenesisState, MintedSupplyCalculator};
pub use supply::{annualized_inflation, days_per_year, format_supply};

/// CUDOS token constants
pub mod constants {
    /// Base denomination on the Cosmos side
    pub const BASE_DENOM: &str = "acudos";

    /// Decimal places of the base denomination
    pub const DECIMALS: u32 = 18;

    /// One CUDOS in base units
    pub const ONE_TOKEN: u128 = 1_000_000_000_000_000_000; // 10^18

    /// Historical non-circulating amount subtracted under the fixed-offset policy, in whole tokens
    pub const FIXED_SUPPLY_OFFSET_TOKENS: u64 = 1_942_421_346;

    /// ERC-20 maximum supply: 10 billion CUDOS in base units
    pub const ETH_MAX_SUPPLY: u128 = 10_000_000_000 * ONE_TOKEN;

    /// Inflation reported when the fixed inflation mode is selected
    pub const DEFAULT_FIXED_INFLATION: &str = "0.01";

    /// Tendermint blocks per day at one block every 5 seconds
    pub const DEFAULT_BLOCKS_PER_DAY: i64 = 17_280;
}
