//! Bank supply and balances over the legacy REST API

use super::Endpoint;
use crate::error::{Result, StatsError};
use crate::query::{BankQuery, Coin, TotalSupply};
use async_trait::async_trait;
use num_bigint::BigInt;
use serde::Deserialize;

/// `/bank/total` and `/bank/balances/{address}` at a height
#[derive(Clone, Debug)]
pub struct BankRestClient {
    endpoint: Endpoint,
}

#[derive(Deserialize)]
struct TotalSupplyResult {
    result: TotalSupply,
}

#[derive(Deserialize)]
struct BalanceResult {
    #[serde(default)]
    result: Vec<Coin>,
}

impl BankRestClient {
    pub fn new(rest_address: &str, client: reqwest::Client) -> Self {
        Self {
            endpoint: Endpoint::new(rest_address, client),
        }
    }

    fn at_height(&self, path: &str, height: i64) -> reqwest::RequestBuilder {
        self.endpoint
            .client()
            .get(self.endpoint.url(path))
            .query(&[("height", height)])
    }
}

/// Pick `denom` out of a balance listing
///
/// An account with no coins at all holds zero; one that holds other coins
/// but not `denom` is reported as an error.
fn select_balance(coins: &[Coin], address: &str, denom: &str) -> Result<BigInt> {
    if coins.is_empty() {
        return Ok(BigInt::default());
    }
    match coins.iter().find(|coin| coin.denom == denom) {
        Some(coin) => coin.amount(),
        None => Err(StatsError::DenomNotFound {
            denom: denom.to_string(),
            context: format!("balances of {}", address),
        }),
    }
}

#[async_trait]
impl BankQuery for BankRestClient {
    async fn total_supply(&self, height: i64) -> Result<TotalSupply> {
        let request = self.at_height("/bank/total", height);
        let response: TotalSupplyResult = self.endpoint.json("bank total supply", request).await?;
        Ok(response.result)
    }

    async fn balance(&self, height: i64, address: &str, denom: &str) -> Result<BigInt> {
        let request = self.at_height(&format!("/bank/balances/{}", address), height);
        let response: BalanceResult = self.endpoint.json("bank balances", request).await?;
        select_balance(&response.result, address, denom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_supply_shape() {
        let json = r#"{"height":"5","result":{"supply":[{"denom":"acudos","amount":"99"}],"pagination":{"next_key":null,"total":"1"}}}"#;
        let response: TotalSupplyResult = serde_json::from_str(json).unwrap();
        assert_eq!(response.result.supply, vec![Coin::new("acudos", 99)]);
    }

    #[test]
    fn test_select_balance() {
        assert_eq!(select_balance(&[], "cudos1x", "acudos").unwrap(), BigInt::from(0));

        let coins = vec![Coin::new("ibc/XYZ", 3), Coin::new("acudos", 42)];
        assert_eq!(select_balance(&coins, "cudos1x", "acudos").unwrap(), BigInt::from(42));

        let others = vec![Coin::new("ibc/XYZ", 3)];
        assert!(matches!(
            select_balance(&others, "cudos1x", "acudos"),
            Err(StatsError::DenomNotFound { .. })
        ));
    }
}
