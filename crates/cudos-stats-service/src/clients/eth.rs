//! ERC-20 balances over Ethereum JSON-RPC

use super::Endpoint;
use crate::error::{Result, StatsError};
use crate::query::Erc20BalanceQuery;
use async_trait::async_trait;
use num_bigint::BigInt;
use num_traits::Num;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `balanceOf(address)` function selector
const BALANCE_OF_SELECTOR: &str = "70a08231";

/// Token balance reader for a single ERC-20 contract
#[derive(Clone, Debug)]
pub struct EthRpcClient {
    endpoint: Endpoint,
    token_address: String,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl EthRpcClient {
    pub fn new(node: &str, token_address: &str, client: reqwest::Client) -> Result<Self> {
        parse_address(token_address)?;
        Ok(Self {
            endpoint: Endpoint::new(node, client),
            token_address: token_address.to_string(),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<String> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        let request = self.endpoint.client().post(self.endpoint.url("")).json(&body);
        let response: RpcResponse = self.endpoint.json("ethereum rpc", request).await?;

        if let Some(err) = response.error {
            return Err(StatsError::MalformedResponse {
                source_name: "ethereum rpc",
                reason: format!("{} failed with {}: {}", method, err.code, err.message),
            });
        }
        response.result.ok_or_else(|| StatsError::MalformedResponse {
            source_name: "ethereum rpc",
            reason: format!("{} returned no result", method),
        })
    }
}

/// 20-byte address from its `0x` hex form
fn parse_address(address: &str) -> Result<[u8; 20]> {
    let digits = address.strip_prefix("0x").unwrap_or(address);
    let bytes = hex::decode(digits).map_err(|e| StatsError::InvalidParameter {
        name: "eth address",
        reason: format!("{}: {}", address, e),
    })?;
    bytes.try_into().map_err(|_| StatsError::InvalidParameter {
        name: "eth address",
        reason: format!("{} is not 20 bytes", address),
    })
}

/// ABI-encoded `balanceOf(account)` call data
fn balance_of_call_data(account: &str) -> Result<String> {
    let address = parse_address(account)?;
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&address);
    Ok(format!("0x{}{}", BALANCE_OF_SELECTOR, hex::encode(word)))
}

fn parse_quantity(raw: &str) -> Result<BigInt> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.is_empty() {
        return Ok(BigInt::default());
    }
    BigInt::from_str_radix(digits, 16).map_err(|e| StatsError::MalformedResponse {
        source_name: "ethereum rpc",
        reason: format!("{}: {}", raw, e),
    })
}

#[async_trait]
impl Erc20BalanceQuery for EthRpcClient {
    async fn latest_block(&self) -> Result<u64> {
        let raw = self.call("eth_blockNumber", json!([])).await?;
        let digits = raw.strip_prefix("0x").unwrap_or(&raw);
        u64::from_str_radix(digits, 16).map_err(|e| StatsError::MalformedResponse {
            source_name: "ethereum rpc",
            reason: format!("block number {}: {}", raw, e),
        })
    }

    async fn balance_of(&self, account: &str, block: u64) -> Result<BigInt> {
        let call = json!({
            "to": self.token_address,
            "data": balance_of_call_data(account)?,
        });
        let raw = self.call("eth_call", json!([call, format!("0x{:x}", block)])).await?;
        parse_quantity(&raw)
    }
}
