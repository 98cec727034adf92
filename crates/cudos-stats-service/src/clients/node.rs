//! Tendermint RPC height source

use super::Endpoint;
use crate::error::{Result, StatsError};
use crate::query::NodeHeight;
use async_trait::async_trait;
use serde::Deserialize;

/// Reads the latest height from `/status`
#[derive(Clone, Debug)]
pub struct TendermintRpcClient {
    endpoint: Endpoint,
}

#[derive(Deserialize)]
struct StatusResponse {
    result: StatusResult,
}

#[derive(Deserialize)]
struct StatusResult {
    sync_info: SyncInfo,
}

#[derive(Deserialize)]
struct SyncInfo {
    latest_block_height: String,
}

impl TendermintRpcClient {
    pub fn new(rpc_address: &str, client: reqwest::Client) -> Self {
        Self {
            endpoint: Endpoint::new(rpc_address, client),
        }
    }
}

fn parse_height(raw: &str) -> Result<i64> {
    raw.parse().map_err(|_| StatsError::MalformedResponse {
        source_name: "tendermint status",
        reason: format!("latest_block_height {:?} is not an integer", raw),
    })
}

#[async_trait]
impl NodeHeight for TendermintRpcClient {
    async fn latest_height(&self) -> Result<i64> {
        let request = self.endpoint.client().get(self.endpoint.url("/status"));
        let status: StatusResponse = self.endpoint.json("tendermint status", request).await?;
        parse_height(&status.result.sync_info.latest_block_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_shape() {
        let json = r#"{"jsonrpc":"2.0","id":-1,"result":{"node_info":{},"sync_info":{"latest_block_height":"4210577","catching_up":false}}}"#;
        let status: StatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parse_height(&status.result.sync_info.latest_block_height).unwrap(), 4_210_577);
        assert!(parse_height("tall").is_err());
    }
}
