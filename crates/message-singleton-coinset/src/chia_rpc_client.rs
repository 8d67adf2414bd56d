use chia_protocol::{Bytes32, SpendBundle};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;

use super::{
    GetCoinRecordResponse, GetCoinRecordsResponse, GetPuzzleAndSolutionResponse, PushTxResponse,
};

/// The subset of the full node RPC needed to follow and extend a singleton lineage.
pub trait ChiaRpcClient {
    type Error;

    fn base_url(&self) -> &str;

    fn make_post_request<R, B>(
        &self,
        endpoint: &str,
        body: B,
    ) -> impl Future<Output = Result<R, Self::Error>>
    where
        B: Serialize + Send,
        R: DeserializeOwned + Send;

    fn get_coin_record_by_name(
        &self,
        name: Bytes32,
    ) -> impl Future<Output = Result<GetCoinRecordResponse, Self::Error>> {
        self.make_post_request(
            "get_coin_record_by_name",
            serde_json::json!({
                "name": format!("0x{}", hex::encode(name.to_bytes())),
            }),
        )
    }

    fn get_coin_records_by_parent_ids(
        &self,
        parent_ids: Vec<Bytes32>,
        start_height: Option<u32>,
        end_height: Option<u32>,
        include_spent_coins: Option<bool>,
    ) -> impl Future<Output = Result<GetCoinRecordsResponse, Self::Error>> {
        self.make_post_request(
            "get_coin_records_by_parent_ids",
            serde_json::json!({
                "parent_ids": parent_ids.iter().map(|parent_id| format!("0x{}", hex::encode(parent_id.to_bytes()))).collect::<Vec<String>>(),
                "start_height": start_height,
                "end_height": end_height,
                "include_spent_coins": include_spent_coins,
            }),
        )
    }

    fn get_puzzle_and_solution(
        &self,
        coin_id: Bytes32,
        height: Option<u32>,
    ) -> impl Future<Output = Result<GetPuzzleAndSolutionResponse, Self::Error>> {
        self.make_post_request(
            "get_puzzle_and_solution",
            serde_json::json!({
                "coin_id": format!("0x{}", hex::encode(coin_id.to_bytes())),
                "height": height,
            }),
        )
    }

    fn push_tx(
        &self,
        spend_bundle: SpendBundle,
    ) -> impl Future<Output = Result<PushTxResponse, Self::Error>> {
        self.make_post_request(
            "push_tx",
            serde_json::json!({
                "spend_bundle": {
                    "coin_spends": spend_bundle.coin_spends.iter().map(|coin_spend| {
                        serde_json::json!({
                            "coin": {
                                "amount": coin_spend.coin.amount,
                                "parent_coin_info": format!("0x{}", hex::encode(coin_spend.coin.parent_coin_info.to_bytes())),
                                "puzzle_hash": format!("0x{}", hex::encode(coin_spend.coin.puzzle_hash.to_bytes())),
                            },
                            "puzzle_reveal": format!("0x{}", hex::encode(coin_spend.puzzle_reveal.to_vec())),
                            "solution": format!("0x{}", hex::encode(coin_spend.solution.to_vec())),
                        })
                    }).collect::<Vec<serde_json::Value>>(),
                    "aggregated_signature": format!("0x{}", hex::encode(spend_bundle.aggregated_signature.to_bytes())),
                }
            }),
        )
    }
}
