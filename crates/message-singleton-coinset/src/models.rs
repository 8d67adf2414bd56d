use chia_protocol::CoinSpend;
use serde::Deserialize;

use crate::CoinRecord;

#[derive(Deserialize, Debug, Clone)]
pub struct GetCoinRecordResponse {
    pub coin_record: Option<CoinRecord>,
    pub error: Option<String>,
    pub success: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GetCoinRecordsResponse {
    pub coin_records: Option<Vec<CoinRecord>>,
    pub error: Option<String>,
    pub success: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GetPuzzleAndSolutionResponse {
    pub coin_solution: Option<CoinSpend>,
    pub error: Option<String>,
    pub success: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PushTxResponse {
    pub status: Option<String>,
    pub error: Option<String>,
    pub success: bool,
}
