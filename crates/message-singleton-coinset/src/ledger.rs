use std::{error::Error, future::Future};

use chia_protocol::{Bytes32, CoinSpend, SpendBundle};
use thiserror::Error;
use tracing::warn;

use crate::{ChiaRpcClient, CoinRecord};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("transport error: {0}")]
    Transport(Box<dyn Error + Send + Sync>),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("no spend recorded for coin {0} at height {1}")]
    MissingSpend(Bytes32, u32),

    #[error("spend bundle rejected: {0}")]
    Rejected(String),
}

/// The queries a singleton lineage needs from the chain.
pub trait Ledger {
    /// Every coin created by one of the given parents.
    fn coin_records_by_parent_ids(
        &self,
        parent_ids: Vec<Bytes32>,
        include_spent: bool,
    ) -> impl Future<Output = Result<Vec<CoinRecord>, LedgerError>>;

    /// Returns `None` when the ledger has never seen the coin.
    fn coin_record_by_id(
        &self,
        coin_id: Bytes32,
    ) -> impl Future<Output = Result<Option<CoinRecord>, LedgerError>>;

    /// The puzzle reveal and solution the coin was spent with.
    fn spend_record(
        &self,
        coin_id: Bytes32,
        spent_height: u32,
    ) -> impl Future<Output = Result<CoinSpend, LedgerError>>;

    /// Returns the status reported by the ledger.
    fn submit_spend_bundle(
        &self,
        spend_bundle: SpendBundle,
    ) -> impl Future<Output = Result<String, LedgerError>>;
}

impl<T> Ledger for &T
where
    T: Ledger,
{
    fn coin_records_by_parent_ids(
        &self,
        parent_ids: Vec<Bytes32>,
        include_spent: bool,
    ) -> impl Future<Output = Result<Vec<CoinRecord>, LedgerError>> {
        (**self).coin_records_by_parent_ids(parent_ids, include_spent)
    }

    fn coin_record_by_id(
        &self,
        coin_id: Bytes32,
    ) -> impl Future<Output = Result<Option<CoinRecord>, LedgerError>> {
        (**self).coin_record_by_id(coin_id)
    }

    fn spend_record(
        &self,
        coin_id: Bytes32,
        spent_height: u32,
    ) -> impl Future<Output = Result<CoinSpend, LedgerError>> {
        (**self).spend_record(coin_id, spent_height)
    }

    fn submit_spend_bundle(
        &self,
        spend_bundle: SpendBundle,
    ) -> impl Future<Output = Result<String, LedgerError>> {
        (**self).submit_spend_bundle(spend_bundle)
    }
}

/// Serves ledger queries from any RPC client.
#[derive(Debug, Clone)]
pub struct RpcLedger<C> {
    client: C,
}

impl<C> RpcLedger<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

fn transport<E>(error: E) -> LedgerError
where
    E: Error + Send + Sync + 'static,
{
    LedgerError::Transport(Box::new(error))
}

fn rpc_error(error: Option<String>) -> LedgerError {
    LedgerError::Rpc(error.unwrap_or_else(|| "unknown error".to_string()))
}

impl<C> Ledger for RpcLedger<C>
where
    C: ChiaRpcClient,
    C::Error: Error + Send + Sync + 'static,
{
    async fn coin_records_by_parent_ids(
        &self,
        parent_ids: Vec<Bytes32>,
        include_spent: bool,
    ) -> Result<Vec<CoinRecord>, LedgerError> {
        let response = self
            .client
            .get_coin_records_by_parent_ids(parent_ids, None, None, Some(include_spent))
            .await
            .map_err(transport)?;

        if !response.success {
            return Err(rpc_error(response.error));
        }

        Ok(response.coin_records.unwrap_or_default())
    }

    async fn coin_record_by_id(&self, coin_id: Bytes32) -> Result<Option<CoinRecord>, LedgerError> {
        let response = self
            .client
            .get_coin_record_by_name(coin_id)
            .await
            .map_err(transport)?;

        if response.success {
            return Ok(response.coin_record);
        }

        match response.error {
            Some(error) if error.contains("not found") => Ok(None),
            error => Err(rpc_error(error)),
        }
    }

    async fn spend_record(
        &self,
        coin_id: Bytes32,
        spent_height: u32,
    ) -> Result<CoinSpend, LedgerError> {
        let response = self
            .client
            .get_puzzle_and_solution(coin_id, Some(spent_height))
            .await
            .map_err(transport)?;

        if !response.success {
            return Err(rpc_error(response.error));
        }

        response
            .coin_solution
            .ok_or(LedgerError::MissingSpend(coin_id, spent_height))
    }

    async fn submit_spend_bundle(&self, spend_bundle: SpendBundle) -> Result<String, LedgerError> {
        let response = self
            .client
            .push_tx(spend_bundle)
            .await
            .map_err(transport)?;

        if !response.success {
            let reason = response
                .error
                .unwrap_or_else(|| "unknown error".to_string());
            warn!("spend bundle rejected: {reason}");
            return Err(LedgerError::Rejected(reason));
        }

        Ok(response.status.unwrap_or_else(|| "SUCCESS".to_string()))
    }
}
