use chia_protocol::{Bytes32, Coin};
use clvm_traits::ToClvm;
use clvmr::Allocator;
use message_singleton_coinset::Ledger;
use message_singleton_types::Conditions;
use tracing::info;

use crate::{sync, DriverError, SingletonConfig, SingletonState, SpendContext, Wallet};

/// Launches and updates a message singleton, funding fees from a wallet and submitting to a ledger.
#[derive(Debug, Clone)]
pub struct MessageSingletonClient<L, W> {
    ledger: L,
    wallet: W,
    config: SingletonConfig,
}

impl<L, W> MessageSingletonClient<L, W>
where
    L: Ledger,
    W: Wallet,
{
    pub fn new(ledger: L, wallet: W, config: SingletonConfig) -> Self {
        Self {
            ledger,
            wallet,
            config,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn config(&self) -> &SingletonConfig {
        &self.config
    }

    /// Creates a new lineage holding `initial_message` and returns its state once submitted.
    pub async fn launch<M>(&self, initial_message: M) -> Result<SingletonState, DriverError>
    where
        M: ToClvm<Allocator>,
    {
        let mut ctx = SpendContext::new(self.config.templates.clone());

        let total = self
            .config
            .amount
            .checked_add(self.config.fee)
            .ok_or_else(|| DriverError::Wallet("launch amount plus fee overflows".into()))?;
        let coin = self.select_coin(total).await?;

        let (conditions, state) = SingletonState::launch(
            &mut ctx,
            coin.coin_id(),
            self.config.amount,
            initial_message,
        )?;

        let conditions = self.with_change(conditions, coin)?;
        self.wallet.spend_coin(&mut ctx, coin, conditions)?;

        self.submit(ctx).await?;

        info!("launched singleton {}", state.launcher_id);

        Ok(state)
    }

    /// Syncs to the current tip of the lineage.
    pub async fn sync(&self, launcher_id: Bytes32) -> Result<SingletonState, DriverError> {
        let mut ctx = SpendContext::new(self.config.templates.clone());
        sync(&self.ledger, &mut ctx, launcher_id).await
    }

    /// Replaces the message of the lineage and returns the expected state of the new tip.
    pub async fn set_message<M>(
        &self,
        launcher_id: Bytes32,
        new_message: M,
    ) -> Result<SingletonState, DriverError>
    where
        M: ToClvm<Allocator>,
    {
        let mut ctx = SpendContext::new(self.config.templates.clone());

        let state = sync(&self.ledger, &mut ctx, launcher_id).await?;
        let child = state.set_message(&mut ctx, new_message, state.coin.amount)?;

        if self.config.fee > 0 {
            let coin = self.select_coin(self.config.fee).await?;
            let conditions = self.with_change(Conditions::new(), coin)?;
            self.wallet.spend_coin(&mut ctx, coin, conditions)?;
        }

        self.submit(ctx).await?;

        info!(
            "updated singleton {} with new coin {}",
            launcher_id,
            child.coin.coin_id()
        );

        Ok(child)
    }

    async fn select_coin(&self, amount: u64) -> Result<Coin, DriverError> {
        self.wallet
            .select_coin(amount)
            .await
            .map_err(|error| DriverError::Wallet(Box::new(error)))
    }

    /// Reserves the fee and sends whatever `coin` has left over back to the wallet.
    fn with_change(&self, conditions: Conditions, coin: Coin) -> Result<Conditions, DriverError> {
        let needed = conditions
            .output_amount()
            .checked_add(conditions.reserved_fee())
            .and_then(|amount| amount.checked_add(self.config.fee))
            .ok_or_else(|| DriverError::Wallet("spent amount plus fee overflows".into()))?;

        let Some(change) = coin.amount.checked_sub(needed) else {
            return Err(DriverError::Wallet(
                format!(
                    "coin {} has {} mojos but {needed} are needed",
                    coin.coin_id(),
                    coin.amount
                )
                .into(),
            ));
        };

        let mut conditions = conditions;

        if change > 0 {
            conditions = conditions.create_coin(self.wallet.change_puzzle_hash(), change);
        }

        if self.config.fee > 0 {
            conditions = conditions.reserve_fee(self.config.fee);
        }

        Ok(conditions)
    }

    async fn submit(&self, mut ctx: SpendContext) -> Result<(), DriverError> {
        let spend_bundle = self
            .wallet
            .sign(ctx.take(), self.config.genesis_challenge)
            .await
            .map_err(|error| DriverError::Wallet(Box::new(error)))?;

        let status = self.ledger.submit_spend_bundle(spend_bundle).await?;

        info!("submitted spend bundle with status {status}");

        Ok(())
    }
}
