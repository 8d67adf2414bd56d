use chia_protocol::Bytes32;
use chia_sha2::Sha256;
use clvm_traits::{
    apply_constants, ClvmDecoder, ClvmEncoder, FromClvm, FromClvmError, ToClvm, ToClvmError,
};

#[derive(ToClvm, FromClvm)]
#[apply_constants]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[clvm(list)]
pub struct CreateCoin {
    #[clvm(constant = 51)]
    pub opcode: u8,
    pub puzzle_hash: Bytes32,
    pub amount: u64,
}

impl CreateCoin {
    pub fn new(puzzle_hash: Bytes32, amount: u64) -> Self {
        Self {
            puzzle_hash,
            amount,
        }
    }
}

#[derive(ToClvm, FromClvm)]
#[apply_constants]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[clvm(list)]
pub struct ReserveFee {
    #[clvm(constant = 52)]
    pub opcode: u8,
    pub amount: u64,
}

impl ReserveFee {
    pub fn new(amount: u64) -> Self {
        Self { amount }
    }
}

#[derive(ToClvm, FromClvm)]
#[apply_constants]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[clvm(list)]
pub struct AssertCoinAnnouncement {
    #[clvm(constant = 61)]
    pub opcode: u8,
    pub announcement_id: Bytes32,
}

impl AssertCoinAnnouncement {
    pub fn new(announcement_id: Bytes32) -> Self {
        Self { announcement_id }
    }
}

/// The id of a coin announcement is the hash of the announcing coin's id and the message.
pub fn announcement_id(coin_id: Bytes32, message: impl AsRef<[u8]>) -> Bytes32 {
    let mut hasher = Sha256::new();
    hasher.update(coin_id);
    hasher.update(message);
    Bytes32::new(hasher.finalize())
}

/// The conditions used to fund and link the spends built here.
#[derive(Debug, Clone, PartialEq, Eq, ToClvm, FromClvm)]
#[clvm(transparent)]
pub enum Condition {
    CreateCoin(CreateCoin),
    ReserveFee(ReserveFee),
    AssertCoinAnnouncement(AssertCoinAnnouncement),
}

impl From<CreateCoin> for Condition {
    fn from(value: CreateCoin) -> Self {
        Self::CreateCoin(value)
    }
}

impl From<ReserveFee> for Condition {
    fn from(value: ReserveFee) -> Self {
        Self::ReserveFee(value)
    }
}

impl From<AssertCoinAnnouncement> for Condition {
    fn from(value: AssertCoinAnnouncement) -> Self {
        Self::AssertCoinAnnouncement(value)
    }
}

/// An ordered list of conditions, built up fluently.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[must_use]
pub struct Conditions {
    conditions: Vec<Condition>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter()
    }

    pub fn with(mut self, condition: impl Into<Condition>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn extend(mut self, conditions: impl IntoIterator<Item = impl Into<Condition>>) -> Self {
        self.conditions.extend(conditions.into_iter().map(Into::into));
        self
    }

    pub fn create_coin(self, puzzle_hash: Bytes32, amount: u64) -> Self {
        self.with(CreateCoin::new(puzzle_hash, amount))
    }

    pub fn reserve_fee(self, amount: u64) -> Self {
        self.with(ReserveFee::new(amount))
    }

    pub fn assert_coin_announcement(self, coin_id: Bytes32, message: impl AsRef<[u8]>) -> Self {
        self.with(AssertCoinAnnouncement::new(announcement_id(coin_id, message)))
    }

    /// The sum of every coin created by these conditions.
    pub fn output_amount(&self) -> u64 {
        self.conditions
            .iter()
            .filter_map(|condition| match condition {
                Condition::CreateCoin(create_coin) => Some(create_coin.amount),
                _ => None,
            })
            .sum()
    }

    /// The sum of every reserved fee.
    pub fn reserved_fee(&self) -> u64 {
        self.conditions
            .iter()
            .filter_map(|condition| match condition {
                Condition::ReserveFee(reserve_fee) => Some(reserve_fee.amount),
                _ => None,
            })
            .sum()
    }
}

impl IntoIterator for Conditions {
    type Item = Condition;
    type IntoIter = std::vec::IntoIter<Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.conditions.into_iter()
    }
}

impl<E> ToClvm<E> for Conditions
where
    E: ClvmEncoder,
    Condition: ToClvm<E>,
{
    fn to_clvm(&self, encoder: &mut E) -> Result<E::Node, ToClvmError> {
        self.conditions.to_clvm(encoder)
    }
}

impl<D> FromClvm<D> for Conditions
where
    D: ClvmDecoder,
    Condition: FromClvm<D>,
{
    fn from_clvm(decoder: &D, node: D::Node) -> Result<Self, FromClvmError> {
        Ok(Self {
            conditions: Vec::from_clvm(decoder, node)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use clvmr::{serde::node_to_bytes, Allocator};
    use hex_literal::hex;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_conditions_round_trip() -> anyhow::Result<()> {
        let mut allocator = Allocator::new();

        let conditions = Conditions::new()
            .create_coin(Bytes32::new([1; 32]), 1)
            .reserve_fee(50)
            .assert_coin_announcement(Bytes32::new([2; 32]), [4u8, 5, 6]);

        let ptr = conditions.to_clvm(&mut allocator)?;
        assert_eq!(Conditions::from_clvm(&allocator, ptr)?, conditions);

        Ok(())
    }

    #[test]
    fn test_create_coin_serialization() -> anyhow::Result<()> {
        let mut allocator = Allocator::new();
        let ptr = CreateCoin::new(Bytes32::new([0; 32]), 1).to_clvm(&mut allocator)?;

        assert_eq!(
            hex::encode(node_to_bytes(&allocator, ptr)?),
            concat!(
                "ff33ffa0",
                "0000000000000000000000000000000000000000000000000000000000000000",
                "ff0180"
            )
        );

        Ok(())
    }

    #[test]
    fn test_announcement_id() {
        let coin_id = Bytes32::new([0; 32]);

        let mut hasher = Sha256::new();
        hasher.update([0u8; 32]);
        hasher.update(hex!("cafe"));

        assert_eq!(
            announcement_id(coin_id, hex!("cafe")),
            Bytes32::new(hasher.finalize())
        );
        assert_ne!(
            announcement_id(coin_id, hex!("cafe")),
            announcement_id(coin_id, hex!("beef"))
        );
    }

    #[rstest]
    #[case(Conditions::new(), 0, 0)]
    #[case(Conditions::new().create_coin(Bytes32::default(), 3).create_coin(Bytes32::default(), 4), 7, 0)]
    #[case(Conditions::new().create_coin(Bytes32::default(), 1).reserve_fee(9), 1, 9)]
    fn test_totals(#[case] conditions: Conditions, #[case] output: u64, #[case] fee: u64) {
        assert_eq!(conditions.output_amount(), output);
        assert_eq!(conditions.reserved_fee(), fee);
    }
}
