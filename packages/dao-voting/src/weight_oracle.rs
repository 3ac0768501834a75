//! Read-only interface the token ledger exposes as a voting weight oracle.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

#[cw_serde]
pub enum QueryMsg {
    /// Total eligible voting weight at the current block
    TotalVotingWeight {},
    /// Voting weight of `address` as of `block_height`
    VotingWeightAt { address: String, block_height: u64 },
}

#[cw_serde]
pub struct VotingWeightResponse {
    pub weight: Uint128,
}
