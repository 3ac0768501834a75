//! Messages exchanged between a poll leader and a voting strategy.
//!
//! Every interaction is one-way: a leader sends a `StrategyExecuteMsg` and
//! later receives a `LeaderCallbackMsg` in a separate execution. The JSON shape
//! of each variant equals the variant of the same name in the receiving
//! contract's `ExecuteMsg`, so either enum can be serialized into a `WasmMsg`.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

use crate::types::{VoteOutcome, VoteValue};

/// Sent by a poll leader to the strategy it drives
#[cw_serde]
pub enum StrategyExecuteMsg {
    /// Open a new vote over `total_weight` eligible weight
    Start { total_weight: Uint128 },
    /// Count one ballot
    Vote {
        voter: String,
        weight: Uint128,
        choice: VoteValue,
        vote_id: u64,
    },
    /// Close the vote and report the outcome
    End { vote_id: u64 },
}

/// Sent by a strategy back to its poll leader
#[cw_serde]
pub enum LeaderCallbackMsg {
    /// The vote requested by `Start` is open
    ProposeCallback { vote_id: u64, snapshot_block: u64 },
    /// The vote closed with `outcome`
    EndCallback { vote_id: u64, outcome: VoteOutcome },
    /// `End` opened another voting round instead of closing the vote
    ExtendCallback { vote_id: u64 },
}
