use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, StdError, StdResult, Uint128};
use std::fmt::{Display, Formatter, Result};

use crate::math::{is_valid_pertenmill, PERTENMILL};
use crate::types::{VoteOutcome, VoteValue};

#[cw_serde]
pub struct InstantiateMsg {
    /// Admin address, defaults to the sender
    pub admin: Option<String>,
    /// Poll leader, can be set once later if left empty
    pub poll_leader: Option<String>,
    /// Majority strategy running phase 2, can be set once later if left empty
    pub phase_2_contract: Option<String>,
    pub parameters: OptOutParameters,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Open the objection phase. Poll leader only.
    Start { total_weight: Uint128 },
    /// Record an objection (phase 1) or forward a ballot to the majority strategy (phase 2)
    Vote {
        voter: String,
        weight: Uint128,
        choice: VoteValue,
        vote_id: u64,
    },
    /// Close phase 1 or ask the majority strategy to close phase 2
    End { vote_id: u64 },
    /// Majority strategy confirmation that phase 2 is open
    ProposeCallback { vote_id: u64, snapshot_block: u64 },
    /// Majority strategy verdict for phase 2
    EndCallback { vote_id: u64, outcome: VoteOutcome },
    /// One-time registration of the poll leader
    SetPollLeader { address: String },
    /// One-time registration of the phase 2 majority strategy
    SetPhase2Contract { address: String },
    /// Replace the objection parameters while no vote is in progress
    SetParameters { parameters: OptOutParameters },
    /// First step of the admin handover
    SetNextAdministrator { address: String },
    /// Second step of the admin handover, sent by the new admin
    ValidateNewAdministrator {},
    /// Send native funds held by the contract
    TransferFunds { destination: String, amount: Coin },
}

#[cw_serde]
pub enum QueryMsg {
    /// Return the contract's configuration
    Config {},
    /// Return the current state tag
    State {},
    /// Return the running poll, if any
    Poll {},
    /// Return the objection weight a voter recorded in phase 1
    Objection { vote_id: u64, voter: String },
    /// Return the archived outcome of a vote
    Outcome { vote_id: u64 },
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
pub struct Config {
    pub admin: Addr,
    pub poll_leader: Option<Addr>,
    pub phase_2_contract: Option<Addr>,
    pub parameters: OptOutParameters,
}

/// Phase 1 rules. Block counts are in blocks, fractions in pertenmill.
#[cw_serde]
pub struct OptOutParameters {
    /// Blocks between `Start` and the opening of phase 1
    pub vote_delay: u64,
    /// Length of the objection window
    pub vote_length: u64,
    /// Share of the total weight whose objection forces a phase 2 vote
    pub objection_threshold: u64,
}

impl OptOutParameters {
    pub fn validate(&self) -> StdResult<()> {
        if !is_valid_pertenmill(self.objection_threshold) {
            return Err(StdError::generic_err(format!(
                "The objection threshold cannot be higher than {}",
                PERTENMILL
            )));
        }

        if self.vote_length == 0 {
            return Err(StdError::generic_err("The vote length cannot be zero"));
        }

        Ok(())
    }
}

/// NONE -> PHASE_1 -> [STARTING_PHASE_2 -> PHASE_2 -> ENDING_PHASE_2] -> NONE
#[cw_serde]
pub enum OptOutState {
    None,
    Phase1,
    StartingPhase2,
    Phase2,
    EndingPhase2,
}

impl Display for OptOutState {
    fn fmt(&self, fmt: &mut Formatter) -> Result {
        match self {
            OptOutState::None {} => fmt.write_str("none"),
            OptOutState::Phase1 {} => fmt.write_str("phase_1"),
            OptOutState::StartingPhase2 {} => fmt.write_str("starting_phase_2"),
            OptOutState::Phase2 {} => fmt.write_str("phase_2"),
            OptOutState::EndingPhase2 {} => fmt.write_str("ending_phase_2"),
        }
    }
}

#[cw_serde]
pub struct OptOutPollDescriptor {
    /// Vote handle given to the leader
    pub vote_id: u64,
    /// Objection weight gathered in phase 1
    pub objection_weight: Uint128,
    /// First block objections are accepted at
    pub start_block: u64,
    /// Last block objections are accepted at
    pub end_block: u64,
    /// Eligible weight reported by the leader
    pub total_weight: Uint128,
    /// Absolute objection weight that forces phase 2
    pub objection_threshold: Uint128,
    pub phase_2_needed: bool,
    /// Vote handle assigned by the majority strategy
    pub phase_2_vote_id: Option<u64>,
}

#[cw_serde]
pub struct ObjectionResponse {
    pub weight: Uint128,
}
