use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, StdError, StdResult, Uint128};
use std::fmt::{Display, Formatter, Result};

use crate::math::{apply_pertenmill, is_valid_pertenmill, PERTENMILL};
use crate::types::{VoteOutcome, VoteValue};

/// Weight given to the previous quorum when adapting it, in pertenmill
pub const QUORUM_HISTORY_WEIGHT: u64 = 8_000;
/// Weight given to the last vote's participation when adapting the quorum, in pertenmill
pub const QUORUM_PARTICIPATION_WEIGHT: u64 = 2_000;

#[cw_serde]
pub struct InstantiateMsg {
    /// Admin address, defaults to the sender
    pub admin: Option<String>,
    /// Poll leader, can be set once later if left empty
    pub poll_leader: Option<String>,
    pub parameters: GovernanceParameters,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Open a vote. Poll leader only.
    Start { total_weight: Uint128 },
    /// Count a ballot. Poll leader only.
    Vote {
        voter: String,
        weight: Uint128,
        choice: VoteValue,
        vote_id: u64,
    },
    /// Close the vote once its window has elapsed. Poll leader only.
    End { vote_id: u64 },
    /// One-time registration of the poll leader
    SetPollLeader { address: String },
    /// Replace the governance parameters while no vote is in progress
    SetGovernanceParameters { parameters: GovernanceParameters },
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
    /// Return a voter's ballot for a vote
    VoterRecord { vote_id: u64, voter: String },
    /// Return the archived outcome of a vote
    Outcome { vote_id: u64 },
    /// Return the current quorum fraction in pertenmill
    Quorum {},
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
pub struct Config {
    pub admin: Addr,
    pub poll_leader: Option<Addr>,
    pub parameters: GovernanceParameters,
}

/// Bounds the adaptive quorum is clamped into, in pertenmill
#[cw_serde]
pub struct QuorumCap {
    pub lower: u64,
    pub upper: u64,
}

impl QuorumCap {
    pub fn clamp(&self, fraction: u64) -> u64 {
        fraction.max(self.lower).min(self.upper)
    }
}

/// Tally rules of the majority strategy. Block counts are in blocks, fractions in pertenmill.
#[cw_serde]
pub struct GovernanceParameters {
    /// Blocks between `Start` and the opening of the vote
    pub vote_delay: u64,
    /// Length of the voting window
    pub vote_length: u64,
    /// Share of yay+nay weight required on the yay side
    pub supermajority: u64,
    /// Quorum fraction. Fixed quorum uses it as is, dynamic quorum starts from it.
    pub quorum: u64,
    /// Toggle adaptive quorum
    pub dynamic_quorum: bool,
    pub quorum_cap: QuorumCap,
}

impl GovernanceParameters {
    pub fn validate(&self) -> StdResult<()> {
        if !is_valid_pertenmill(self.supermajority) {
            return Err(StdError::generic_err(format!(
                "The supermajority cannot be higher than {}",
                PERTENMILL
            )));
        }

        if !is_valid_pertenmill(self.quorum) {
            return Err(StdError::generic_err(format!(
                "The quorum cannot be higher than {}",
                PERTENMILL
            )));
        }

        if self.quorum_cap.lower > self.quorum_cap.upper || !is_valid_pertenmill(self.quorum_cap.upper) {
            return Err(StdError::generic_err(format!(
                "The quorum cap must satisfy lower <= upper <= {}",
                PERTENMILL
            )));
        }

        if self.dynamic_quorum
            && (self.quorum < self.quorum_cap.lower || self.quorum > self.quorum_cap.upper)
        {
            return Err(StdError::generic_err(
                "A dynamic quorum must start inside its cap",
            ));
        }

        if self.vote_length == 0 {
            return Err(StdError::generic_err("The vote length cannot be zero"));
        }

        Ok(())
    }
}

/// Strategy state machine: NONE -> IN_PROGRESS -> NONE
#[cw_serde]
pub enum MajorityState {
    None,
    InProgress,
}

impl Display for MajorityState {
    fn fmt(&self, fmt: &mut Formatter) -> Result {
        match self {
            MajorityState::None {} => fmt.write_str("none"),
            MajorityState::InProgress {} => fmt.write_str("in_progress"),
        }
    }
}

/// Running tallies of the current vote
#[cw_serde]
pub struct PollDescriptor {
    pub vote_id: u64,
    pub yay: Uint128,
    pub nay: Uint128,
    pub abstain: Uint128,
    /// yay + nay + abstain
    pub total: Uint128,
    /// First block ballots are accepted at
    pub start_block: u64,
    /// Last block ballots are accepted at
    pub end_block: u64,
    /// Block height reported to the leader as the weight snapshot
    pub snapshot_block: u64,
    /// Absolute participation required
    pub quorum: Uint128,
    /// Eligible weight reported by the leader
    pub total_weight: Uint128,
}

impl PollDescriptor {
    /// Passed iff yay reaches the supermajority of opinionated weight and participation reaches quorum
    pub fn outcome(&self, supermajority: u64) -> VoteOutcome {
        let required_yay = apply_pertenmill(self.yay + self.nay, supermajority);

        if self.yay >= required_yay && self.total >= self.quorum {
            VoteOutcome::Passed
        } else {
            VoteOutcome::Failed
        }
    }
}
