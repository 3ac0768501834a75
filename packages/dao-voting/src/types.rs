use cosmwasm_schema::cw_serde;
use cosmwasm_std::{CosmosMsg, Uint128, Uint64};
use std::fmt::{Display, Formatter, Result};

/// Options a voter can pick.
/// Opt-out strategies only accept `Nay` during their objection phase.
#[cw_serde]
pub enum VoteValue {
    Yay,
    Nay,
    Abstain,
}

impl Display for VoteValue {
    fn fmt(&self, fmt: &mut Formatter) -> Result {
        match self {
            VoteValue::Yay {} => fmt.write_str("yay"),
            VoteValue::Nay {} => fmt.write_str("nay"),
            VoteValue::Abstain {} => fmt.write_str("abstain"),
        }
    }
}

/// Verdict reported by a strategy once a vote is closed
#[cw_serde]
pub enum VoteOutcome {
    Failed,
    Passed,
}

impl VoteOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, VoteOutcome::Passed)
    }
}

impl Display for VoteOutcome {
    fn fmt(&self, fmt: &mut Formatter) -> Result {
        match self {
            VoteOutcome::Failed {} => fmt.write_str("failed"),
            VoteOutcome::Passed {} => fmt.write_str("passed"),
        }
    }
}

/// A single executable message attached to a proposal.
#[cw_serde]
pub struct ProposalMessage {
    /// Order of execution of the message
    pub order: Uint64,
    /// Execution message
    pub msg: CosmosMsg,
}

/// Write-once record of a ballot held by a strategy.
#[cw_serde]
pub struct VoterRecord {
    /// Option picked by the voter
    pub choice: VoteValue,
    /// Block height the ballot was cast at
    pub cast_at_block: u64,
    /// Weight counted for the ballot
    pub weight: Uint128,
}
