use cosmwasm_std::{OverflowError, StdError};
use thiserror::Error;

/// ## Description
/// This enum describes DAO coordinator errors!
#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Wrong state for this operation: {state}")]
    WrongState { state: String },

    #[error("No active poll")]
    NoActivePoll {},

    #[error("Proposal id mismatch: active proposal is {expected}, received {received}")]
    ProposalIdMismatch { expected: u64, received: u64 },

    #[error("Vote id mismatch: expected {expected}, received {received}")]
    VoteIdMismatch { expected: u64, received: u64 },

    #[error("Unknown voting strategy: {id}")]
    UnknownVotingStrategy { id: u64 },

    #[error("Voting strategy {id} is already registered")]
    VotingStrategyAlreadyRegistered { id: u64 },

    #[error("Weight oracle not registered")]
    WeightOracleNotRegistered {},

    #[error("Weight oracle already registered")]
    WeightOracleAlreadyRegistered {},

    #[error("Total voting weight is zero")]
    ZeroTotalWeight {},

    #[error("You don't have any voting power!")]
    NoVotingPower {},

    #[error("Outcome already recorded for proposal {proposal_id}")]
    OutcomeAlreadyRecorded { proposal_id: u64 },

    #[error("Insufficient funds to send {amount}")]
    InsufficientFunds { amount: String },

    #[error("Contract can't be unlocked before block {unlock_block}")]
    UnlockDelayNotElapsed { unlock_block: u64 },

    #[error("No pending messages for proposal {proposal_id}")]
    NoPendingEffects { proposal_id: u64 },
}

impl From<OverflowError> for ContractError {
    fn from(o: OverflowError) -> Self {
        StdError::from(o).into()
    }
}
