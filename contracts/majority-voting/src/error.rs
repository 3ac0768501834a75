use cosmwasm_std::{OverflowError, StdError};
use thiserror::Error;

/// ## Description
/// This enum describes Majority strategy errors!
#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Poll leader not set")]
    PollLeaderNotSet {},

    #[error("Poll leader already set")]
    PollLeaderAlreadySet {},

    #[error("Wrong state for this operation: {state}")]
    WrongState { state: String },

    #[error("Vote id mismatch: expected {expected}, received {received}")]
    VoteIdMismatch { expected: u64, received: u64 },

    #[error("Total voting weight is zero")]
    ZeroTotalWeight {},

    #[error("You don't have any voting power!")]
    NoVotingPower {},

    #[error("Voting period not started yet! Opens at block {start_block}")]
    VotingPeriodNotStarted { start_block: u64 },

    #[error("Voting period ended!")]
    VotingPeriodEnded {},

    #[error("Voting period not ended yet!")]
    VotingPeriodNotEnded {},

    #[error("User already voted!")]
    UserAlreadyVoted {},

    #[error("Outcome already recorded for vote {vote_id}")]
    OutcomeAlreadyRecorded { vote_id: u64 },

    #[error("No pending administrator")]
    NoPendingAdministrator {},

    #[error("Insufficient funds to send {amount}")]
    InsufficientFunds { amount: String },
}

impl From<OverflowError> for ContractError {
    fn from(o: OverflowError) -> Self {
        StdError::from(o).into()
    }
}
