use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, CosmosMsg, StdError, StdResult};
use std::fmt::{Display, Formatter, Result};

use crate::types::{ProposalMessage, VoteOutcome, VoteValue};

use self::helpers::{is_hex, is_safe_link};

/// Proposal validation attributes
const MIN_TITLE_LENGTH: usize = 4;
const MAX_TITLE_LENGTH: usize = 64;
const MIN_LINK_LENGTH: usize = 12;
const MAX_LINK_LENGTH: usize = 128;
const MAX_HASH_LENGTH: usize = 128;

/// Special characters that are allowed in proposal text
const SAFE_TEXT_CHARS: &str = "!&?#()*+'-./\"";

/// This structure holds the parameters used for creating the DAO coordinator.
#[cw_serde]
pub struct InstantiateMsg {
    /// Admin address, defaults to the sender
    pub admin: Option<String>,
    /// Only address allowed to submit proposals
    pub proposer: String,
    /// Token ledger answering voting weight queries. Can also be registered later, once.
    pub weight_oracle: Option<String>,
    /// Blocks a poll must sit in STARTING_VOTE or ENDING_VOTE before the admin can unlock it
    pub unlock_delay: u64,
}

/// This enum describes all execute functions available in the contract.
#[cw_serde]
pub enum ExecuteMsg {
    /// Submit a new proposal and dispatch it to its voting strategy
    Propose { proposal: Proposal },
    /// Strategy confirmation that the vote requested by `Propose` is open
    ProposeCallback { vote_id: u64, snapshot_block: u64 },
    /// Cast a vote for the active proposal
    Vote {
        /// Proposal identifier
        proposal_id: u64,
        /// Vote option
        choice: VoteValue,
    },
    /// Ask the strategy to close the active vote. Callable by anyone.
    End {
        /// Proposal identifier
        proposal_id: u64,
    },
    /// Strategy verdict for the vote closed by `End`
    EndCallback { vote_id: u64, outcome: VoteOutcome },
    /// Strategy notice that `End` opened another voting round
    ExtendCallback { vote_id: u64 },
    /// Run the messages of a passed proposal
    /// ## Executor
    /// The DAO itself, as a submessage of `EndCallback`. A failing message
    /// reverts the whole batch but not the archived outcome.
    ExecuteEffects { proposal_id: u64 },
    /// Register a voting strategy under a new id
    /// ## Executor
    /// The admin or the DAO itself (through a successful proposal)
    AddVotingStrategy {
        id: u64,
        name: String,
        address: String,
    },
    /// One-time registration of the voting weight oracle
    RegisterWeightOracle { address: String },
    /// Replace the admin
    /// ## Executor
    /// The admin or the DAO itself
    SetAdministrator { address: String },
    /// Replace the proposer
    /// ## Executor
    /// The admin or the DAO itself
    SetProposer { address: String },
    /// Send native funds held by the contract
    TransferFunds { destination: String, amount: Coin },
    /// Set or remove (`value: None`) a metadata entry
    SetMetadata { key: String, value: Option<String> },
    /// Abort a poll stuck waiting for a strategy callback
    UnlockContract {},
}

/// Thie enum describes all the queries available in the contract.
#[cw_serde]
pub enum QueryMsg {
    /// Return the contract's configuration
    Config {},
    /// Return the current state tag
    State {},
    /// Return whether a poll exists
    IsPollActive {},
    /// Return the current poll, if any
    Poll {},
    /// Return the snapshot block of the current poll, if any
    PollSnapshot {},
    /// Return the number of archived outcomes
    OutcomeCount {},
    /// Return the archived outcome of a proposal
    Outcome { proposal_id: u64 },
    /// Return archived outcomes in ascending proposal order
    Outcomes {
        /// Id after which to start querying
        start_after: Option<u64>,
        /// The amount of outcomes to return
        limit: Option<u32>,
    },
    /// Return a registered voting strategy
    VotingStrategy { id: u64 },
    /// Return all registered voting strategies
    VotingStrategies {},
    /// Return a metadata entry
    Metadata { key: String },
}

#[cw_serde]
pub struct MigrateMsg {}

/// This structure stores general parameters for the DAO coordinator.
#[cw_serde]
pub struct Config {
    /// Admin address
    pub admin: Addr,
    /// Only address allowed to submit proposals
    pub proposer: Addr,
    /// Voting weight oracle
    pub weight_oracle: Option<Addr>,
    /// Rescue delay in blocks
    pub unlock_delay: u64,
}

/// Coordinator state machine: NONE -> STARTING_VOTE -> VOTE_ONGOING -> ENDING_VOTE -> NONE
#[cw_serde]
pub enum DaoState {
    None,
    StartingVote,
    VoteOngoing,
    EndingVote,
}

impl Display for DaoState {
    fn fmt(&self, fmt: &mut Formatter) -> Result {
        match self {
            DaoState::None {} => fmt.write_str("none"),
            DaoState::StartingVote {} => fmt.write_str("starting_vote"),
            DaoState::VoteOngoing {} => fmt.write_str("vote_ongoing"),
            DaoState::EndingVote {} => fmt.write_str("ending_vote"),
        }
    }
}

/// This structure stores data for a proposal.
#[cw_serde]
pub struct Proposal {
    /// Proposal title
    pub title: String,
    /// Where the full description lives
    pub description_link: String,
    /// Hex digest of the description content
    pub description_hash: String,
    /// Messages executed by the DAO if the proposal passes
    pub messages: Option<Vec<ProposalMessage>>,
    /// Registered voting strategy id
    pub voting_strategy: u64,
}

impl Proposal {
    pub fn validate(&self) -> StdResult<()> {
        // Title validation
        if self.title.len() < MIN_TITLE_LENGTH {
            return Err(StdError::generic_err("Title too short!"));
        }
        if self.title.len() > MAX_TITLE_LENGTH {
            return Err(StdError::generic_err("Title too long!"));
        }
        if !self.title.chars().all(|c| {
            c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || SAFE_TEXT_CHARS.contains(c)
        }) {
            return Err(StdError::generic_err(
                "Title is not in alphanumeric format!",
            ));
        }

        // Link validation
        if self.description_link.len() < MIN_LINK_LENGTH {
            return Err(StdError::generic_err("Link too short!"));
        }
        if self.description_link.len() > MAX_LINK_LENGTH {
            return Err(StdError::generic_err("Link too long!"));
        }
        if !is_safe_link(&self.description_link) {
            return Err(StdError::generic_err(
                "Link is not properly formatted or contains unsafe characters!",
            ));
        }

        // Hash validation
        if self.description_hash.is_empty() || self.description_hash.len() > MAX_HASH_LENGTH {
            return Err(StdError::generic_err("Invalid description hash length!"));
        }
        if !is_hex(&self.description_hash) {
            return Err(StdError::generic_err("Description hash is not hex encoded!"));
        }

        Ok(())
    }

    /// Effect messages in execution order
    pub fn ordered_messages(&self) -> Vec<CosmosMsg> {
        match self.messages.clone() {
            Some(mut messages) => {
                messages.sort_by(|a, b| a.order.cmp(&b.order));
                messages.into_iter().map(|message| message.msg).collect()
            }
            None => vec![],
        }
    }
}

/// Live instance of a proposal undergoing voting
#[cw_serde]
pub struct Poll {
    /// Unique proposal ID
    pub proposal_id: u64,
    /// The submitted proposal
    pub proposal: Proposal,
    /// The address of the proposal submitter
    pub author: Addr,
    /// Strategy contract counting the votes
    pub voting_strategy_address: Addr,
    /// Vote handle assigned by the strategy, 0 until confirmed
    pub voting_id: u64,
    /// Block height voting weight is looked up at, 0 until confirmed
    pub snapshot_block: u64,
    /// Block height the current state was entered at
    pub state_since: u64,
}

/// Immutable archive entry for a finished poll
#[cw_serde]
pub struct HistoricalOutcome {
    pub outcome: VoteOutcome,
    pub poll: Poll,
    /// Set when the messages of a passed proposal failed
    pub effects_error: Option<String>,
}

/// A registered voting strategy
#[cw_serde]
pub struct VotingStrategyInfo {
    pub name: String,
    pub address: Addr,
}

#[cw_serde]
pub struct VotingStrategyResponse {
    pub id: u64,
    pub name: String,
    pub address: Addr,
}

#[cw_serde]
pub struct OutcomeListResponse {
    /// Number of outcomes archived so far
    pub outcome_count: u64,
    /// The outcomes that are returned
    pub outcomes: Vec<HistoricalOutcome>,
}

#[cw_serde]
pub struct OutcomeCountResponse {
    pub count: u64,
}

pub mod helpers {
    const SAFE_LINK_CHARS: &str = "-_:/?#@!$&()*+,;=.~[]'%";

    /// Checks if the link is valid. Returns a boolean value.
    pub fn is_safe_link(link: &str) -> bool {
        link.chars()
            .all(|c| c.is_ascii_alphanumeric() || SAFE_LINK_CHARS.contains(c))
    }

    pub fn is_hex(value: &str) -> bool {
        value.chars().all(|c| c.is_ascii_hexdigit())
    }
}
