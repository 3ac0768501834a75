use cosmwasm_std::{
    attr, entry_point, to_binary, Addr, Binary, Coin, Deps, DepsMut, Env, MessageInfo, Reply,
    Response, StdError, StdResult, Storage,
};
use cw2::set_contract_version;

use dao_voting::coordinator::{
    Config, DaoState, ExecuteMsg, HistoricalOutcome, InstantiateMsg, MigrateMsg, Poll, Proposal,
    QueryMsg, VotingStrategyInfo,
};
use dao_voting::helpers::{
    funds_transfer_msg, query_total_voting_weight, query_voting_weight_at, VotingStrategy,
};
use dao_voting::types::{VoteOutcome, VoteValue};

use crate::error::ContractError;
use crate::helpers::{DaoContract, EFFECTS_REPLY_ID};
use crate::query::{
    query_outcome_count, query_outcomes, query_voting_strategies, query_voting_strategy,
};
use crate::state::{
    CONFIG, METADATA, OUTCOMES, PENDING_EFFECTS, POLL, PROPOSAL_COUNT, STATE, STRATEGIES,
};

// Contract name and version used for migration.
const CONTRACT_NAME: &str = "dao-coordinator";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Callers allowed to reconfigure the DAO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Admin,
    /// The coordinator executing a passed proposal
    SelfCall,
}

impl Caller {
    fn as_str(&self) -> &'static str {
        match self {
            Caller::Admin => "admin",
            Caller::SelfCall => "self",
        }
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let admin = match msg.admin {
        Some(admin) => deps.api.addr_validate(&admin)?,
        None => info.sender,
    };
    let weight_oracle = match msg.weight_oracle {
        Some(oracle) => Some(deps.api.addr_validate(&oracle)?),
        None => None,
    };

    let config = Config {
        admin,
        proposer: deps.api.addr_validate(&msg.proposer)?,
        weight_oracle,
        unlock_delay: msg.unlock_delay,
    };

    CONFIG.save(deps.storage, &config)?;
    STATE.save(deps.storage, &DaoState::None)?;
    PROPOSAL_COUNT.save(deps.storage, &0u64)?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("config", format!("{:?}", config))
        .add_attribute("contract_address", env.contract.address))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Propose { proposal } => propose(deps, env, info, proposal),
        ExecuteMsg::ProposeCallback {
            vote_id,
            snapshot_block,
        } => propose_callback(deps, env, info, vote_id, snapshot_block),
        ExecuteMsg::Vote {
            proposal_id,
            choice,
        } => vote(deps, info, proposal_id, choice),
        ExecuteMsg::End { proposal_id } => end(deps, env, proposal_id),
        ExecuteMsg::EndCallback { vote_id, outcome } => {
            end_callback(deps, env, info, vote_id, outcome)
        }
        ExecuteMsg::ExtendCallback { vote_id } => extend_callback(deps, env, info, vote_id),
        ExecuteMsg::ExecuteEffects { proposal_id } => {
            execute_effects(deps, env, info, proposal_id)
        }
        ExecuteMsg::AddVotingStrategy { id, name, address } => {
            add_voting_strategy(deps, env, info, id, name, address)
        }
        ExecuteMsg::RegisterWeightOracle { address } => {
            register_weight_oracle(deps, info, address)
        }
        ExecuteMsg::SetAdministrator { address } => set_administrator(deps, env, info, address),
        ExecuteMsg::SetProposer { address } => set_proposer(deps, env, info, address),
        ExecuteMsg::TransferFunds {
            destination,
            amount,
        } => transfer_funds(deps, env, info, destination, amount),
        ExecuteMsg::SetMetadata { key, value } => set_metadata(deps, info, key, value),
        ExecuteMsg::UnlockContract {} => unlock_contract(deps, env, info),
    }
}

fn assert_admin(config: &Config, sender: &Addr) -> Result<(), ContractError> {
    if &config.admin != sender {
        return Err(ContractError::Unauthorized {});
    }

    Ok(())
}

/// Resolve the sender as the admin or the coordinator itself
fn privileged_caller(config: &Config, env: &Env, sender: &Addr) -> Result<Caller, ContractError> {
    if sender == &env.contract.address {
        Ok(Caller::SelfCall)
    } else if sender == &config.admin {
        Ok(Caller::Admin)
    } else {
        Err(ContractError::Unauthorized {})
    }
}

fn assert_state(deps: Deps, expected: DaoState) -> Result<(), ContractError> {
    let state = STATE.load(deps.storage)?;
    if state != expected {
        return Err(ContractError::WrongState {
            state: state.to_string(),
        });
    }

    Ok(())
}

/// Load the active poll and check the callback comes from its strategy
fn load_strategy_poll(deps: Deps, sender: &Addr) -> Result<Poll, ContractError> {
    let poll = POLL
        .may_load(deps.storage)?
        .ok_or(ContractError::NoActivePoll {})?;

    if &poll.voting_strategy_address != sender {
        return Err(ContractError::Unauthorized {});
    }

    Ok(poll)
}

fn assert_vote_id(poll: &Poll, vote_id: u64) -> Result<(), ContractError> {
    if poll.voting_id != vote_id {
        return Err(ContractError::VoteIdMismatch {
            expected: poll.voting_id,
            received: vote_id,
        });
    }

    Ok(())
}

fn load_active_poll(deps: Deps, proposal_id: u64) -> Result<Poll, ContractError> {
    let poll = POLL
        .may_load(deps.storage)?
        .ok_or(ContractError::NoActivePoll {})?;

    if poll.proposal_id != proposal_id {
        return Err(ContractError::ProposalIdMismatch {
            expected: poll.proposal_id,
            received: proposal_id,
        });
    }

    Ok(poll)
}

/// Submit a proposal and ask its strategy to open a vote
pub fn propose(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    proposal: Proposal,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.proposer {
        return Err(ContractError::Unauthorized {});
    }
    assert_state(deps.as_ref(), DaoState::None)?;

    proposal.validate()?;

    let strategy = STRATEGIES
        .may_load(deps.storage, proposal.voting_strategy)?
        .ok_or(ContractError::UnknownVotingStrategy {
            id: proposal.voting_strategy,
        })?;
    let weight_oracle = config
        .weight_oracle
        .ok_or(ContractError::WeightOracleNotRegistered {})?;

    let total_weight = query_total_voting_weight(deps.querier, weight_oracle.to_string())?;
    if total_weight.is_zero() {
        return Err(ContractError::ZeroTotalWeight {});
    }

    let proposal_id = PROPOSAL_COUNT.load(deps.storage)?;
    let poll = Poll {
        proposal_id,
        proposal,
        author: info.sender,
        voting_strategy_address: strategy.address,
        voting_id: 0,
        snapshot_block: 0,
        state_since: env.block.height,
    };

    POLL.save(deps.storage, &poll)?;
    STATE.save(deps.storage, &DaoState::StartingVote)?;

    let msg = VotingStrategy(poll.voting_strategy_address.clone()).start(total_weight)?;

    Ok(Response::new().add_message(msg).add_attributes(vec![
        attr("action", "propose"),
        attr("proposal_id", proposal_id.to_string()),
        attr("title", poll.proposal.title),
        attr("voting_strategy", poll.voting_strategy_address),
        attr("total_weight", total_weight),
    ]))
}

fn propose_callback(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    vote_id: u64,
    snapshot_block: u64,
) -> Result<Response, ContractError> {
    let mut poll = load_strategy_poll(deps.as_ref(), &info.sender)?;
    assert_state(deps.as_ref(), DaoState::StartingVote)?;

    poll.voting_id = vote_id;
    poll.snapshot_block = snapshot_block;
    poll.state_since = env.block.height;

    POLL.save(deps.storage, &poll)?;
    STATE.save(deps.storage, &DaoState::VoteOngoing)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "propose_callback"),
        attr("proposal_id", poll.proposal_id.to_string()),
        attr("vote_id", vote_id.to_string()),
        attr("snapshot_block", snapshot_block.to_string()),
    ]))
}

/// Forward the sender's ballot, weighted at the poll snapshot, to the strategy.
/// Duplicate ballots are rejected by the strategy.
pub fn vote(
    deps: DepsMut,
    info: MessageInfo,
    proposal_id: u64,
    choice: VoteValue,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_state(deps.as_ref(), DaoState::VoteOngoing)?;
    let poll = load_active_poll(deps.as_ref(), proposal_id)?;

    let weight_oracle = config
        .weight_oracle
        .ok_or(ContractError::WeightOracleNotRegistered {})?;
    let weight = query_voting_weight_at(
        deps.querier,
        weight_oracle.to_string(),
        info.sender.to_string(),
        poll.snapshot_block,
    )?;
    if weight.is_zero() {
        return Err(ContractError::NoVotingPower {});
    }

    let msg = VotingStrategy(poll.voting_strategy_address).vote(
        info.sender.to_string(),
        weight,
        choice.clone(),
        poll.voting_id,
    )?;

    Ok(Response::new().add_message(msg).add_attributes(vec![
        attr("action", "vote"),
        attr("proposal_id", proposal_id.to_string()),
        attr("voter", info.sender),
        attr("choice", choice.to_string()),
        attr("weight", weight),
    ]))
}

/// Ask the strategy to close the active vote. Anyone can trigger it,
/// the strategy decides whether the vote can end.
pub fn end(deps: DepsMut, env: Env, proposal_id: u64) -> Result<Response, ContractError> {
    assert_state(deps.as_ref(), DaoState::VoteOngoing)?;
    let mut poll = load_active_poll(deps.as_ref(), proposal_id)?;

    poll.state_since = env.block.height;
    POLL.save(deps.storage, &poll)?;
    STATE.save(deps.storage, &DaoState::EndingVote)?;

    let msg = VotingStrategy(poll.voting_strategy_address.clone()).end(poll.voting_id)?;

    Ok(Response::new().add_message(msg).add_attributes(vec![
        attr("action", "end"),
        attr("proposal_id", proposal_id.to_string()),
        attr("vote_id", poll.voting_id.to_string()),
    ]))
}

/// Archive the verdict, then run the proposal's messages if it passed.
/// The messages run as a submessage so a failing one can't undo the archive.
fn end_callback(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    vote_id: u64,
    outcome: VoteOutcome,
) -> Result<Response, ContractError> {
    let poll = load_strategy_poll(deps.as_ref(), &info.sender)?;
    assert_state(deps.as_ref(), DaoState::EndingVote)?;
    assert_vote_id(&poll, vote_id)?;

    let proposal_id = poll.proposal_id;
    let has_effects = outcome.is_passed() && !poll.proposal.ordered_messages().is_empty();
    archive(deps.storage, poll, outcome.clone())?;

    let mut response = Response::new();
    if has_effects {
        PENDING_EFFECTS.save(deps.storage, &proposal_id)?;
        response =
            response.add_submessage(DaoContract(env.contract.address).execute_effects(proposal_id)?);
    }

    Ok(response.add_attributes(vec![
        attr("action", "end_callback"),
        attr("proposal_id", proposal_id.to_string()),
        attr("vote_id", vote_id.to_string()),
        attr("outcome", outcome.to_string()),
        attr("has_effects", has_effects.to_string()),
    ]))
}

/// Write the outcome once and return to NONE
fn archive(
    storage: &mut dyn Storage,
    poll: Poll,
    outcome: VoteOutcome,
) -> Result<(), ContractError> {
    let proposal_id = poll.proposal_id;
    if OUTCOMES.may_load(storage, proposal_id)?.is_some() {
        return Err(ContractError::OutcomeAlreadyRecorded { proposal_id });
    }

    OUTCOMES.save(
        storage,
        proposal_id,
        &HistoricalOutcome {
            outcome,
            poll,
            effects_error: None,
        },
    )?;
    POLL.remove(storage);
    PROPOSAL_COUNT.save(storage, &(proposal_id + 1))?;
    STATE.save(storage, &DaoState::None)?;

    Ok(())
}

/// Release the ordered messages of an archived, passed proposal.
/// Each proposal's messages can be released once, by the DAO itself.
fn execute_effects(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    proposal_id: u64,
) -> Result<Response, ContractError> {
    if info.sender != env.contract.address {
        return Err(ContractError::Unauthorized {});
    }

    match PENDING_EFFECTS.may_load(deps.storage)? {
        Some(pending) if pending == proposal_id => PENDING_EFFECTS.remove(deps.storage),
        _ => return Err(ContractError::NoPendingEffects { proposal_id }),
    }

    let archived = OUTCOMES.load(deps.storage, proposal_id)?;
    let messages = archived.poll.proposal.ordered_messages();

    Ok(Response::new()
        .add_attribute("action", "execute_effects")
        .add_attribute("proposal_id", proposal_id.to_string())
        .add_attribute("message_count", messages.len().to_string())
        .add_messages(messages))
}

/// The strategy answered `End` by opening another round, voting resumes
fn extend_callback(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    vote_id: u64,
) -> Result<Response, ContractError> {
    let mut poll = load_strategy_poll(deps.as_ref(), &info.sender)?;
    assert_state(deps.as_ref(), DaoState::EndingVote)?;
    assert_vote_id(&poll, vote_id)?;

    poll.state_since = env.block.height;
    POLL.save(deps.storage, &poll)?;
    STATE.save(deps.storage, &DaoState::VoteOngoing)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "extend_callback"),
        attr("proposal_id", poll.proposal_id.to_string()),
        attr("vote_id", vote_id.to_string()),
    ]))
}

fn add_voting_strategy(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    id: u64,
    name: String,
    address: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let caller = privileged_caller(&config, &env, &info.sender)?;
    assert_state(deps.as_ref(), DaoState::None)?;

    if STRATEGIES.may_load(deps.storage, id)?.is_some() {
        return Err(ContractError::VotingStrategyAlreadyRegistered { id });
    }

    let address = deps.api.addr_validate(&address)?;
    STRATEGIES.save(
        deps.storage,
        id,
        &VotingStrategyInfo {
            name: name.clone(),
            address: address.clone(),
        },
    )?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "add_voting_strategy"),
        attr("caller", caller.as_str()),
        attr("id", id.to_string()),
        attr("name", name),
        attr("address", address),
    ]))
}

fn register_weight_oracle(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info.sender)?;

    if config.weight_oracle.is_some() {
        return Err(ContractError::WeightOracleAlreadyRegistered {});
    }

    let oracle = deps.api.addr_validate(&address)?;
    config.weight_oracle = Some(oracle.clone());
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "register_weight_oracle"),
        attr("weight_oracle", oracle),
    ]))
}

fn set_administrator(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    let caller = privileged_caller(&config, &env, &info.sender)?;

    config.admin = deps.api.addr_validate(&address)?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "set_administrator"),
        attr("caller", caller.as_str()),
        attr("admin", config.admin),
    ]))
}

fn set_proposer(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    let caller = privileged_caller(&config, &env, &info.sender)?;

    config.proposer = deps.api.addr_validate(&address)?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "set_proposer"),
        attr("caller", caller.as_str()),
        attr("proposer", config.proposer),
    ]))
}

fn transfer_funds(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    destination: String,
    amount: Coin,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info.sender)?;

    let destination = deps.api.addr_validate(&destination)?;
    let msg = funds_transfer_msg(deps.querier, &env.contract.address, &destination, amount.clone())?
        .ok_or(ContractError::InsufficientFunds {
            amount: amount.to_string(),
        })?;

    Ok(Response::new().add_message(msg).add_attributes(vec![
        attr("action", "transfer_funds"),
        attr("destination", destination),
        attr("amount", amount.to_string()),
    ]))
}

fn set_metadata(
    deps: DepsMut,
    info: MessageInfo,
    key: String,
    value: Option<String>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info.sender)?;

    match &value {
        Some(value) => METADATA.save(deps.storage, &key, value)?,
        None => METADATA.remove(deps.storage, &key),
    }

    Ok(Response::new().add_attributes(vec![
        attr("action", "set_metadata"),
        attr("key", key),
        attr("removed", value.is_none().to_string()),
    ]))
}

/// Abort a poll whose strategy never called back. The poll is archived as failed.
fn unlock_contract(deps: DepsMut, env: Env, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info.sender)?;

    let state = STATE.load(deps.storage)?;
    if state != DaoState::StartingVote && state != DaoState::EndingVote {
        return Err(ContractError::WrongState {
            state: state.to_string(),
        });
    }

    let poll = POLL
        .may_load(deps.storage)?
        .ok_or(ContractError::NoActivePoll {})?;

    //A delay too large to add up never unlocks
    let unlock_block = poll
        .state_since
        .checked_add(config.unlock_delay)
        .unwrap_or(u64::MAX);
    if env.block.height < unlock_block {
        return Err(ContractError::UnlockDelayNotElapsed { unlock_block });
    }

    let proposal_id = poll.proposal_id;
    archive(deps.storage, poll, VoteOutcome::Failed)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "unlock_contract"),
        attr("proposal_id", proposal_id.to_string()),
        attr("stuck_state", state.to_string()),
        attr("outcome", VoteOutcome::Failed.to_string()),
    ]))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn reply(deps: DepsMut, _env: Env, msg: Reply) -> StdResult<Response> {
    match msg.id {
        EFFECTS_REPLY_ID => handle_effects_reply(deps, msg),
        id => Err(StdError::generic_err(format!("invalid reply id: {}", id))),
    }
}

/// The proposal's messages failed and were reverted. The outcome stays archived
/// and the failure is recorded next to it.
fn handle_effects_reply(deps: DepsMut, msg: Reply) -> StdResult<Response> {
    match msg.result.into_result() {
        Ok(_) => Ok(Response::new()),
        Err(error) => {
            let proposal_id = PENDING_EFFECTS.load(deps.storage)?;
            PENDING_EFFECTS.remove(deps.storage);

            let mut archived = OUTCOMES.load(deps.storage, proposal_id)?;
            archived.effects_error = Some(error.clone());
            OUTCOMES.save(deps.storage, proposal_id, &archived)?;

            Ok(Response::new().add_attributes(vec![
                attr("action", "effects_failed"),
                attr("proposal_id", proposal_id.to_string()),
                attr("error", error),
            ]))
        }
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_binary(&CONFIG.load(deps.storage)?),
        QueryMsg::State {} => to_binary(&STATE.load(deps.storage)?),
        QueryMsg::IsPollActive {} => to_binary(&POLL.may_load(deps.storage)?.is_some()),
        QueryMsg::Poll {} => to_binary(&POLL.may_load(deps.storage)?),
        QueryMsg::PollSnapshot {} => to_binary(
            &POLL
                .may_load(deps.storage)?
                .map(|poll| poll.snapshot_block),
        ),
        QueryMsg::OutcomeCount {} => to_binary(&query_outcome_count(deps)?),
        QueryMsg::Outcome { proposal_id } => {
            to_binary(&OUTCOMES.may_load(deps.storage, proposal_id)?)
        }
        QueryMsg::Outcomes { start_after, limit } => {
            to_binary(&query_outcomes(deps, start_after, limit)?)
        }
        QueryMsg::VotingStrategy { id } => to_binary(&query_voting_strategy(deps, id)?),
        QueryMsg::VotingStrategies {} => to_binary(&query_voting_strategies(deps)?),
        QueryMsg::Metadata { key } => to_binary(&METADATA.may_load(deps.storage, &key)?),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(_deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    Ok(Response::default())
}
