use cosmwasm_std::{
    attr, entry_point, to_binary, Addr, Binary, Coin, Deps, DepsMut, Env, Event, MessageInfo,
    Response, StdResult, Uint128, Uint64,
};
use cw2::set_contract_version;

use dao_voting::helpers::{funds_transfer_msg, PollLeader};
use dao_voting::majority::{
    Config, ExecuteMsg, GovernanceParameters, InstantiateMsg, MajorityState, MigrateMsg,
    PollDescriptor, QueryMsg, QUORUM_HISTORY_WEIGHT, QUORUM_PARTICIPATION_WEIGHT,
};
use dao_voting::math::{apply_pertenmill, to_pertenmill};
use dao_voting::types::{VoteValue, VoterRecord};

use crate::error::ContractError;
use crate::state::{
    CONFIG, NEXT_VOTE_ID, OUTCOMES, OWNERSHIP_TRANSFER, POLL, QUORUM, STATE, VOTER_RECORDS,
};

// Contract name and version used for migration.
const CONTRACT_NAME: &str = "majority-voting";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

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
    let poll_leader = match msg.poll_leader {
        Some(leader) => Some(deps.api.addr_validate(&leader)?),
        None => None,
    };

    msg.parameters.validate()?;

    let config = Config {
        admin,
        poll_leader,
        parameters: msg.parameters,
    };

    CONFIG.save(deps.storage, &config)?;
    STATE.save(deps.storage, &MajorityState::None)?;
    NEXT_VOTE_ID.save(deps.storage, &0u64)?;
    QUORUM.save(deps.storage, &config.parameters.quorum)?;

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
        ExecuteMsg::Start { total_weight } => start(deps, env, info, total_weight),
        ExecuteMsg::Vote {
            voter,
            weight,
            choice,
            vote_id,
        } => vote(deps, env, info, voter, weight, choice, vote_id),
        ExecuteMsg::End { vote_id } => end(deps, env, info, vote_id),
        ExecuteMsg::SetPollLeader { address } => set_poll_leader(deps, info, address),
        ExecuteMsg::SetGovernanceParameters { parameters } => {
            set_governance_parameters(deps, info, parameters)
        }
        ExecuteMsg::SetNextAdministrator { address } => set_next_administrator(deps, info, address),
        ExecuteMsg::ValidateNewAdministrator {} => validate_new_administrator(deps, info),
        ExecuteMsg::TransferFunds {
            destination,
            amount,
        } => transfer_funds(deps, env, info, destination, amount),
    }
}

/// Returns the poll leader if it is the sender
fn assert_poll_leader(config: &Config, sender: &Addr) -> Result<PollLeader, ContractError> {
    match &config.poll_leader {
        Some(leader) if leader == sender => Ok(PollLeader(leader.clone())),
        Some(_) => Err(ContractError::Unauthorized {}),
        None => Err(ContractError::PollLeaderNotSet {}),
    }
}

fn assert_state(deps: Deps, expected: MajorityState) -> Result<(), ContractError> {
    let state = STATE.load(deps.storage)?;
    if state != expected {
        return Err(ContractError::WrongState {
            state: state.to_string(),
        });
    }

    Ok(())
}

fn assert_admin(config: &Config, sender: &Addr) -> Result<(), ContractError> {
    if &config.admin != sender {
        return Err(ContractError::Unauthorized {});
    }

    Ok(())
}

/// Open a new vote over `total_weight`.
/// Quorum is taken from the fixed parameter or the adaptive fraction.
pub fn start(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    total_weight: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let leader = assert_poll_leader(&config, &info.sender)?;
    assert_state(deps.as_ref(), MajorityState::None)?;

    if total_weight.is_zero() {
        return Err(ContractError::ZeroTotalWeight {});
    }

    let quorum_fraction = if config.parameters.dynamic_quorum {
        QUORUM.load(deps.storage)?
    } else {
        config.parameters.quorum
    };

    let start_block = Uint64::new(env.block.height)
        .checked_add(Uint64::new(config.parameters.vote_delay))?;
    let end_block = start_block
        .checked_add(Uint64::new(config.parameters.vote_length))?
        .u64();
    let start_block = start_block.u64();
    let vote_id = NEXT_VOTE_ID.load(deps.storage)?;

    let poll = PollDescriptor {
        vote_id,
        yay: Uint128::zero(),
        nay: Uint128::zero(),
        abstain: Uint128::zero(),
        total: Uint128::zero(),
        start_block,
        end_block,
        snapshot_block: env.block.height,
        quorum: apply_pertenmill(total_weight, quorum_fraction),
        total_weight,
    };

    POLL.save(deps.storage, &poll)?;
    STATE.save(deps.storage, &MajorityState::InProgress)?;

    let callback = leader.propose_callback(vote_id, poll.snapshot_block)?;

    Ok(Response::new()
        .add_message(callback)
        .add_event(
            Event::new("vote_started")
                .add_attribute("vote_id", vote_id.to_string())
                .add_attribute("start_block", start_block.to_string())
                .add_attribute("end_block", end_block.to_string())
                .add_attribute("quorum", poll.quorum),
        )
        .add_attributes(vec![
            attr("action", "start"),
            attr("vote_id", vote_id.to_string()),
            attr("total_weight", total_weight),
            attr("quorum_fraction", quorum_fraction.to_string()),
        ]))
}

/// Count one ballot inside the voting window.
/// A voter gets a single ballot per vote; it can't be stacked or overridden.
pub fn vote(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    voter: String,
    weight: Uint128,
    choice: VoteValue,
    vote_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_poll_leader(&config, &info.sender)?;
    assert_state(deps.as_ref(), MajorityState::InProgress)?;

    let mut poll = POLL.load(deps.storage)?;
    if poll.vote_id != vote_id {
        return Err(ContractError::VoteIdMismatch {
            expected: poll.vote_id,
            received: vote_id,
        });
    }

    if env.block.height < poll.start_block {
        return Err(ContractError::VotingPeriodNotStarted {
            start_block: poll.start_block,
        });
    }
    if env.block.height > poll.end_block {
        return Err(ContractError::VotingPeriodEnded {});
    }

    if weight.is_zero() {
        return Err(ContractError::NoVotingPower {});
    }

    let voter = deps.api.addr_validate(&voter)?;
    if VOTER_RECORDS
        .may_load(deps.storage, (vote_id, voter.clone()))?
        .is_some()
    {
        return Err(ContractError::UserAlreadyVoted {});
    }

    match choice {
        VoteValue::Yay => poll.yay = poll.yay.checked_add(weight)?,
        VoteValue::Nay => poll.nay = poll.nay.checked_add(weight)?,
        VoteValue::Abstain => poll.abstain = poll.abstain.checked_add(weight)?,
    }
    poll.total = poll.total.checked_add(weight)?;

    VOTER_RECORDS.save(
        deps.storage,
        (vote_id, voter.clone()),
        &VoterRecord {
            choice: choice.clone(),
            cast_at_block: env.block.height,
            weight,
        },
    )?;
    POLL.save(deps.storage, &poll)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "vote"),
        attr("vote_id", vote_id.to_string()),
        attr("voter", voter),
        attr("choice", choice.to_string()),
        attr("weight", weight),
    ]))
}

/// Close the vote once its window has elapsed, archive the outcome and report it to the leader.
pub fn end(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    vote_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let leader = assert_poll_leader(&config, &info.sender)?;
    assert_state(deps.as_ref(), MajorityState::InProgress)?;

    let poll = POLL.load(deps.storage)?;
    if poll.vote_id != vote_id {
        return Err(ContractError::VoteIdMismatch {
            expected: poll.vote_id,
            received: vote_id,
        });
    }

    //No early termination
    if env.block.height <= poll.end_block {
        return Err(ContractError::VotingPeriodNotEnded {});
    }

    let outcome = poll.outcome(config.parameters.supermajority);

    if OUTCOMES.may_load(deps.storage, vote_id)?.is_some() {
        return Err(ContractError::OutcomeAlreadyRecorded { vote_id });
    }
    OUTCOMES.save(deps.storage, vote_id, &outcome)?;

    let mut attrs = vec![
        attr("action", "end"),
        attr("vote_id", vote_id.to_string()),
        attr("outcome", outcome.to_string()),
        attr("yay", poll.yay),
        attr("nay", poll.nay),
        attr("abstain", poll.abstain),
        attr("quorum", poll.quorum),
    ];

    if config.parameters.dynamic_quorum {
        let new_quorum = adapt_quorum(&poll, &config.parameters)?;
        QUORUM.save(deps.storage, &new_quorum)?;
        attrs.push(attr("new_quorum_fraction", new_quorum.to_string()));
    }

    POLL.remove(deps.storage);
    NEXT_VOTE_ID.save(deps.storage, &(vote_id + 1))?;
    STATE.save(deps.storage, &MajorityState::None)?;

    let callback = leader.end_callback(vote_id, outcome)?;

    Ok(Response::new().add_message(callback).add_attributes(attrs))
}

/// Blend 80% of the last quorum with 20% of the last participation,
/// as a fraction of the eligible weight, then clamp into the quorum cap.
pub fn adapt_quorum(poll: &PollDescriptor, parameters: &GovernanceParameters) -> StdResult<u64> {
    let history = apply_pertenmill(poll.quorum, QUORUM_HISTORY_WEIGHT);
    let participation = apply_pertenmill(poll.total, QUORUM_PARTICIPATION_WEIGHT);

    let blended = to_pertenmill(history + participation, poll.total_weight)?;

    Ok(parameters.quorum_cap.clamp(blended))
}

/// One-time registration of the poll leader
fn set_poll_leader(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info.sender)?;

    if config.poll_leader.is_some() {
        return Err(ContractError::PollLeaderAlreadySet {});
    }

    let leader = deps.api.addr_validate(&address)?;
    config.poll_leader = Some(leader.clone());
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "set_poll_leader"),
        attr("poll_leader", leader),
    ]))
}

/// Parameters are read-only while a vote is running.
/// Setting them resets the adaptive quorum to the new starting fraction.
fn set_governance_parameters(
    deps: DepsMut,
    info: MessageInfo,
    parameters: GovernanceParameters,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info.sender)?;
    assert_state(deps.as_ref(), MajorityState::None)?;

    parameters.validate()?;

    QUORUM.save(deps.storage, &parameters.quorum)?;
    config.parameters = parameters;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "set_governance_parameters"),
        attr("parameters", format!("{:?}", config.parameters)),
    ]))
}

fn set_next_administrator(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info.sender)?;

    let valid_addr = deps.api.addr_validate(&address)?;
    OWNERSHIP_TRANSFER.save(deps.storage, &valid_addr)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "set_next_administrator"),
        attr("owner_transfer", valid_addr),
    ]))
}

fn validate_new_administrator(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;

    match OWNERSHIP_TRANSFER.may_load(deps.storage)? {
        Some(next_admin) if next_admin == info.sender => {
            config.admin = next_admin;
            CONFIG.save(deps.storage, &config)?;
            OWNERSHIP_TRANSFER.remove(deps.storage);
        }
        Some(_) => return Err(ContractError::Unauthorized {}),
        None => return Err(ContractError::NoPendingAdministrator {}),
    }

    Ok(Response::new().add_attributes(vec![
        attr("action", "validate_new_administrator"),
        attr("admin", config.admin),
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

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_binary(&CONFIG.load(deps.storage)?),
        QueryMsg::State {} => to_binary(&STATE.load(deps.storage)?),
        QueryMsg::Poll {} => to_binary(&POLL.may_load(deps.storage)?),
        QueryMsg::VoterRecord { vote_id, voter } => {
            let voter = deps.api.addr_validate(&voter)?;
            to_binary(&VOTER_RECORDS.may_load(deps.storage, (vote_id, voter))?)
        }
        QueryMsg::Outcome { vote_id } => to_binary(&OUTCOMES.may_load(deps.storage, vote_id)?),
        QueryMsg::Quorum {} => to_binary(&QUORUM.load(deps.storage)?),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(_deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    Ok(Response::default())
}
