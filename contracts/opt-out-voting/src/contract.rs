use cosmwasm_std::{
    attr, entry_point, to_binary, Addr, Binary, Coin, CosmosMsg, Deps, DepsMut, Env, MessageInfo, Response,
    StdError, StdResult, Uint128, Uint64,
};
use cw2::set_contract_version;

use dao_voting::helpers::{funds_transfer_msg, PollLeader, VotingStrategy};
use dao_voting::math::apply_pertenmill;
use dao_voting::opt_out::{
    Config, ExecuteMsg, InstantiateMsg, MigrateMsg, ObjectionResponse, OptOutParameters,
    OptOutPollDescriptor, OptOutState, QueryMsg,
};
use dao_voting::types::{VoteOutcome, VoteValue};

use crate::error::ContractError;
use crate::state::{CONFIG, NEXT_VOTE_ID, OBJECTIONS, OUTCOMES, OWNERSHIP_TRANSFER, POLL, STATE};

// Contract name and version used for migration.
const CONTRACT_NAME: &str = "opt-out-voting";
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
    let phase_2_contract = match msg.phase_2_contract {
        Some(contract) => Some(deps.api.addr_validate(&contract)?),
        None => None,
    };

    msg.parameters.validate()?;

    let config = Config {
        admin,
        poll_leader,
        phase_2_contract,
        parameters: msg.parameters,
    };

    CONFIG.save(deps.storage, &config)?;
    STATE.save(deps.storage, &OptOutState::None)?;
    NEXT_VOTE_ID.save(deps.storage, &0u64)?;

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
        ExecuteMsg::ProposeCallback {
            vote_id,
            snapshot_block,
        } => propose_callback(deps, info, vote_id, snapshot_block),
        ExecuteMsg::EndCallback { vote_id, outcome } => end_callback(deps, info, vote_id, outcome),
        ExecuteMsg::SetPollLeader { address } => set_poll_leader(deps, info, address),
        ExecuteMsg::SetPhase2Contract { address } => set_phase_2_contract(deps, info, address),
        ExecuteMsg::SetParameters { parameters } => set_parameters(deps, info, parameters),
        ExecuteMsg::SetNextAdministrator { address } => set_next_administrator(deps, info, address),
        ExecuteMsg::ValidateNewAdministrator {} => validate_new_administrator(deps, info),
        ExecuteMsg::TransferFunds {
            destination,
            amount,
        } => transfer_funds(deps, env, info, destination, amount),
    }
}

fn assert_poll_leader(config: &Config, sender: &Addr) -> Result<PollLeader, ContractError> {
    match &config.poll_leader {
        Some(leader) if leader == sender => Ok(PollLeader(leader.clone())),
        Some(_) => Err(ContractError::Unauthorized {}),
        None => Err(ContractError::PollLeaderNotSet {}),
    }
}

fn registered_leader(config: &Config) -> Result<PollLeader, ContractError> {
    config
        .poll_leader
        .clone()
        .map(PollLeader)
        .ok_or(ContractError::PollLeaderNotSet {})
}

fn phase_2_strategy(config: &Config) -> Result<VotingStrategy, ContractError> {
    config
        .phase_2_contract
        .clone()
        .map(VotingStrategy)
        .ok_or(ContractError::Phase2ContractNotSet {})
}

fn assert_phase_2_contract(config: &Config, sender: &Addr) -> Result<(), ContractError> {
    match &config.phase_2_contract {
        Some(contract) if contract == sender => Ok(()),
        Some(_) => Err(ContractError::Unauthorized {}),
        None => Err(ContractError::Phase2ContractNotSet {}),
    }
}

fn assert_admin(config: &Config, sender: &Addr) -> Result<(), ContractError> {
    if &config.admin != sender {
        return Err(ContractError::Unauthorized {});
    }

    Ok(())
}

fn wrong_state(state: OptOutState) -> ContractError {
    ContractError::WrongState {
        state: state.to_string(),
    }
}

fn assert_vote_id(poll: &OptOutPollDescriptor, vote_id: u64) -> Result<(), ContractError> {
    if poll.vote_id != vote_id {
        return Err(ContractError::VoteIdMismatch {
            expected: poll.vote_id,
            received: vote_id,
        });
    }

    Ok(())
}

fn phase_2_vote_id(poll: &OptOutPollDescriptor) -> StdResult<u64> {
    poll.phase_2_vote_id
        .ok_or_else(|| StdError::generic_err("Phase 2 vote id not recorded"))
}

/// Open the objection phase over `total_weight`
pub fn start(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    total_weight: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let leader = assert_poll_leader(&config, &info.sender)?;

    //An escalation must be possible before objections are collected
    if config.phase_2_contract.is_none() {
        return Err(ContractError::Phase2ContractNotSet {});
    }

    let state = STATE.load(deps.storage)?;
    if state != OptOutState::None {
        return Err(wrong_state(state));
    }

    if total_weight.is_zero() {
        return Err(ContractError::ZeroTotalWeight {});
    }

    let start_block = Uint64::new(env.block.height)
        .checked_add(Uint64::new(config.parameters.vote_delay))?;
    let end_block = start_block
        .checked_add(Uint64::new(config.parameters.vote_length))?
        .u64();
    let start_block = start_block.u64();
    let vote_id = NEXT_VOTE_ID.load(deps.storage)?;

    let poll = OptOutPollDescriptor {
        vote_id,
        objection_weight: Uint128::zero(),
        start_block,
        end_block,
        total_weight,
        objection_threshold: apply_pertenmill(total_weight, config.parameters.objection_threshold),
        phase_2_needed: false,
        phase_2_vote_id: None,
    };

    POLL.save(deps.storage, &poll)?;
    STATE.save(deps.storage, &OptOutState::Phase1)?;

    let callback = leader.propose_callback(vote_id, env.block.height)?;

    Ok(Response::new().add_message(callback).add_attributes(vec![
        attr("action", "start"),
        attr("vote_id", vote_id.to_string()),
        attr("start_block", start_block.to_string()),
        attr("end_block", end_block.to_string()),
        attr("objection_threshold", poll.objection_threshold),
    ]))
}

/// Phase 1 records objections, phase 2 relays ballots to the majority strategy
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

    let mut poll = POLL
        .may_load(deps.storage)?
        .ok_or_else(|| wrong_state(OptOutState::None))?;
    assert_vote_id(&poll, vote_id)?;

    match STATE.load(deps.storage)? {
        OptOutState::Phase1 => {
            if choice != VoteValue::Nay {
                return Err(ContractError::InvalidChoice {
                    choice: choice.to_string(),
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
            if OBJECTIONS
                .may_load(deps.storage, (vote_id, voter.clone()))?
                .is_some()
            {
                return Err(ContractError::UserAlreadyObjected {});
            }
            OBJECTIONS.save(deps.storage, (vote_id, voter.clone()), &weight)?;

            poll.objection_weight = poll.objection_weight.checked_add(weight)?;
            POLL.save(deps.storage, &poll)?;

            Ok(Response::new().add_attributes(vec![
                attr("action", "object"),
                attr("vote_id", vote_id.to_string()),
                attr("voter", voter),
                attr("weight", weight),
                attr("objection_weight", poll.objection_weight),
            ]))
        }
        OptOutState::Phase2 => {
            let phase_2_contract = phase_2_strategy(&config)?;
            let phase_2_vote_id = phase_2_vote_id(&poll)?;

            let msg =
                phase_2_contract.vote(voter.clone(), weight, choice.clone(), phase_2_vote_id)?;

            Ok(Response::new().add_message(msg).add_attributes(vec![
                attr("action", "forward_vote"),
                attr("vote_id", vote_id.to_string()),
                attr("phase_2_vote_id", phase_2_vote_id.to_string()),
                attr("voter", voter),
                attr("choice", choice.to_string()),
            ]))
        }
        state => Err(wrong_state(state)),
    }
}

/// Close phase 1, escalating to phase 2 if the objections reached the threshold,
/// or ask the majority strategy to close phase 2.
pub fn end(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    vote_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let leader = assert_poll_leader(&config, &info.sender)?;

    let mut poll = POLL
        .may_load(deps.storage)?
        .ok_or_else(|| wrong_state(OptOutState::None))?;
    assert_vote_id(&poll, vote_id)?;

    let phase_2_contract = phase_2_strategy(&config)?;

    match STATE.load(deps.storage)? {
        OptOutState::Phase1 => {
            if env.block.height <= poll.end_block {
                return Err(ContractError::VotingPeriodNotEnded {});
            }

            if poll.objection_weight >= poll.objection_threshold {
                poll.phase_2_needed = true;
                POLL.save(deps.storage, &poll)?;
                STATE.save(deps.storage, &OptOutState::StartingPhase2)?;

                let msg = phase_2_contract.start(poll.total_weight)?;

                return Ok(Response::new().add_message(msg).add_attributes(vec![
                    attr("action", "end_phase_1"),
                    attr("vote_id", vote_id.to_string()),
                    attr("objection_weight", poll.objection_weight),
                    attr("phase_2_needed", "true"),
                ]));
            }

            //Unopposed
            let callback = archive_outcome(deps, &leader, &poll, VoteOutcome::Passed)?;

            Ok(Response::new().add_message(callback).add_attributes(vec![
                attr("action", "end_phase_1"),
                attr("vote_id", vote_id.to_string()),
                attr("objection_weight", poll.objection_weight),
                attr("phase_2_needed", "false"),
                attr("outcome", VoteOutcome::Passed.to_string()),
            ]))
        }
        OptOutState::Phase2 => {
            let phase_2_vote_id = phase_2_vote_id(&poll)?;
            STATE.save(deps.storage, &OptOutState::EndingPhase2)?;

            let msg = phase_2_contract.end(phase_2_vote_id)?;

            Ok(Response::new().add_message(msg).add_attributes(vec![
                attr("action", "end_phase_2"),
                attr("vote_id", vote_id.to_string()),
                attr("phase_2_vote_id", phase_2_vote_id.to_string()),
            ]))
        }
        state => Err(wrong_state(state)),
    }
}

/// Write the outcome of the top-level vote once, reset to NONE and build the leader callback
fn archive_outcome(
    deps: DepsMut,
    leader: &PollLeader,
    poll: &OptOutPollDescriptor,
    outcome: VoteOutcome,
) -> Result<CosmosMsg, ContractError> {
    if OUTCOMES.may_load(deps.storage, poll.vote_id)?.is_some() {
        return Err(ContractError::OutcomeAlreadyRecorded {
            vote_id: poll.vote_id,
        });
    }
    OUTCOMES.save(deps.storage, poll.vote_id, &outcome)?;

    POLL.remove(deps.storage);
    NEXT_VOTE_ID.save(deps.storage, &(poll.vote_id + 1))?;
    STATE.save(deps.storage, &OptOutState::None)?;

    Ok(leader.end_callback(poll.vote_id, outcome)?)
}

/// Majority strategy confirmed phase 2 is open
fn propose_callback(
    deps: DepsMut,
    info: MessageInfo,
    vote_id: u64,
    snapshot_block: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_phase_2_contract(&config, &info.sender)?;

    let state = STATE.load(deps.storage)?;
    if state != OptOutState::StartingPhase2 {
        return Err(wrong_state(state));
    }
    let leader = registered_leader(&config)?;

    let mut poll = POLL.load(deps.storage)?;
    poll.phase_2_vote_id = Some(vote_id);
    POLL.save(deps.storage, &poll)?;
    STATE.save(deps.storage, &OptOutState::Phase2)?;

    //Let the leader route ballots again
    let callback = leader.extend_callback(poll.vote_id)?;

    Ok(Response::new().add_message(callback).add_attributes(vec![
        attr("action", "propose_callback"),
        attr("vote_id", poll.vote_id.to_string()),
        attr("phase_2_vote_id", vote_id.to_string()),
        attr("phase_2_snapshot_block", snapshot_block.to_string()),
    ]))
}

/// Majority strategy verdict, relayed to the leader as the outcome of the top-level vote
fn end_callback(
    deps: DepsMut,
    info: MessageInfo,
    vote_id: u64,
    outcome: VoteOutcome,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_phase_2_contract(&config, &info.sender)?;

    let state = STATE.load(deps.storage)?;
    if state != OptOutState::EndingPhase2 {
        return Err(wrong_state(state));
    }
    let leader = registered_leader(&config)?;

    let poll = POLL.load(deps.storage)?;
    let phase_2_vote_id = phase_2_vote_id(&poll)?;
    if phase_2_vote_id != vote_id {
        return Err(ContractError::VoteIdMismatch {
            expected: phase_2_vote_id,
            received: vote_id,
        });
    }

    let callback = archive_outcome(deps, &leader, &poll, outcome.clone())?;

    Ok(Response::new().add_message(callback).add_attributes(vec![
        attr("action", "end_callback"),
        attr("vote_id", poll.vote_id.to_string()),
        attr("phase_2_vote_id", vote_id.to_string()),
        attr("outcome", outcome.to_string()),
    ]))
}

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

fn set_phase_2_contract(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info.sender)?;

    if config.phase_2_contract.is_some() {
        return Err(ContractError::Phase2ContractAlreadySet {});
    }

    let contract = deps.api.addr_validate(&address)?;
    config.phase_2_contract = Some(contract.clone());
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "set_phase_2_contract"),
        attr("phase_2_contract", contract),
    ]))
}

fn set_parameters(
    deps: DepsMut,
    info: MessageInfo,
    parameters: OptOutParameters,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info.sender)?;

    let state = STATE.load(deps.storage)?;
    if state != OptOutState::None {
        return Err(wrong_state(state));
    }

    parameters.validate()?;
    config.parameters = parameters;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "set_parameters"),
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
        QueryMsg::Objection { vote_id, voter } => {
            let voter = deps.api.addr_validate(&voter)?;
            let weight = OBJECTIONS
                .may_load(deps.storage, (vote_id, voter))?
                .unwrap_or_default();
            to_binary(&ObjectionResponse { weight })
        }
        QueryMsg::Outcome { vote_id } => to_binary(&OUTCOMES.may_load(deps.storage, vote_id)?),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(_deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    Ok(Response::default())
}
