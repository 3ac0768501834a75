use crate::contract::{execute, instantiate, query};
use crate::ContractError;

use dao_voting::majority::{
    Config, ExecuteMsg, GovernanceParameters, InstantiateMsg, MajorityState, PollDescriptor,
    QueryMsg, QuorumCap,
};
use dao_voting::strategy::LeaderCallbackMsg;
use dao_voting::types::{VoteOutcome, VoteValue, VoterRecord};

use cosmwasm_std::testing::{
    mock_dependencies, mock_dependencies_with_balance, mock_env, mock_info, MockApi, MockQuerier,
    MockStorage,
};
use cosmwasm_std::{
    coin, from_binary, to_binary, Addr, BankMsg, CosmosMsg, Env, OwnedDeps, StdError, SubMsg,
    Uint128, WasmMsg,
};

const ADMIN: &str = "admin";
const LEADER: &str = "leader";

const START_HEIGHT: u64 = 12_345;
const VOTE_DELAY: u64 = 10;
const VOTE_LENGTH: u64 = 100;

fn parameters(quorum: u64, dynamic_quorum: bool) -> GovernanceParameters {
    GovernanceParameters {
        vote_delay: VOTE_DELAY,
        vote_length: VOTE_LENGTH,
        supermajority: 8000,
        quorum,
        dynamic_quorum,
        quorum_cap: QuorumCap {
            lower: 1000,
            upper: 8000,
        },
    }
}

fn env_at(height: u64) -> Env {
    let mut env = mock_env();
    env.block.height = height;
    env
}

fn setup(parameters: GovernanceParameters) -> OwnedDeps<MockStorage, MockApi, MockQuerier> {
    let mut deps = mock_dependencies();

    let msg = InstantiateMsg {
        admin: None,
        poll_leader: Some(String::from(LEADER)),
        parameters,
    };
    instantiate(deps.as_mut(), env_at(START_HEIGHT), mock_info(ADMIN, &[]), msg).unwrap();

    deps
}

fn start_vote(deps: &mut OwnedDeps<MockStorage, MockApi, MockQuerier>, total_weight: u128) {
    let msg = ExecuteMsg::Start {
        total_weight: Uint128::new(total_weight),
    };
    execute(deps.as_mut(), env_at(START_HEIGHT), mock_info(LEADER, &[]), msg).unwrap();
}

fn cast(
    deps: &mut OwnedDeps<MockStorage, MockApi, MockQuerier>,
    voter: &str,
    weight: u128,
    choice: VoteValue,
    height: u64,
) -> Result<cosmwasm_std::Response, ContractError> {
    let msg = ExecuteMsg::Vote {
        voter: String::from(voter),
        weight: Uint128::new(weight),
        choice,
        vote_id: 0,
    };
    execute(deps.as_mut(), env_at(height), mock_info(LEADER, &[]), msg)
}

fn open_height() -> u64 {
    START_HEIGHT + VOTE_DELAY
}

fn closed_height() -> u64 {
    START_HEIGHT + VOTE_DELAY + VOTE_LENGTH + 1
}

fn end_vote(deps: &mut OwnedDeps<MockStorage, MockApi, MockQuerier>) -> cosmwasm_std::Response {
    execute(
        deps.as_mut(),
        env_at(closed_height()),
        mock_info(LEADER, &[]),
        ExecuteMsg::End { vote_id: 0 },
    )
    .unwrap()
}

fn end_callback(vote_id: u64, outcome: VoteOutcome) -> SubMsg {
    SubMsg::new(CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: String::from(LEADER),
        msg: to_binary(&LeaderCallbackMsg::EndCallback { vote_id, outcome }).unwrap(),
        funds: vec![],
    }))
}

#[test]
fn proper_initialization() {
    let deps = setup(parameters(2500, false));

    let config: Config =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::Config {}).unwrap()).unwrap();
    assert_eq!(
        config,
        Config {
            admin: Addr::unchecked(ADMIN),
            poll_leader: Some(Addr::unchecked(LEADER)),
            parameters: parameters(2500, false),
        }
    );

    let state: MajorityState =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::State {}).unwrap()).unwrap();
    assert_eq!(state, MajorityState::None);

    //Invalid cap
    let mut deps = mock_dependencies();
    let mut invalid = parameters(2500, true);
    invalid.quorum_cap = QuorumCap {
        lower: 5000,
        upper: 4000,
    };
    let msg = InstantiateMsg {
        admin: None,
        poll_leader: None,
        parameters: invalid,
    };
    let err = instantiate(deps.as_mut(), mock_env(), mock_info(ADMIN, &[]), msg).unwrap_err();
    assert_eq!(
        err,
        ContractError::Std(StdError::generic_err(
            "The quorum cap must satisfy lower <= upper <= 10000"
        ))
    );
}

#[test]
fn start_replies_to_leader() {
    let mut deps = setup(parameters(2500, false));

    //Only the leader can start
    let msg = ExecuteMsg::Start {
        total_weight: Uint128::new(10_000),
    };
    let err = execute(deps.as_mut(), env_at(START_HEIGHT), mock_info(ADMIN, &[]), msg.clone())
        .unwrap_err();
    assert_eq!(err, ContractError::Unauthorized {});

    //Zero weight can't be voted on
    let err = execute(
        deps.as_mut(),
        env_at(START_HEIGHT),
        mock_info(LEADER, &[]),
        ExecuteMsg::Start {
            total_weight: Uint128::zero(),
        },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::ZeroTotalWeight {});

    let res = execute(deps.as_mut(), env_at(START_HEIGHT), mock_info(LEADER, &[]), msg.clone())
        .unwrap();
    assert_eq!(
        res.messages,
        vec![SubMsg::new(CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr: String::from(LEADER),
            msg: to_binary(&LeaderCallbackMsg::ProposeCallback {
                vote_id: 0,
                snapshot_block: START_HEIGHT,
            })
            .unwrap(),
            funds: vec![],
        }))]
    );
    assert_eq!(res.events.len(), 1);
    assert_eq!(res.events[0].ty, "vote_started");

    let poll: Option<PollDescriptor> =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::Poll {}).unwrap()).unwrap();
    assert_eq!(
        poll,
        Some(PollDescriptor {
            vote_id: 0,
            yay: Uint128::zero(),
            nay: Uint128::zero(),
            abstain: Uint128::zero(),
            total: Uint128::zero(),
            start_block: START_HEIGHT + VOTE_DELAY,
            end_block: START_HEIGHT + VOTE_DELAY + VOTE_LENGTH,
            snapshot_block: START_HEIGHT,
            quorum: Uint128::new(2500),
            total_weight: Uint128::new(10_000),
        })
    );

    //A second start is rejected while in progress
    let err = execute(deps.as_mut(), env_at(START_HEIGHT), mock_info(LEADER, &[]), msg)
        .unwrap_err();
    assert_eq!(
        err,
        ContractError::WrongState {
            state: String::from("in_progress")
        }
    );
}

#[test]
fn voting_window_is_enforced() {
    let mut deps = setup(parameters(2500, false));
    start_vote(&mut deps, 10_000);

    //Before start
    let err = cast(&mut deps, "voter1", 100, VoteValue::Yay, open_height() - 1).unwrap_err();
    assert_eq!(
        err,
        ContractError::VotingPeriodNotStarted {
            start_block: open_height()
        }
    );

    //Both edges of the window are inclusive
    cast(&mut deps, "voter1", 100, VoteValue::Yay, open_height()).unwrap();
    cast(&mut deps, "voter2", 100, VoteValue::Nay, open_height() + VOTE_LENGTH).unwrap();

    //After end
    let err = cast(&mut deps, "voter3", 100, VoteValue::Yay, open_height() + VOTE_LENGTH + 1)
        .unwrap_err();
    assert_eq!(err, ContractError::VotingPeriodEnded {});

    //End at the last block of the window fails, one block later succeeds
    let err = execute(
        deps.as_mut(),
        env_at(open_height() + VOTE_LENGTH),
        mock_info(LEADER, &[]),
        ExecuteMsg::End { vote_id: 0 },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::VotingPeriodNotEnded {});

    end_vote(&mut deps);
}

#[test]
fn no_double_voting() {
    let mut deps = setup(parameters(2500, false));
    start_vote(&mut deps, 10_000);

    cast(&mut deps, "voter1", 100, VoteValue::Yay, open_height()).unwrap();

    //Same voter, any choice, fails
    let err = cast(&mut deps, "voter1", 100, VoteValue::Yay, open_height()).unwrap_err();
    assert_eq!(err, ContractError::UserAlreadyVoted {});
    let err = cast(&mut deps, "voter1", 500, VoteValue::Nay, open_height() + 1).unwrap_err();
    assert_eq!(err, ContractError::UserAlreadyVoted {});

    let record: Option<VoterRecord> = from_binary(
        &query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::VoterRecord {
                vote_id: 0,
                voter: String::from("voter1"),
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(
        record,
        Some(VoterRecord {
            choice: VoteValue::Yay,
            cast_at_block: open_height(),
            weight: Uint128::new(100),
        })
    );

    let poll: Option<PollDescriptor> =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::Poll {}).unwrap()).unwrap();
    let poll = poll.unwrap();
    assert_eq!(poll.yay, Uint128::new(100));
    assert_eq!(poll.nay, Uint128::zero());
    assert_eq!(poll.total, Uint128::new(100));
}

#[test]
fn vote_checks_leader_and_id() {
    let mut deps = setup(parameters(2500, false));

    //Nothing in progress
    let err = cast(&mut deps, "voter1", 100, VoteValue::Yay, open_height()).unwrap_err();
    assert_eq!(
        err,
        ContractError::WrongState {
            state: String::from("none")
        }
    );

    start_vote(&mut deps, 10_000);

    //Not from the leader
    let msg = ExecuteMsg::Vote {
        voter: String::from("voter1"),
        weight: Uint128::new(100),
        choice: VoteValue::Yay,
        vote_id: 0,
    };
    let err = execute(deps.as_mut(), env_at(open_height()), mock_info("voter1", &[]), msg)
        .unwrap_err();
    assert_eq!(err, ContractError::Unauthorized {});

    //Wrong vote id
    let msg = ExecuteMsg::Vote {
        voter: String::from("voter1"),
        weight: Uint128::new(100),
        choice: VoteValue::Yay,
        vote_id: 7,
    };
    let err = execute(deps.as_mut(), env_at(open_height()), mock_info(LEADER, &[]), msg)
        .unwrap_err();
    assert_eq!(
        err,
        ContractError::VoteIdMismatch {
            expected: 0,
            received: 7
        }
    );

    //Zero weight
    let err = cast(&mut deps, "voter1", 0, VoteValue::Yay, open_height()).unwrap_err();
    assert_eq!(err, ContractError::NoVotingPower {});
}

#[test]
fn quorum_missed_by_one() {
    //10_000 eligible with a 29.99% quorum requires 2_999 participation
    let mut deps = setup(parameters(2999, false));
    start_vote(&mut deps, 10_000);

    cast(&mut deps, "voter1", 2909, VoteValue::Yay, open_height()).unwrap();
    cast(&mut deps, "voter2", 79, VoteValue::Nay, open_height()).unwrap();
    cast(&mut deps, "voter3", 10, VoteValue::Abstain, open_height()).unwrap();

    let res = end_vote(&mut deps);
    assert_eq!(res.messages, vec![end_callback(0, VoteOutcome::Failed)]);

    let outcome: Option<VoteOutcome> = from_binary(
        &query(deps.as_ref(), mock_env(), QueryMsg::Outcome { vote_id: 0 }).unwrap(),
    )
    .unwrap();
    assert_eq!(outcome, Some(VoteOutcome::Failed));
}

#[test]
fn quorum_reached_exactly() {
    let mut deps = setup(parameters(2999, false));
    start_vote(&mut deps, 10_000);

    cast(&mut deps, "voter1", 2909, VoteValue::Yay, open_height()).unwrap();
    cast(&mut deps, "voter2", 79, VoteValue::Nay, open_height()).unwrap();
    cast(&mut deps, "voter3", 11, VoteValue::Abstain, open_height()).unwrap();

    let res = end_vote(&mut deps);
    assert_eq!(res.messages, vec![end_callback(0, VoteOutcome::Passed)]);

    //Descriptor cleared and the next vote gets a fresh id
    let poll: Option<PollDescriptor> =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::Poll {}).unwrap()).unwrap();
    assert_eq!(poll, None);

    let res = execute(
        deps.as_mut(),
        env_at(closed_height()),
        mock_info(LEADER, &[]),
        ExecuteMsg::Start {
            total_weight: Uint128::new(10_000),
        },
    )
    .unwrap();
    assert_eq!(
        res.messages,
        vec![SubMsg::new(CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr: String::from(LEADER),
            msg: to_binary(&LeaderCallbackMsg::ProposeCallback {
                vote_id: 1,
                snapshot_block: closed_height(),
            })
            .unwrap(),
            funds: vec![],
        }))]
    );
}

#[test]
fn supermajority_not_reached() {
    let mut deps = setup(parameters(1000, false));
    start_vote(&mut deps, 10_000);

    //7_999 of 10_000 opinionated weight is under 80%
    cast(&mut deps, "voter1", 7999, VoteValue::Yay, open_height()).unwrap();
    cast(&mut deps, "voter2", 2001, VoteValue::Nay, open_height()).unwrap();

    let res = end_vote(&mut deps);
    assert_eq!(res.messages, vec![end_callback(0, VoteOutcome::Failed)]);
}

#[test]
fn dynamic_quorum_adapts() {
    let mut deps = setup(parameters(3000, true));
    start_vote(&mut deps, 37_689);

    let poll: Option<PollDescriptor> =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::Poll {}).unwrap()).unwrap();
    assert_eq!(poll.unwrap().quorum, Uint128::new(11_306));

    cast(&mut deps, "voter1", 13_000, VoteValue::Yay, open_height()).unwrap();
    cast(&mut deps, "voter2", 2_000, VoteValue::Nay, open_height()).unwrap();
    cast(&mut deps, "voter3", 7_089, VoteValue::Abstain, open_height()).unwrap();

    let res = end_vote(&mut deps);
    assert_eq!(res.messages, vec![end_callback(0, VoteOutcome::Passed)]);

    //floor((9_044 + 4_417) * 10_000 / 37_689)
    let quorum: u64 =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::Quorum {}).unwrap()).unwrap();
    assert_eq!(quorum, 3571);

    //The next vote uses the adapted fraction
    start_vote(&mut deps, 10_000);
    let poll: Option<PollDescriptor> =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::Poll {}).unwrap()).unwrap();
    assert_eq!(poll.unwrap().quorum, Uint128::new(3571));
}

#[test]
fn dynamic_quorum_stays_within_cap() {
    let mut params = parameters(3000, true);
    params.quorum_cap = QuorumCap {
        lower: 2500,
        upper: 4000,
    };
    let mut deps = setup(params);

    //No participation: 2_400 would fall under the lower bound
    start_vote(&mut deps, 10_000);
    end_vote(&mut deps);
    let quorum: u64 =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::Quorum {}).unwrap()).unwrap();
    assert_eq!(quorum, 2500);

    //Full participation: 2_000 + 2_000 = 4_000 sits on the upper bound
    start_vote(&mut deps, 10_000);
    let msg = ExecuteMsg::Vote {
        voter: String::from("whale"),
        weight: Uint128::new(10_000),
        choice: VoteValue::Yay,
        vote_id: 1,
    };
    execute(deps.as_mut(), env_at(open_height()), mock_info(LEADER, &[]), msg).unwrap();
    execute(
        deps.as_mut(),
        env_at(closed_height()),
        mock_info(LEADER, &[]),
        ExecuteMsg::End { vote_id: 1 },
    )
    .unwrap();
    let quorum: u64 =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::Quorum {}).unwrap()).unwrap();
    assert!((2500..=4000).contains(&quorum));
    assert_eq!(quorum, 4000);
}

#[test]
fn fixed_quorum_is_not_adapted() {
    let mut deps = setup(parameters(3000, false));
    start_vote(&mut deps, 10_000);
    cast(&mut deps, "voter1", 10_000, VoteValue::Yay, open_height()).unwrap();
    end_vote(&mut deps);

    let quorum: u64 =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::Quorum {}).unwrap()).unwrap();
    assert_eq!(quorum, 3000);
}

#[test]
fn poll_leader_is_set_once() {
    let mut deps = mock_dependencies();
    let msg = InstantiateMsg {
        admin: None,
        poll_leader: None,
        parameters: parameters(2500, false),
    };
    instantiate(deps.as_mut(), mock_env(), mock_info(ADMIN, &[]), msg).unwrap();

    //No leader yet
    let err = execute(
        deps.as_mut(),
        mock_env(),
        mock_info(LEADER, &[]),
        ExecuteMsg::Start {
            total_weight: Uint128::new(1),
        },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::PollLeaderNotSet {});

    let msg = ExecuteMsg::SetPollLeader {
        address: String::from(LEADER),
    };
    let err = execute(deps.as_mut(), mock_env(), mock_info(LEADER, &[]), msg.clone()).unwrap_err();
    assert_eq!(err, ContractError::Unauthorized {});
    execute(deps.as_mut(), mock_env(), mock_info(ADMIN, &[]), msg).unwrap();

    let err = execute(
        deps.as_mut(),
        mock_env(),
        mock_info(ADMIN, &[]),
        ExecuteMsg::SetPollLeader {
            address: String::from("other_leader"),
        },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::PollLeaderAlreadySet {});
}

#[test]
fn parameters_are_frozen_during_a_vote() {
    let mut deps = setup(parameters(2500, true));
    start_vote(&mut deps, 10_000);

    let msg = ExecuteMsg::SetGovernanceParameters {
        parameters: parameters(5000, true),
    };
    let err = execute(deps.as_mut(), mock_env(), mock_info(ADMIN, &[]), msg.clone()).unwrap_err();
    assert_eq!(
        err,
        ContractError::WrongState {
            state: String::from("in_progress")
        }
    );

    end_vote(&mut deps);
    execute(deps.as_mut(), mock_env(), mock_info(ADMIN, &[]), msg).unwrap();

    let quorum: u64 =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::Quorum {}).unwrap()).unwrap();
    assert_eq!(quorum, 5000);
}

#[test]
fn two_step_admin_handover() {
    let mut deps = setup(parameters(2500, false));

    let err = execute(
        deps.as_mut(),
        mock_env(),
        mock_info("new_admin", &[]),
        ExecuteMsg::ValidateNewAdministrator {},
    )
    .unwrap_err();
    assert_eq!(err, ContractError::NoPendingAdministrator {});

    execute(
        deps.as_mut(),
        mock_env(),
        mock_info(ADMIN, &[]),
        ExecuteMsg::SetNextAdministrator {
            address: String::from("new_admin"),
        },
    )
    .unwrap();

    //Only the designated address can accept
    let err = execute(
        deps.as_mut(),
        mock_env(),
        mock_info("someone", &[]),
        ExecuteMsg::ValidateNewAdministrator {},
    )
    .unwrap_err();
    assert_eq!(err, ContractError::Unauthorized {});

    execute(
        deps.as_mut(),
        mock_env(),
        mock_info("new_admin", &[]),
        ExecuteMsg::ValidateNewAdministrator {},
    )
    .unwrap();

    let config: Config =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::Config {}).unwrap()).unwrap();
    assert_eq!(config.admin, Addr::unchecked("new_admin"));
}

#[test]
fn transfer_funds() {
    let mut deps = mock_dependencies_with_balance(&[coin(100, "ujuno")]);
    let msg = InstantiateMsg {
        admin: None,
        poll_leader: Some(String::from(LEADER)),
        parameters: parameters(2500, false),
    };
    instantiate(deps.as_mut(), mock_env(), mock_info(ADMIN, &[]), msg).unwrap();

    let err = execute(
        deps.as_mut(),
        mock_env(),
        mock_info(ADMIN, &[]),
        ExecuteMsg::TransferFunds {
            destination: String::from("treasury"),
            amount: coin(101, "ujuno"),
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        ContractError::InsufficientFunds {
            amount: String::from("101ujuno")
        }
    );

    let res = execute(
        deps.as_mut(),
        mock_env(),
        mock_info(ADMIN, &[]),
        ExecuteMsg::TransferFunds {
            destination: String::from("treasury"),
            amount: coin(100, "ujuno"),
        },
    )
    .unwrap();
    assert_eq!(
        res.messages,
        vec![SubMsg::new(CosmosMsg::Bank(BankMsg::Send {
            to_address: String::from("treasury"),
            amount: vec![coin(100, "ujuno")],
        }))]
    );
}

#[test]
fn unreachable_window_is_rejected() {
    let mut params = parameters(3000, false);
    params.vote_delay = u64::MAX;
    let mut deps = setup(params);

    let err = execute(
        deps.as_mut(),
        env_at(START_HEIGHT),
        mock_info(LEADER, &[]),
        ExecuteMsg::Start {
            total_weight: Uint128::new(10_000),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::Std(StdError::Overflow { .. })));

    let state: MajorityState =
        from_binary(&query(deps.as_ref(), mock_env(), QueryMsg::State {}).unwrap()).unwrap();
    assert_eq!(state, MajorityState::None);
}
