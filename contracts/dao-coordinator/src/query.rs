use cosmwasm_std::{Deps, Order, StdResult};
use cw_storage_plus::Bound;

use dao_voting::coordinator::{OutcomeCountResponse, OutcomeListResponse, VotingStrategyResponse};

use crate::state::{OUTCOMES, PROPOSAL_COUNT, STRATEGIES};

// Settings for pagination
const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 30;

/// Every poll is archived exactly once, so the proposal counter is the outcome count
pub fn query_outcome_count(deps: Deps) -> StdResult<OutcomeCountResponse> {
    Ok(OutcomeCountResponse {
        count: PROPOSAL_COUNT.load(deps.storage)?,
    })
}

pub fn query_outcomes(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<OutcomeListResponse> {
    let outcome_count = PROPOSAL_COUNT.load(deps.storage)?;

    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    let outcomes = OUTCOMES
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| {
            let (_, outcome) = item?;
            Ok(outcome)
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(OutcomeListResponse {
        outcome_count,
        outcomes,
    })
}

pub fn query_voting_strategy(deps: Deps, id: u64) -> StdResult<VotingStrategyResponse> {
    let strategy = STRATEGIES.load(deps.storage, id)?;

    Ok(VotingStrategyResponse {
        id,
        name: strategy.name,
        address: strategy.address,
    })
}

pub fn query_voting_strategies(deps: Deps) -> StdResult<Vec<VotingStrategyResponse>> {
    STRATEGIES
        .range(deps.storage, None, None, Order::Ascending)
        .map(|item| {
            let (id, strategy) = item?;
            Ok(VotingStrategyResponse {
                id,
                name: strategy.name,
                address: strategy.address,
            })
        })
        .collect()
}
