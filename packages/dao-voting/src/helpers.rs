use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_binary, Addr, BankMsg, Coin, CosmosMsg, QuerierWrapper, StdResult, Uint128, WasmMsg};

use crate::strategy::{LeaderCallbackMsg, StrategyExecuteMsg};
use crate::types::{VoteOutcome, VoteValue};
use crate::weight_oracle::{QueryMsg as WeightOracleQueryMsg, VotingWeightResponse};

/// Query the oracle for the total eligible voting weight
pub fn query_total_voting_weight(querier: QuerierWrapper, weight_oracle: String) -> StdResult<Uint128> {
    let res: VotingWeightResponse = querier.query_wasm_smart(
        weight_oracle,
        &WeightOracleQueryMsg::TotalVotingWeight {},
    )?;

    Ok(res.weight)
}

/// Query the oracle for `address`'s voting weight as of `block_height`
pub fn query_voting_weight_at(
    querier: QuerierWrapper,
    weight_oracle: String,
    address: String,
    block_height: u64,
) -> StdResult<Uint128> {
    let res: VotingWeightResponse = querier.query_wasm_smart(
        weight_oracle,
        &WeightOracleQueryMsg::VotingWeightAt { address, block_height },
    )?;

    Ok(res.weight)
}

/// VotingStrategy wraps a strategy address and builds the requests a poll leader sends it.
/// Every request is one-way, the strategy answers through `PollLeader` in a later execution.
#[cw_serde]
pub struct VotingStrategy(pub Addr);

impl VotingStrategy {
    pub fn addr(&self) -> Addr {
        self.0.clone()
    }

    fn request(&self, msg: &StrategyExecuteMsg) -> StdResult<CosmosMsg> {
        Ok(CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr: self.0.to_string(),
            msg: to_binary(msg)?,
            funds: vec![],
        }))
    }

    pub fn start(&self, total_weight: Uint128) -> StdResult<CosmosMsg> {
        self.request(&StrategyExecuteMsg::Start { total_weight })
    }

    pub fn vote(
        &self,
        voter: String,
        weight: Uint128,
        choice: VoteValue,
        vote_id: u64,
    ) -> StdResult<CosmosMsg> {
        self.request(&StrategyExecuteMsg::Vote {
            voter,
            weight,
            choice,
            vote_id,
        })
    }

    pub fn end(&self, vote_id: u64) -> StdResult<CosmosMsg> {
        self.request(&StrategyExecuteMsg::End { vote_id })
    }
}

/// PollLeader wraps the address driving a strategy and builds its callbacks
#[cw_serde]
pub struct PollLeader(pub Addr);

impl PollLeader {
    pub fn addr(&self) -> Addr {
        self.0.clone()
    }

    fn callback(&self, msg: &LeaderCallbackMsg) -> StdResult<CosmosMsg> {
        Ok(CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr: self.0.to_string(),
            msg: to_binary(msg)?,
            funds: vec![],
        }))
    }

    pub fn propose_callback(&self, vote_id: u64, snapshot_block: u64) -> StdResult<CosmosMsg> {
        self.callback(&LeaderCallbackMsg::ProposeCallback {
            vote_id,
            snapshot_block,
        })
    }

    pub fn end_callback(&self, vote_id: u64, outcome: VoteOutcome) -> StdResult<CosmosMsg> {
        self.callback(&LeaderCallbackMsg::EndCallback { vote_id, outcome })
    }

    pub fn extend_callback(&self, vote_id: u64) -> StdResult<CosmosMsg> {
        self.callback(&LeaderCallbackMsg::ExtendCallback { vote_id })
    }
}

/// Bank send of `amount` from `contract` to `destination`.
/// Returns None if the contract holds less than `amount` of that denom.
pub fn funds_transfer_msg(
    querier: QuerierWrapper,
    contract: &Addr,
    destination: &Addr,
    amount: Coin,
) -> StdResult<Option<CosmosMsg>> {
    let balance = querier.query_balance(contract, amount.denom.clone())?;
    if balance.amount < amount.amount {
        return Ok(None);
    }

    Ok(Some(CosmosMsg::Bank(BankMsg::Send {
        to_address: destination.to_string(),
        amount: vec![amount],
    })))
}
