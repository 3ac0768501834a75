use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_binary, Addr, CosmosMsg, StdResult, SubMsg, WasmMsg};

use dao_voting::coordinator::ExecuteMsg;

/// Reply id of the submessage running a passed proposal's messages
pub const EFFECTS_REPLY_ID: u64 = 1;

/// DaoContract wraps the coordinator address, mostly to build calls the DAO makes to itself
#[cw_serde]
pub struct DaoContract(pub Addr);

impl DaoContract {
    pub fn addr(&self) -> Addr {
        self.0.clone()
    }

    pub fn call(&self, msg: ExecuteMsg) -> StdResult<CosmosMsg> {
        Ok(CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr: self.0.to_string(),
            msg: to_binary(&msg)?,
            funds: vec![],
        }))
    }

    /// Runs the messages of `proposal_id` in their own sub-transaction.
    /// On failure only that batch reverts and the DAO is told through a reply.
    pub fn execute_effects(&self, proposal_id: u64) -> StdResult<SubMsg> {
        let msg = self.call(ExecuteMsg::ExecuteEffects { proposal_id })?;

        Ok(SubMsg::reply_on_error(msg, EFFECTS_REPLY_ID))
    }
}
