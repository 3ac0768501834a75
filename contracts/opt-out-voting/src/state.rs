use cosmwasm_std::{Addr, Uint128};
use cw_storage_plus::{Item, Map};

use dao_voting::opt_out::{Config, OptOutPollDescriptor, OptOutState};
use dao_voting::types::VoteOutcome;

pub const CONFIG: Item<Config> = Item::new("config");
pub const STATE: Item<OptOutState> = Item::new("state");
pub const POLL: Item<OptOutPollDescriptor> = Item::new("poll");
pub const NEXT_VOTE_ID: Item<u64> = Item::new("next_vote_id");
pub const OBJECTIONS: Map<(u64, Addr), Uint128> = Map::new("objections"); //(vote_id, voter), weight
pub const OUTCOMES: Map<u64, VoteOutcome> = Map::new("outcomes");

pub const OWNERSHIP_TRANSFER: Item<Addr> = Item::new("ownership_transfer");
