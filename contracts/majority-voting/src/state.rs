use cosmwasm_std::Addr;
use cw_storage_plus::{Item, Map};

use dao_voting::majority::{Config, MajorityState, PollDescriptor};
use dao_voting::types::{VoteOutcome, VoterRecord};

pub const CONFIG: Item<Config> = Item::new("config");
pub const STATE: Item<MajorityState> = Item::new("state");
pub const POLL: Item<PollDescriptor> = Item::new("poll");
pub const NEXT_VOTE_ID: Item<u64> = Item::new("next_vote_id");
pub const QUORUM: Item<u64> = Item::new("quorum"); //Adaptive quorum fraction, pertenmill
pub const VOTER_RECORDS: Map<(u64, Addr), VoterRecord> = Map::new("voter_records"); //(vote_id, voter)
pub const OUTCOMES: Map<u64, VoteOutcome> = Map::new("outcomes"); //vote_id, outcome

pub const OWNERSHIP_TRANSFER: Item<Addr> = Item::new("ownership_transfer");
