use cw_storage_plus::{Item, Map};

use dao_voting::coordinator::{Config, DaoState, HistoricalOutcome, Poll, VotingStrategyInfo};

pub const CONFIG: Item<Config> = Item::new("config");
pub const STATE: Item<DaoState> = Item::new("state");
pub const POLL: Item<Poll> = Item::new("poll");
pub const PROPOSAL_COUNT: Item<u64> = Item::new("proposal_count"); //Id of the next proposal, equals the number of archived outcomes
pub const OUTCOMES: Map<u64, HistoricalOutcome> = Map::new("outcomes"); //proposal_id, outcome
pub const STRATEGIES: Map<u64, VotingStrategyInfo> = Map::new("voting_strategies");
pub const PENDING_EFFECTS: Item<u64> = Item::new("pending_effects"); //proposal_id whose messages are about to run
pub const METADATA: Map<&str, String> = Map::new("metadata");
