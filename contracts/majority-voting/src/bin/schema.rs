use std::env::current_dir;
use std::fs::create_dir_all;

use cosmwasm_schema::{export_schema, remove_schemas, schema_for};

use dao_voting::majority::{Config, ExecuteMsg, InstantiateMsg, MajorityState, PollDescriptor, QueryMsg};
use dao_voting::types::{VoteOutcome, VoterRecord};

fn main() {
    let mut out_dir = current_dir().unwrap();
    out_dir.push("schema");
    create_dir_all(&out_dir).unwrap();
    remove_schemas(&out_dir).unwrap();

    export_schema(&schema_for!(InstantiateMsg), &out_dir);
    export_schema(&schema_for!(ExecuteMsg), &out_dir);
    export_schema(&schema_for!(QueryMsg), &out_dir);
    export_schema(&schema_for!(Config), &out_dir);
    export_schema(&schema_for!(MajorityState), &out_dir);
    export_schema(&schema_for!(PollDescriptor), &out_dir);
    export_schema(&schema_for!(VoterRecord), &out_dir);
    export_schema(&schema_for!(VoteOutcome), &out_dir);
}
