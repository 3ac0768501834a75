#![allow(unused_doc_comments)]
pub mod coordinator;
pub mod helpers;
pub mod majority;
pub mod math;
pub mod opt_out;
pub mod strategy;
pub mod types;
pub mod weight_oracle;
