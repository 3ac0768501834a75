#![allow(unused_doc_comments)]
pub mod contract;
pub mod error;
pub mod state;

pub use crate::error::ContractError;
