//! Core data types for the lending pool

pub mod account;
pub mod loan_record;
pub mod pool_ledger;
